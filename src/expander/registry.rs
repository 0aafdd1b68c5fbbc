// ABOUTME: defmacro recognition and the user-macro registry

use crate::value::Value;

#[derive(Debug, Clone)]
pub struct MacroDef {
    pub params: Vec<String>,
    pub rest: Option<String>,
    pub body: Vec<Value>,
}

/// Parses `(defmacro name "doc"? [params...] body...)`. Returns `None` if
/// `items` isn't shaped like a defmacro form at all (caller treats that as
/// "not a defmacro").
pub fn parse_defmacro(items: &[Value]) -> Option<(String, MacroDef)> {
    if items.len() < 3 {
        return None;
    }
    let name = items[1].as_symbol()?.name.to_string();
    let mut idx = 2;
    if matches!(items.get(idx), Some(Value::Str(_))) {
        idx += 1;
    }
    let Value::Vector(params_vec) = items.get(idx)? else {
        return None;
    };
    idx += 1;

    let mut params = Vec::new();
    let mut rest = None;
    let mut iter = params_vec.iter().peekable();
    while let Some(p) = iter.next() {
        let s = p.as_symbol()?;
        if s.name.as_ref() == "&" {
            rest = Some(iter.next()?.as_symbol()?.name.to_string());
            break;
        }
        params.push(s.name.to_string());
    }

    Some((
        name,
        MacroDef {
            params,
            rest,
            body: items[idx..].to_vec(),
        },
    ))
}
