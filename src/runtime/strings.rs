//! String operations: str, subs, join, regex (re-find/re-seq/re-matches), and the usual
//! predicates/transforms (starts-with?, ends-with?, includes?, replace, upper-case, lower-case, trim).

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::{PList, PVector, Value};

pub fn register(rt: &mut Runtime) {
    rt.register("str", Arity::AtLeast(0), str_fn);
    rt.register("subs", Arity::Range(2, 3), subs);
    rt.register("join", Arity::Range(1, 2), join);
    rt.register("re-find", Arity::Exact(2), re_find);
    rt.register("re-seq", Arity::Exact(2), re_seq);
    rt.register("re-matches", Arity::Exact(2), re_matches);
    rt.register("starts-with?", Arity::Exact(2), starts_with);
    rt.register("ends-with?", Arity::Exact(2), ends_with);
    rt.register("includes?", Arity::Exact(2), includes);
    rt.register("replace", Arity::Exact(3), replace);
    rt.register("upper-case", Arity::Exact(1), upper_case);
    rt.register("lower-case", Arity::Exact(1), lower_case);
    rt.register("trim", Arity::Exact(1), trim);
}

/// Renders a value the way `str` does: strings and nil contribute their bare
/// content, everything else falls back to the printed representation.
fn display_str(v: &Value) -> String {
    match v {
        Value::Nil => String::new(),
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn str_fn(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::string(args.iter().map(display_str).collect::<String>()))
}

fn require_str<'a>(name: &str, v: &'a Value, position: usize) -> Result<&'a str, MacroError> {
    v.as_str().ok_or_else(|| MacroError::type_mismatch(name, "string", v.type_name(), position))
}

fn require_regex<'a>(name: &str, v: &'a Value, position: usize) -> Result<&'a regex::Regex, MacroError> {
    match v {
        Value::Regex(r) => Ok(r),
        other => Err(MacroError::type_mismatch(name, "regex", other.type_name(), position)),
    }
}

fn subs(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let s = require_str("subs", &args[0], 0)?;
    let chars: Vec<char> = s.chars().collect();
    let start = args[1].as_int().ok_or_else(|| MacroError::type_mismatch("subs", "integer", args[1].type_name(), 1))? as usize;
    let end = match args.get(2) {
        Some(e) => e.as_int().ok_or_else(|| MacroError::type_mismatch("subs", "integer", e.type_name(), 2))? as usize,
        None => chars.len(),
    };
    if start > chars.len() || end > chars.len() || start > end {
        return Err(MacroError::Custom("subs: index out of range".to_string()));
    }
    Ok(Value::string(chars[start..end].iter().collect::<String>()))
}

fn join(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let (sep, coll) = if args.len() == 2 {
        (display_str(&args[0]), &args[1])
    } else {
        (String::new(), &args[0])
    };
    let parts: Vec<String> = coll.seq().into_vec().iter().map(display_str).collect();
    Ok(Value::string(parts.join(&sep)))
}

fn re_find(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let re = require_regex("re-find", &args[0], 0)?;
    let s = require_str("re-find", &args[1], 1)?;
    Ok(re.find(s).map(|m| Value::string(m.as_str())).unwrap_or(Value::Nil))
}

fn re_seq(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let re = require_regex("re-seq", &args[0], 0)?;
    let s = require_str("re-seq", &args[1], 1)?;
    let matches: Vec<Value> = re.find_iter(s).map(|m| Value::string(m.as_str())).collect();
    Ok(Value::List(PList::from_vec(matches)))
}

fn re_matches(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let re = require_regex("re-matches", &args[0], 0)?;
    let s = require_str("re-matches", &args[1], 1)?;
    match re.captures(s) {
        Some(caps) if caps.get(0).map(|m| m.as_str()) == Some(s) => {
            if caps.len() == 1 {
                Ok(Value::string(s))
            } else {
                let groups: Vec<Value> = caps
                    .iter()
                    .skip(1)
                    .map(|g| g.map(|m| Value::string(m.as_str())).unwrap_or(Value::Nil))
                    .collect();
                Ok(Value::Vector(PVector::from_vec(groups)))
            }
        }
        _ => Ok(Value::Nil),
    }
}

fn starts_with(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_str("starts-with?", &args[0], 0)?.starts_with(require_str("starts-with?", &args[1], 1)?)))
}

fn ends_with(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_str("ends-with?", &args[0], 0)?.ends_with(require_str("ends-with?", &args[1], 1)?)))
}

fn includes(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_str("includes?", &args[0], 0)?.contains(require_str("includes?", &args[1], 1)?)))
}

fn replace(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let s = require_str("replace", &args[0], 0)?;
    let replacement = require_str("replace", &args[2], 2)?;
    let result = match &args[1] {
        Value::Regex(re) => re.replace_all(s, replacement).into_owned(),
        Value::Str(pat) => s.replace(pat.as_ref(), replacement),
        other => return Err(MacroError::type_mismatch("replace", "string or regex", other.type_name(), 1)),
    };
    Ok(Value::string(result))
}

fn upper_case(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::string(require_str("upper-case", &args[0], 0)?.to_uppercase()))
}

fn lower_case(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::string(require_str("lower-case", &args[0], 0)?.to_lowercase()))
}

fn trim(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::string(require_str("trim", &args[0], 0)?.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use std::rc::Rc;

    #[test]
    fn str_concatenates_without_quoting() {
        let rt = Runtime::with_builtins();
        let result = rt.call("str", &[Value::string("a"), Value::Int(1), Value::Nil]).unwrap();
        assert_eq!(result, Value::string("a1"));
    }

    #[test]
    fn subs_by_char_index() {
        let rt = Runtime::with_builtins();
        let result = rt.call("subs", &[Value::string("hello"), Value::Int(1), Value::Int(3)]).unwrap();
        assert_eq!(result, Value::string("el"));
    }

    #[test]
    fn re_find_and_re_seq() {
        let rt = Runtime::with_builtins();
        let re = Value::Regex(Rc::new(regex::Regex::new(r"\d+").unwrap()));
        assert_eq!(rt.call("re-find", &[re.clone(), Value::string("a12b34")]).unwrap(), Value::string("12"));
        let all = rt.call("re-seq", &[re, Value::string("a12b34")]).unwrap();
        assert_eq!(all, Value::List(PList::from_vec(vec![Value::string("12"), Value::string("34")])));
    }

    #[test]
    fn case_and_trim() {
        let rt = Runtime::with_builtins();
        assert_eq!(rt.call("upper-case", &[Value::string("hi")]).unwrap(), Value::string("HI"));
        assert_eq!(rt.call("trim", &[Value::string("  hi  ")]).unwrap(), Value::string("hi"));
    }
}
