//! Symbol and keyword construction/introspection: name, namespace, and building either from strings.

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::keyword;
use crate::value::{Symbol, Value};

pub fn register(rt: &mut Runtime) {
    rt.register("symbol", Arity::Range(1, 2), symbol);
    rt.register("keyword", Arity::Range(1, 2), keyword_fn);
    rt.register("name", Arity::Exact(1), name);
    rt.register("namespace", Arity::Exact(1), namespace);
}

fn as_name_str<'a>(fn_name: &str, v: &'a Value) -> Result<&'a str, MacroError> {
    match v {
        Value::Str(s) => Ok(s),
        Value::Symbol(s) => Ok(&s.name),
        Value::Keyword(k) => Ok(k.name()),
        other => Err(MacroError::type_mismatch(fn_name, "string, symbol, or keyword", other.type_name(), 0)),
    }
}

fn symbol(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    if args.len() == 2 {
        let ns = as_name_str("symbol", &args[0])?.to_string();
        let n = as_name_str("symbol", &args[1])?.to_string();
        Ok(Value::Symbol(Symbol::namespaced(ns, n)))
    } else {
        Ok(Value::Symbol(Symbol::new(as_name_str("symbol", &args[0])?.to_string())))
    }
}

fn keyword_fn(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    if args.len() == 2 {
        let ns = as_name_str("keyword", &args[0])?.to_string();
        let n = as_name_str("keyword", &args[1])?.to_string();
        Ok(Value::Keyword(keyword::intern(Some(&ns), &n)))
    } else {
        Ok(Value::Keyword(keyword::intern(None, as_name_str("keyword", &args[0])?)))
    }
}

fn name(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::string(as_name_str("name", &args[0])?.to_string()))
}

fn namespace(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let ns = match &args[0] {
        Value::Symbol(s) => s.namespace.as_deref().map(str::to_string),
        Value::Keyword(k) => k.namespace().map(str::to_string),
        other => return Err(MacroError::type_mismatch("namespace", "symbol or keyword", other.type_name(), 0)),
    };
    Ok(ns.map(Value::string).unwrap_or(Value::Nil))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn symbol_and_keyword_round_trip_name_namespace() {
        let rt = Runtime::with_builtins();
        let s = rt.call("symbol", &[Value::string("a.b"), Value::string("c")]).unwrap();
        assert_eq!(rt.call("name", std::slice::from_ref(&s)).unwrap(), Value::string("c"));
        assert_eq!(rt.call("namespace", &[s]).unwrap(), Value::string("a.b"));
    }

    #[test]
    fn bare_symbol_has_no_namespace() {
        let rt = Runtime::with_builtins();
        let s = rt.call("symbol", &[Value::string("x")]).unwrap();
        assert_eq!(rt.call("namespace", &[s]).unwrap(), Value::Nil);
    }
}
