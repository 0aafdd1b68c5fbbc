//! Type and numeric predicates: nil?, some?, seq?, list?, vector?, map?, set?, symbol?,
//! keyword?, string?, number?, coll?, empty?, odd?, even?, zero?, pos?, neg?.

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::Value;

pub fn register(rt: &mut Runtime) {
    rt.register("nil?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::Nil)));
    rt.register("some?", Arity::Exact(1), |a, _| bool_of(a, |v| !matches!(v, Value::Nil)));
    rt.register("seq?", Arity::Exact(1), |a, _| {
        bool_of(a, |v| matches!(v, Value::List(_) | Value::Cons(..)))
    });
    rt.register("list?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::List(_))));
    rt.register("vector?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::Vector(_))));
    rt.register("map?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::Map(_))));
    rt.register("set?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::Set(_))));
    rt.register("symbol?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::Symbol(_))));
    rt.register("keyword?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::Keyword(_))));
    rt.register("string?", Arity::Exact(1), |a, _| bool_of(a, |v| matches!(v, Value::Str(_))));
    rt.register("number?", Arity::Exact(1), |a, _| {
        bool_of(a, |v| matches!(v, Value::Int(_) | Value::Float(_)))
    });
    rt.register("coll?", Arity::Exact(1), |a, _| {
        bool_of(a, |v| matches!(v, Value::List(_) | Value::Vector(_) | Value::Map(_) | Value::Set(_) | Value::Cons(..)))
    });
    rt.register("empty?", Arity::Exact(1), empty);
    rt.register("odd?", Arity::Exact(1), odd);
    rt.register("even?", Arity::Exact(1), even);
    rt.register("zero?", Arity::Exact(1), zero);
    rt.register("pos?", Arity::Exact(1), pos);
    rt.register("neg?", Arity::Exact(1), neg);
}

fn bool_of(args: &[Value], pred: impl Fn(&Value) -> bool) -> Result<Value, MacroError> {
    Ok(Value::Bool(pred(&args[0])))
}

fn empty(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    // `Value::seq()` only covers the collection types; a string's "seq" is its
    // chars, the same notion `count` already uses in sequence.rs.
    let empty = match &args[0] {
        Value::Str(s) => s.is_empty(),
        v => v.seq().is_empty(),
    };
    Ok(Value::Bool(empty))
}

fn require_int(name: &str, v: &Value) -> Result<i64, MacroError> {
    v.as_int().ok_or_else(|| MacroError::type_mismatch(name, "integer", v.type_name(), 0))
}

fn odd(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_int("odd?", &args[0])? % 2 != 0))
}

fn even(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_int("even?", &args[0])? % 2 == 0))
}

fn zero(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_int("zero?", &args[0])? == 0))
}

fn pos(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_int("pos?", &args[0])? > 0))
}

fn neg(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(require_int("neg?", &args[0])? < 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use crate::value::PList;

    #[test]
    fn empty_distinguishes_nil_and_empty_collection() {
        let rt = Runtime::with_builtins();
        assert_eq!(rt.call("empty?", &[Value::Nil]).unwrap(), Value::Bool(true));
        assert_eq!(
            rt.call("empty?", &[Value::List(PList::new())]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            rt.call("empty?", &[Value::List(PList::from_vec(vec![Value::Int(1)]))]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn empty_treats_a_non_empty_string_as_non_empty() {
        let rt = Runtime::with_builtins();
        assert_eq!(rt.call("empty?", &[Value::string("abc")]).unwrap(), Value::Bool(false));
        assert_eq!(rt.call("empty?", &[Value::string("")]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn numeric_predicates() {
        let rt = Runtime::with_builtins();
        assert_eq!(rt.call("odd?", &[Value::Int(3)]).unwrap(), Value::Bool(true));
        assert_eq!(rt.call("even?", &[Value::Int(4)]).unwrap(), Value::Bool(true));
        assert_eq!(rt.call("zero?", &[Value::Int(0)]).unwrap(), Value::Bool(true));
        assert_eq!(rt.call("pos?", &[Value::Int(1)]).unwrap(), Value::Bool(true));
        assert_eq!(rt.call("neg?", &[Value::Int(-1)]).unwrap(), Value::Bool(true));
    }
}
