//! Equality and ordering: =, not=, not, <, <=, >, >=.

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::Value;

pub fn register(rt: &mut Runtime) {
    rt.register("=", Arity::AtLeast(1), eq);
    rt.register("not=", Arity::AtLeast(1), not_eq);
    rt.register("not", Arity::Exact(1), not);
    rt.register("<", Arity::AtLeast(1), lt);
    rt.register("<=", Arity::AtLeast(1), le);
    rt.register(">", Arity::AtLeast(1), gt);
    rt.register(">=", Arity::AtLeast(1), ge);
}

fn eq(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(args.windows(2).all(|w| w[0] == w[1])))
}

fn not_eq(args: &[Value], apply: &ApplyFn) -> Result<Value, MacroError> {
    match eq(args, apply)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => unreachable!(),
    }
}

fn not(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn numeric_chain(name: &str, args: &[Value], op: fn(f64, f64) -> bool) -> Result<Value, MacroError> {
    let mut nums = Vec::with_capacity(args.len());
    for (i, a) in args.iter().enumerate() {
        nums.push(a.as_f64().ok_or_else(|| MacroError::type_mismatch(name, "number", a.type_name(), i))?);
    }
    Ok(Value::Bool(nums.windows(2).all(|w| op(w[0], w[1]))))
}

fn lt(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    numeric_chain("<", args, |a, b| a < b)
}
fn le(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    numeric_chain("<=", args, |a, b| a <= b)
}
fn gt(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    numeric_chain(">", args, |a, b| a > b)
}
fn ge(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    numeric_chain(">=", args, |a, b| a >= b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn equality_is_deep_and_numeric_cross_width() {
        let rt = Runtime::with_builtins();
        assert_eq!(rt.call("=", &[Value::Int(1), Value::Float(1.0)]).unwrap(), Value::Bool(true));
        assert_eq!(rt.call("not=", &[Value::Int(1), Value::Int(2)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn ordering_chain() {
        let rt = Runtime::with_builtins();
        let result = rt.call("<", &[Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(result, Value::Bool(true));
        let result = rt.call("<", &[Value::Int(1), Value::Int(3), Value::Int(2)]).unwrap();
        assert_eq!(result, Value::Bool(false));
    }
}
