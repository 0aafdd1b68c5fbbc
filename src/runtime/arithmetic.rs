//! Integer arithmetic: +, -, *, inc, dec. Saturates rather than panics on overflow — a pure
//! function library must never panic on user-supplied macro arguments.

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::Value;

pub fn register(rt: &mut Runtime) {
    rt.register("+", Arity::AtLeast(0), add);
    rt.register("-", Arity::AtLeast(1), sub);
    rt.register("*", Arity::AtLeast(0), mul);
    rt.register("inc", Arity::Exact(1), inc);
    rt.register("dec", Arity::Exact(1), dec);
}

fn require_int(name: &str, v: &Value, position: usize) -> Result<i64, MacroError> {
    v.as_int().ok_or_else(|| MacroError::type_mismatch(name, "integer", v.type_name(), position))
}

fn add(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let mut sum: i64 = 0;
    for (i, a) in args.iter().enumerate() {
        sum = sum.saturating_add(require_int("+", a, i)?);
    }
    Ok(Value::Int(sum))
}

fn sub(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let first = require_int("-", &args[0], 0)?;
    if args.len() == 1 {
        return Ok(Value::Int(first.saturating_neg()));
    }
    let mut result = first;
    for (i, a) in args[1..].iter().enumerate() {
        result = result.saturating_sub(require_int("-", a, i + 1)?);
    }
    Ok(Value::Int(result))
}

fn mul(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let mut product: i64 = 1;
    for (i, a) in args.iter().enumerate() {
        product = product.saturating_mul(require_int("*", a, i)?);
    }
    Ok(Value::Int(product))
}

fn inc(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Int(require_int("inc", &args[0], 0)?.saturating_add(1)))
}

fn dec(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Int(require_int("dec", &args[0], 0)?.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn variadic_identities() {
        let rt = Runtime::with_builtins();
        assert_eq!(rt.call("+", &[]).unwrap(), Value::Int(0));
        assert_eq!(rt.call("*", &[]).unwrap(), Value::Int(1));
    }

    #[test]
    fn overflow_saturates_instead_of_panicking() {
        let rt = Runtime::with_builtins();
        let result = rt.call("+", &[Value::Int(i64::MAX), Value::Int(1)]).unwrap();
        assert_eq!(result, Value::Int(i64::MAX));
    }

    #[test]
    fn single_arg_subtraction_negates() {
        let rt = Runtime::with_builtins();
        assert_eq!(rt.call("-", &[Value::Int(5)]).unwrap(), Value::Int(-5));
    }
}
