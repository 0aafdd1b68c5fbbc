//! Higher-order functions: map, filter, reduce, mapcat, identity. These are the only builtins
//! that need to call back into a `Value` as a function, via the interpreter-supplied `apply`.

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::{PList, Value};

pub fn register(rt: &mut Runtime) {
    rt.register("map", Arity::AtLeast(2), map);
    rt.register("filter", Arity::Exact(2), filter);
    rt.register("reduce", Arity::Range(2, 3), reduce);
    rt.register("mapcat", Arity::AtLeast(2), mapcat);
    rt.register("identity", Arity::Exact(1), identity);
}

fn map(args: &[Value], apply: &ApplyFn) -> Result<Value, MacroError> {
    let f = &args[0];
    let mut seqs: Vec<Vec<Value>> = args[1..].iter().map(|c| c.seq().into_vec()).collect();
    let len = seqs.iter().map(|s| s.len()).min().unwrap_or(0);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let call_args: Vec<Value> = seqs.iter_mut().map(|s| s[i].clone()).collect();
        out.push(apply(f, &call_args)?);
    }
    Ok(Value::List(PList::from_vec(out)))
}

fn filter(args: &[Value], apply: &ApplyFn) -> Result<Value, MacroError> {
    let f = &args[0];
    let mut out = Vec::new();
    for v in args[1].seq().into_vec() {
        if apply(f, std::slice::from_ref(&v))?.is_truthy() {
            out.push(v);
        }
    }
    Ok(Value::List(PList::from_vec(out)))
}

fn reduce(args: &[Value], apply: &ApplyFn) -> Result<Value, MacroError> {
    let f = &args[0];
    let (mut acc, items) = if args.len() == 3 {
        (args[1].clone(), args[2].seq().into_vec())
    } else {
        let mut items = args[1].seq().into_vec();
        if items.is_empty() {
            return Err(MacroError::ReduceEmptyNoInit);
        }
        let first = items.remove(0);
        (first, items)
    };
    for item in items {
        acc = apply(f, &[acc, item])?;
    }
    Ok(acc)
}

fn mapcat(args: &[Value], apply: &ApplyFn) -> Result<Value, MacroError> {
    let mapped = map(args, apply)?;
    let mut out = Vec::new();
    for v in mapped.seq().into_vec() {
        out.extend(v.seq().into_vec());
    }
    Ok(Value::List(PList::from_vec(out)))
}

fn identity(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(args[0].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Interpreter;
    use crate::runtime::Runtime;
    use crate::value::{PVector, Symbol};
    use std::rc::Rc;

    fn inc_lambda(i: &Interpreter) -> Value {
        let form = Value::List(PList::from_vec(vec![
            Value::Symbol(Symbol::new("fn")),
            Value::Vector(PVector::from_vec(vec![Value::Symbol(Symbol::new("n"))])),
            Value::List(PList::from_vec(vec![
                Value::Symbol(Symbol::new("+")),
                Value::Symbol(Symbol::new("n")),
                Value::Int(1),
            ])),
        ]));
        i.eval(&form, i.root_frame()).unwrap()
    }

    #[test]
    fn map_applies_across_one_collection() {
        let i = Interpreter::new(Rc::new(Runtime::with_builtins()));
        let f = inc_lambda(&i);
        let v = Value::Vector(PVector::from_vec(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        let result = i.runtime.call_with("map", &[f, v], &|f, a| i.apply(f.clone(), a.to_vec()));
        assert_eq!(
            result.unwrap(),
            Value::List(PList::from_vec(vec![Value::Int(2), Value::Int(3), Value::Int(4)]))
        );
    }

    #[test]
    fn reduce_without_init_on_empty_fails() {
        let rt = Runtime::with_builtins();
        let f = Value::symbol("+");
        let empty = Value::List(PList::new());
        let result = rt.call_with("reduce", &[f, empty], &|_, _| Ok(Value::Nil));
        assert!(matches!(result, Err(MacroError::ReduceEmptyNoInit)));
    }
}
