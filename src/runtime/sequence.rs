//! Sequence operations: first, rest, cons, conj, concat, collection constructors, count, nth, get,
//! assoc, last, butlast, partition.

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::{PList, PMap, PSet, PVector, Value};

pub fn register(rt: &mut Runtime) {
    rt.register("first", Arity::Exact(1), first);
    rt.register("second", Arity::Exact(1), second);
    rt.register("rest", Arity::Exact(1), rest);
    rt.register("next", Arity::Exact(1), next);
    rt.register("cons", Arity::Exact(2), cons);
    rt.register("conj", Arity::AtLeast(1), conj);
    rt.register("concat", Arity::AtLeast(0), concat);
    rt.register("list", Arity::AtLeast(0), list);
    rt.register("vector", Arity::AtLeast(0), vector);
    rt.register("hash-map", Arity::AtLeast(0), hash_map);
    rt.register("hash-set", Arity::AtLeast(0), hash_set);
    rt.register("vec", Arity::Exact(1), vec_fn);
    rt.register("seq", Arity::Exact(1), seq_fn);
    rt.register("count", Arity::Exact(1), count);
    rt.register("nth", Arity::Range(2, 3), nth);
    rt.register("get", Arity::Range(2, 3), get);
    rt.register("assoc", Arity::AtLeast(3), assoc);
    rt.register("last", Arity::Exact(1), last);
    rt.register("butlast", Arity::Exact(1), butlast);
    rt.register("partition", Arity::Exact(2), partition);
}

fn first(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(args[0].seq().first().unwrap_or(Value::Nil))
}

fn second(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(args[0].seq().rest().first().unwrap_or(Value::Nil))
}

fn rest(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::List(PList::from_vec(args[0].seq().rest().into_vec())))
}

fn next(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    match args[0].seq().next() {
        Some(s) => Ok(Value::List(PList::from_vec(s.into_vec()))),
        None => Ok(Value::Nil),
    }
}

fn cons(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let rest_items = args[1].seq().into_vec();
    let mut items = vec![args[0].clone()];
    items.extend(rest_items);
    Ok(Value::List(PList::from_vec(items)))
}

fn conj(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let (coll, items) = args.split_first().unwrap();
    match coll {
        Value::List(l) => {
            let mut l = l.clone();
            for v in items {
                l = l.cons(v.clone());
            }
            Ok(Value::List(l))
        }
        Value::Vector(v) => {
            let mut v = v.clone();
            for item in items {
                v = v.conj(item.clone());
            }
            Ok(Value::Vector(v))
        }
        Value::Set(s) => {
            let mut s = s.clone();
            for item in items {
                s = s.conj(item.clone());
            }
            Ok(Value::Set(s))
        }
        other => Err(MacroError::type_mismatch("conj", "collection", other.type_name(), 0)),
    }
}

fn concat(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let mut out = Vec::new();
    for a in args {
        out.extend(a.seq().into_vec());
    }
    Ok(Value::List(PList::from_vec(out)))
}

fn list(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::List(PList::from_vec(args.to_vec())))
}

fn vector(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Vector(PVector::from_vec(args.to_vec())))
}

fn hash_map(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    if !args.len().is_multiple_of(2) {
        return Err(MacroError::Custom(
            "hash-map: requires an even number of arguments".to_string(),
        ));
    }
    let mut m = PMap::new();
    for pair in args.chunks(2) {
        m = m.assoc(pair[0].clone(), pair[1].clone());
    }
    Ok(Value::Map(m))
}

fn hash_set(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let mut s = PSet::new();
    for v in args {
        s = s.conj(v.clone());
    }
    Ok(Value::Set(s))
}

fn vec_fn(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(Value::Vector(PVector::from_vec(args[0].seq().into_vec())))
}

fn seq_fn(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let s = args[0].seq();
    if s.is_empty() {
        Ok(Value::Nil)
    } else {
        Ok(Value::List(PList::from_vec(s.into_vec())))
    }
}

fn count(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let n = match &args[0] {
        Value::Nil => 0,
        Value::List(l) => l.count(),
        Value::Vector(v) => v.count(),
        Value::Map(m) => m.count(),
        Value::Set(s) => s.count(),
        Value::Str(s) => s.chars().count(),
        other => other.seq().into_vec().len(),
    };
    Ok(Value::Int(n as i64))
}

fn nth(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let idx = args[1]
        .as_int()
        .ok_or_else(|| MacroError::type_mismatch("nth", "integer", args[1].type_name(), 1))?;
    if idx < 0 {
        return match args.get(2) {
            Some(default) => Ok(default.clone()),
            None => Err(MacroError::Custom("nth: index out of range".to_string())),
        };
    }
    match &args[0] {
        Value::Vector(v) => match v.nth(idx as usize) {
            Some(val) => Ok(val.clone()),
            None => match args.get(2) {
                Some(default) => Ok(default.clone()),
                None => Err(MacroError::Custom("nth: index out of range".to_string())),
            },
        },
        other => {
            let items = other.seq().into_vec();
            match items.into_iter().nth(idx as usize) {
                Some(val) => Ok(val),
                None => match args.get(2) {
                    Some(default) => Ok(default.clone()),
                    None => Err(MacroError::Custom("nth: index out of range".to_string())),
                },
            }
        }
    }
}

fn get(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    match &args[0] {
        Value::Map(m) => Ok(m.get(&args[1]).cloned().unwrap_or(default)),
        Value::Set(s) => Ok(if s.contains(&args[1]) { args[1].clone() } else { default }),
        Value::Vector(v) => match args[1].as_int() {
            Some(i) if i >= 0 => Ok(v.nth(i as usize).cloned().unwrap_or(default)),
            _ => Ok(default),
        },
        Value::Nil => Ok(default),
        other => Err(MacroError::type_mismatch("get", "associative collection", other.type_name(), 0)),
    }
}

fn assoc(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    if !(args.len() - 1).is_multiple_of(2) {
        return Err(MacroError::Custom(
            "assoc: requires an even number of key/value arguments".to_string(),
        ));
    }
    match &args[0] {
        Value::Map(m) => {
            let mut m = m.clone();
            for pair in args[1..].chunks(2) {
                m = m.assoc(pair[0].clone(), pair[1].clone());
            }
            Ok(Value::Map(m))
        }
        Value::Vector(v) => {
            let mut v = v.clone();
            for pair in args[1..].chunks(2) {
                let idx = pair[0]
                    .as_int()
                    .ok_or_else(|| MacroError::type_mismatch("assoc", "integer index", pair[0].type_name(), 1))?;
                v = v
                    .assoc(idx as usize, pair[1].clone())
                    .ok_or_else(|| MacroError::Custom("assoc: index out of range".to_string()))?;
            }
            Ok(Value::Vector(v))
        }
        other => Err(MacroError::type_mismatch("assoc", "associative collection", other.type_name(), 0)),
    }
}

fn last(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    Ok(args[0].seq().into_vec().into_iter().last().unwrap_or(Value::Nil))
}

fn butlast(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let mut items = args[0].seq().into_vec();
    items.pop();
    Ok(Value::List(PList::from_vec(items)))
}

fn partition(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    let n = args[0]
        .as_int()
        .filter(|n| *n > 0)
        .ok_or_else(|| MacroError::type_mismatch("partition", "positive integer", args[0].type_name(), 0))?
        as usize;
    let items = args[1].seq().into_vec();
    let chunks: Vec<Value> = items
        .chunks(n)
        .filter(|c| c.len() == n)
        .map(|c| Value::List(PList::from_vec(c.to_vec())))
        .collect();
    Ok(Value::List(PList::from_vec(chunks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn first_rest_on_vector() {
        let rt = Runtime::with_builtins();
        let v = Value::Vector(PVector::from_vec(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        assert_eq!(rt.call("first", std::slice::from_ref(&v)).unwrap(), Value::Int(1));
        assert_eq!(
            rt.call("rest", &[v]).unwrap(),
            Value::List(PList::from_vec(vec![Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn assoc_on_map_and_vector() {
        let rt = Runtime::with_builtins();
        let m = Value::Map(PMap::new());
        let result = rt
            .call("assoc", &[m, Value::string("a"), Value::Int(1)])
            .unwrap();
        assert_eq!(rt.call("get", &[result, Value::string("a")]).unwrap(), Value::Int(1));
    }

    #[test]
    fn partition_drops_incomplete_trailing_chunk() {
        let rt = Runtime::with_builtins();
        let v = Value::Vector(PVector::from_vec(
            (1..=5).map(Value::Int).collect(),
        ));
        let result = rt.call("partition", &[Value::Int(2), v]).unwrap();
        assert_eq!(rt.call("count", &[result]).unwrap(), Value::Int(2));
    }
}
