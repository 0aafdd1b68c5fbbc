// ABOUTME: Syntax-quote transform — the heart of the macro expander (C5)

use crate::error::MacroError;
use crate::interp::env::FrameHandle;
use crate::interp::Interpreter;
use crate::value::{PList, PMap, PSet, PVector, Symbol, Value};
use std::collections::HashMap;

/// Per-syntax-quote-form map from trailing-`#` base name to the symbol
/// allocated for it. A nested syntax-quote form gets its own fresh scope
/// (the resolved Open Question), so `foo#` inside a nested `` ` `` never
/// collides with one in the enclosing template.
type GensymScope = HashMap<String, String>;

/// Expands one syntax-quote template into its reconstructed value, evaluating
/// `~x`/`~@x` against `frame` as it goes.
pub fn expand_template(template: &Value, interp: &Interpreter, frame: FrameHandle) -> Result<Value, MacroError> {
    let mut scope = GensymScope::new();
    transform(template, interp, frame, &mut scope)
}

fn transform(t: &Value, interp: &Interpreter, frame: FrameHandle, scope: &mut GensymScope) -> Result<Value, MacroError> {
    match t {
        Value::Symbol(s) if !s.is_qualified() && s.name.ends_with('#') => {
            let base = s.name.trim_end_matches('#').to_string();
            let fresh = scope
                .entry(base.clone())
                .or_insert_with(|| format!("{base}__{}__auto__", interp.next_gensym()))
                .clone();
            Ok(Value::Symbol(Symbol::new(fresh)))
        }
        Value::Symbol(_) => Ok(t.clone()),

        Value::List(l) => {
            let items: Vec<Value> = l.iter().collect();
            match classify(&items) {
                Some(UnquoteKind::Unquote(x)) => interp.eval(&x, frame),
                Some(UnquoteKind::Splicing(_)) => Err(MacroError::SplicingOutOfContext),
                None => match is_nested_syntax_quote(&items) {
                    Some(inner) => {
                        let mut nested_scope = GensymScope::new();
                        let rewritten = transform(&inner, interp, frame, &mut nested_scope)?;
                        Ok(Value::List(PList::from_vec(vec![Value::symbol("syntax-quote"), rewritten])))
                    }
                    None => {
                        let out = transform_seq(&items, interp, frame, scope)?;
                        Ok(Value::List(PList::from_vec(out)))
                    }
                },
            }
        }

        Value::Vector(v) => {
            let items: Vec<Value> = v.iter().cloned().collect();
            let out = transform_seq(&items, interp, frame, scope)?;
            Ok(Value::Vector(PVector::from_vec(out)))
        }

        Value::Set(s) => {
            let items: Vec<Value> = s.iter().cloned().collect();
            let out = transform_seq(&items, interp, frame, scope)?;
            Ok(Value::Set(out.into_iter().collect::<PSet>()))
        }

        Value::Map(m) => {
            let mut out = PMap::new();
            for (k, v) in m.iter() {
                let k2 = transform(k, interp, frame, scope)?;
                let v2 = transform(v, interp, frame, scope)?;
                out = out.assoc(k2, v2);
            }
            Ok(Value::Map(out))
        }

        other => Ok(other.clone()),
    }
}

/// Transforms a sequence of template elements, splicing in `~@x` results and
/// evaluating plain `~x` elements, in source order.
fn transform_seq(
    items: &[Value],
    interp: &Interpreter,
    frame: FrameHandle,
    scope: &mut GensymScope,
) -> Result<Vec<Value>, MacroError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let item_items = match item {
            Value::List(l) => Some(l.iter().collect::<Vec<Value>>()),
            _ => None,
        };
        match item_items.as_deref().and_then(classify) {
            Some(UnquoteKind::Unquote(x)) => out.push(interp.eval(&x, frame)?),
            Some(UnquoteKind::Splicing(x)) => {
                let spliced = interp.eval(&x, frame)?;
                out.extend(spliced.seq().into_vec());
            }
            None => out.push(transform(item, interp, frame, scope)?),
        }
    }
    Ok(out)
}

enum UnquoteKind {
    Unquote(Value),
    Splicing(Value),
}

fn classify(items: &[Value]) -> Option<UnquoteKind> {
    if items.len() != 2 {
        return None;
    }
    let head = items[0].as_symbol()?;
    if head.is_qualified() {
        return None;
    }
    match head.name.as_ref() {
        "unquote" => Some(UnquoteKind::Unquote(items[1].clone())),
        "unquote-splicing" => Some(UnquoteKind::Splicing(items[1].clone())),
        _ => None,
    }
}

fn is_nested_syntax_quote(items: &[Value]) -> Option<Value> {
    if items.len() != 2 {
        return None;
    }
    let head = items[0].as_symbol()?;
    if !head.is_qualified() && head.name.as_ref() == "syntax-quote" {
        Some(items[1].clone())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use std::rc::Rc;

    fn interp() -> Interpreter {
        Interpreter::new(Rc::new(Runtime::with_builtins()))
    }

    fn sq(template: Value) -> Value {
        Value::List(PList::from_vec(vec![Value::symbol("syntax-quote"), template]))
    }

    #[test]
    fn plain_symbol_quotes_itself() {
        let i = interp();
        let root = i.root_frame();
        let result = i.eval(&sq(Value::symbol("foo")), root).unwrap();
        assert_eq!(result, Value::symbol("foo"));
    }

    #[test]
    fn unquote_evaluates_against_current_frame() {
        let i = interp();
        let root = i.root_frame();
        i.define_global("x", Value::Int(42));
        let template = Value::List(PList::from_vec(vec![
            Value::symbol("unquote"),
            Value::symbol("x"),
        ]));
        let result = i.eval(&sq(template), root).unwrap();
        assert_eq!(result, Value::Int(42));
    }

    #[test]
    fn unquote_splicing_unpacks_into_enclosing_list() {
        let i = interp();
        let root = i.root_frame();
        i.define_global(
            "xs",
            Value::List(PList::from_vec(vec![Value::Int(2), Value::Int(3)])),
        );
        let inner = Value::List(PList::from_vec(vec![
            Value::symbol("unquote-splicing"),
            Value::symbol("xs"),
        ]));
        let template = Value::List(PList::from_vec(vec![Value::Int(1), inner, Value::Int(4)]));
        let result = i.eval(&sq(template), root).unwrap();
        assert_eq!(
            result,
            Value::List(PList::from_vec(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4)
            ]))
        );
    }

    #[test]
    fn autogensym_is_stable_within_one_form_and_fresh_across_forms() {
        let i = interp();
        let root = i.root_frame();
        let template = Value::Vector(PVector::from_vec(vec![
            Value::symbol("tmp#"),
            Value::symbol("tmp#"),
        ]));
        let first = i.eval(&sq(template.clone()), root).unwrap();
        let second = i.eval(&sq(template), root).unwrap();

        let Value::Vector(v) = &first else { panic!() };
        assert_eq!(v.nth(0), v.nth(1));

        assert_ne!(first, second);
    }

    #[test]
    fn splicing_outside_seq_position_is_an_error() {
        let i = interp();
        let root = i.root_frame();
        let template = Value::List(PList::from_vec(vec![
            Value::symbol("unquote-splicing"),
            Value::symbol("x"),
        ]));
        let result = i.eval(&sq(template), root);
        assert!(matches!(result, Err(MacroError::SplicingOutOfContext)));
    }
}
