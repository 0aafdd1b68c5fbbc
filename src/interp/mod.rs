// ABOUTME: Tree-walking macro interpreter (C4) — special forms, closures, and explicit recur control flow

pub mod env;

use crate::error::{Arity, MacroError};
use crate::runtime::Runtime;
use crate::value::{PList, PVector, Symbol, Value};
use env::{FrameArena, FrameHandle};
use std::rc::Rc;

#[derive(Debug)]
pub struct Lambda {
    pub params: Vec<String>,
    pub rest: Option<String>,
    pub self_name: Option<String>,
    pub body: Vec<Value>,
    pub captured: FrameHandle,
}

/// Result of evaluating one form. `Recur` only ever escapes as far as the
/// nearest enclosing `apply_lambda` loop; if it escapes further the
/// interpreter reports `RecurOutsideFn`.
enum Flow {
    Value(Value),
    Recur(Vec<Value>),
}

impl Flow {
    fn into_value(self) -> Result<Value, MacroError> {
        match self {
            Flow::Value(v) => Ok(v),
            Flow::Recur(_) => Err(MacroError::RecurOutsideFn),
        }
    }
}

pub struct Interpreter {
    arena: FrameArena,
    pub runtime: Rc<Runtime>,
    gensym_counter: std::cell::Cell<u64>,
}

impl Interpreter {
    pub fn new(runtime: Rc<Runtime>) -> Self {
        Self::with_gensym_start(runtime, 0)
    }

    /// A fresh counter starting at a caller-chosen value, for reproducible
    /// auto-gensym output in tests (see `ExpanderConfig`).
    pub fn with_gensym_start(runtime: Rc<Runtime>, start: u64) -> Self {
        Interpreter {
            arena: FrameArena::new(),
            runtime,
            gensym_counter: std::cell::Cell::new(start),
        }
    }

    /// Allocates the next auto-gensym id, used by the syntax-quote transform
    /// for `foo#` symbols. Independent of the `gensym` runtime builtin.
    pub fn next_gensym(&self) -> u64 {
        let n = self.gensym_counter.get();
        self.gensym_counter.set(n + 1);
        n
    }

    pub fn root_frame(&self) -> FrameHandle {
        self.arena.root()
    }

    pub fn define_global(&self, name: &str, value: Value) {
        let root = self.root_frame();
        self.arena.define(root, name, value);
    }

    pub fn child_frame(&self, parent: FrameHandle) -> FrameHandle {
        self.arena.child_of(parent)
    }

    pub fn define(&self, frame: FrameHandle, name: &str, value: Value) {
        self.arena.define(frame, name, value);
    }

    pub fn eval(&self, form: &Value, frame: FrameHandle) -> Result<Value, MacroError> {
        self.eval_flow(form, frame)?.into_value()
    }

    fn eval_flow(&self, form: &Value, frame: FrameHandle) -> Result<Flow, MacroError> {
        match form {
            Value::Nil
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Char(_)
            | Value::Str(_)
            | Value::Keyword(_)
            | Value::Regex(_)
            | Value::Lambda(_) => Ok(Flow::Value(form.clone())),

            Value::Symbol(s) => Ok(Flow::Value(match self.arena_get(frame, s) {
                Some(v) => v,
                None => form.clone(),
            })),

            Value::Vector(v) => {
                let mut out = Vec::with_capacity(v.count());
                for item in v.iter() {
                    out.push(self.eval(item, frame)?);
                }
                Ok(Flow::Value(Value::Vector(PVector::from_vec(out))))
            }

            Value::Set(s) => {
                let mut out = Vec::new();
                for item in s.iter() {
                    out.push(self.eval(item, frame)?);
                }
                Ok(Flow::Value(Value::Set(out.into_iter().collect())))
            }

            Value::Map(m) => {
                let mut out = Vec::new();
                for (k, v) in m.iter() {
                    out.push((self.eval(k, frame)?, self.eval(v, frame)?));
                }
                Ok(Flow::Value(Value::Map(out.into_iter().collect())))
            }

            Value::List(l) => self.eval_list(l, frame),

            Value::Cons(..) => {
                let items = form.seq().into_vec();
                self.eval_list(&PList::from_vec(items), frame)
            }
        }
    }

    fn arena_get(&self, frame: FrameHandle, s: &Symbol) -> Option<Value> {
        if s.is_qualified() {
            return None;
        }
        self.arena.get(frame, &s.name)
    }

    fn eval_list(&self, l: &PList, frame: FrameHandle) -> Result<Flow, MacroError> {
        let items: Vec<Value> = l.iter().collect();
        let Some(head) = items.first() else {
            return Ok(Flow::Value(Value::List(l.clone())));
        };

        if let Some(sym) = head.as_symbol() {
            if !sym.is_qualified() {
                match sym.name.as_ref() {
                    "quote" => return self.sf_quote(&items),
                    "if" => return self.sf_if(&items, frame),
                    "do" => return self.sf_do(&items, frame),
                    "let" => return self.sf_let(&items, frame),
                    "fn" => return self.sf_fn(&items, frame),
                    "recur" => return self.sf_recur(&items, frame),
                    "syntax-quote" => {
                        return Ok(Flow::Value(crate::expander::syntax_quote::expand_template(
                            &items[1],
                            self,
                            frame,
                        )?))
                    }
                    _ => {}
                }
            }
        }

        let head_val = self.eval(head, frame)?;
        let mut args = Vec::with_capacity(items.len() - 1);
        for a in &items[1..] {
            args.push(self.eval(a, frame)?);
        }
        self.apply_flow(head_val, args)
    }

    pub fn apply(&self, f: Value, args: Vec<Value>) -> Result<Value, MacroError> {
        self.apply_flow(f, args)?.into_value()
    }

    fn apply_flow(&self, f: Value, args: Vec<Value>) -> Result<Flow, MacroError> {
        match &f {
            Value::Lambda(lambda) => self.apply_lambda(lambda.clone(), args),
            Value::Symbol(sym) => match self
                .runtime
                .call_with(&sym.name, &args, &|f, a| self.apply(f.clone(), a.to_vec()))
            {
                Ok(v) => Ok(Flow::Value(v)),
                Err(MacroError::UndefinedSymbol(_)) => {
                    let mut out = vec![f.clone()];
                    out.extend(args);
                    Ok(Flow::Value(Value::List(PList::from_vec(out))))
                }
                Err(e) => Err(e),
            },
            Value::Keyword(k) => {
                if args.is_empty() || args.len() > 2 {
                    return Err(MacroError::arity("keyword-as-fn", Arity::Range(1, 2), args.len()));
                }
                let result = match &args[0] {
                    Value::Map(m) => m.get(&Value::Keyword(k.clone())).cloned(),
                    _ => None,
                };
                Ok(Flow::Value(result.or_else(|| args.get(1).cloned()).unwrap_or(Value::Nil)))
            }
            other => Err(MacroError::NotCallable(other.to_string())),
        }
    }

    fn apply_lambda(&self, lambda: Rc<Lambda>, mut args: Vec<Value>) -> Result<Flow, MacroError> {
        loop {
            let min = lambda.params.len();
            let expected = if lambda.rest.is_some() {
                Arity::AtLeast(min)
            } else {
                Arity::Exact(min)
            };
            if !expected.accepts(args.len()) {
                return Err(MacroError::arity("fn", expected, args.len()));
            }

            let call_frame = self.arena.child_of(lambda.captured);
            for (i, p) in lambda.params.iter().enumerate() {
                self.arena.define(call_frame, p, args[i].clone());
            }
            if let Some(rest) = &lambda.rest {
                let rest_items = args[min..].to_vec();
                self.arena
                    .define(call_frame, rest, Value::List(PList::from_vec(rest_items)));
            }
            if let Some(self_name) = &lambda.self_name {
                self.arena
                    .define(call_frame, self_name, Value::Lambda(lambda.clone()));
            }

            let mut result = Flow::Value(Value::Nil);
            for form in &lambda.body {
                result = self.eval_flow(form, call_frame)?;
            }

            match result {
                Flow::Recur(new_args) => {
                    args = new_args;
                    continue;
                }
                Flow::Value(v) => return Ok(Flow::Value(v)),
            }
        }
    }

    fn sf_quote(&self, items: &[Value]) -> Result<Flow, MacroError> {
        if items.len() != 2 {
            return Err(MacroError::arity("quote", Arity::Exact(1), items.len() - 1));
        }
        Ok(Flow::Value(items[1].clone()))
    }

    fn sf_if(&self, items: &[Value], frame: FrameHandle) -> Result<Flow, MacroError> {
        if items.len() < 3 || items.len() > 4 {
            return Err(MacroError::arity("if", Arity::Range(2, 3), items.len() - 1));
        }
        let cond = self.eval(&items[1], frame)?;
        if cond.is_truthy() {
            self.eval_flow(&items[2], frame)
        } else if let Some(else_branch) = items.get(3) {
            self.eval_flow(else_branch, frame)
        } else {
            Ok(Flow::Value(Value::Nil))
        }
    }

    fn sf_do(&self, items: &[Value], frame: FrameHandle) -> Result<Flow, MacroError> {
        let mut result = Flow::Value(Value::Nil);
        for form in &items[1..] {
            result = self.eval_flow(form, frame)?;
        }
        Ok(result)
    }

    fn sf_let(&self, items: &[Value], frame: FrameHandle) -> Result<Flow, MacroError> {
        if items.len() < 2 {
            return Err(MacroError::arity("let", Arity::AtLeast(1), items.len() - 1));
        }
        let Value::Vector(bindings) = &items[1] else {
            return Err(MacroError::type_mismatch("let", "binding vector", items[1].type_name(), 1));
        };
        if bindings.count() % 2 != 0 {
            return Err(MacroError::Custom(
                "let: binding vector must have an even number of forms".to_string(),
            ));
        }

        let scope = self.arena.child_of(frame);
        let pairs: Vec<&Value> = bindings.iter().collect();
        for pair in pairs.chunks(2) {
            let Value::Symbol(name) = pair[0] else {
                return Err(MacroError::type_mismatch(
                    "let",
                    "symbol",
                    pair[0].type_name(),
                    0,
                ));
            };
            let value = self.eval(pair[1], scope)?;
            self.arena.define(scope, name.name.as_ref(), value);
        }

        let mut result = Flow::Value(Value::Nil);
        for form in &items[2..] {
            result = self.eval_flow(form, scope)?;
        }
        Ok(result)
    }

    fn sf_fn(&self, items: &[Value], frame: FrameHandle) -> Result<Flow, MacroError> {
        let mut rest_idx = 1;
        let self_name = if let Some(Value::Symbol(s)) = items.get(rest_idx) {
            rest_idx += 1;
            Some(s.name.to_string())
        } else {
            None
        };
        let Some(Value::Vector(params_vec)) = items.get(rest_idx) else {
            return Err(MacroError::MalformedDefmacro(
                "fn: missing parameter vector".to_string(),
            ));
        };
        rest_idx += 1;

        let mut params = Vec::new();
        let mut rest = None;
        let mut iter = params_vec.iter().peekable();
        while let Some(p) = iter.next() {
            let Value::Symbol(s) = p else {
                return Err(MacroError::type_mismatch("fn", "symbol", p.type_name(), 0));
            };
            if s.name.as_ref() == "&" {
                let Some(Value::Symbol(rest_sym)) = iter.next() else {
                    return Err(MacroError::MalformedDefmacro(
                        "fn: '&' must be followed by a binding symbol".to_string(),
                    ));
                };
                rest = Some(rest_sym.name.to_string());
                break;
            }
            params.push(s.name.to_string());
        }

        let lambda = Rc::new(Lambda {
            params,
            rest,
            self_name,
            body: items[rest_idx..].to_vec(),
            captured: frame,
        });
        Ok(Flow::Value(Value::Lambda(lambda)))
    }

    fn sf_recur(&self, items: &[Value], frame: FrameHandle) -> Result<Flow, MacroError> {
        let mut args = Vec::with_capacity(items.len() - 1);
        for a in &items[1..] {
            args.push(self.eval(a, frame)?);
        }
        Ok(Flow::Recur(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PVector;

    fn interp() -> Interpreter {
        Interpreter::new(Rc::new(Runtime::with_builtins()))
    }

    fn sym(name: &str) -> Value {
        Value::symbol(name)
    }

    fn list(items: Vec<Value>) -> Value {
        Value::List(PList::from_vec(items))
    }

    #[test]
    fn self_evaluating_forms() {
        let i = interp();
        let root = i.root_frame();
        assert_eq!(i.eval(&Value::Int(5), root).unwrap(), Value::Int(5));
        assert_eq!(i.eval(&Value::Nil, root).unwrap(), Value::Nil);
    }

    #[test]
    fn higher_order_builtin_calls_back_into_evaluated_lambdas() {
        let i = interp();
        let root = i.root_frame();
        let form = list(vec![
            sym("map"),
            list(vec![sym("fn"), Value::Vector(PVector::from_vec(vec![sym("n")])), list(vec![sym("+"), sym("n"), Value::Int(1)])]),
            Value::Vector(PVector::from_vec(vec![Value::Int(1), Value::Int(2), Value::Int(3)])),
        ]);
        assert_eq!(
            i.eval(&form, root).unwrap(),
            Value::List(PList::from_vec(vec![Value::Int(2), Value::Int(3), Value::Int(4)]))
        );
    }

    #[test]
    fn unbound_symbol_is_literal() {
        let i = interp();
        let root = i.root_frame();
        assert_eq!(i.eval(&sym("foo"), root).unwrap(), sym("foo"));
    }

    #[test]
    fn if_branches() {
        let i = interp();
        let root = i.root_frame();
        let form = list(vec![sym("if"), Value::Bool(true), Value::Int(1), Value::Int(2)]);
        assert_eq!(i.eval(&form, root).unwrap(), Value::Int(1));
        let form = list(vec![sym("if"), Value::Bool(false), Value::Int(1), Value::Int(2)]);
        assert_eq!(i.eval(&form, root).unwrap(), Value::Int(2));
    }

    #[test]
    fn let_sequential_scoping() {
        let i = interp();
        let root = i.root_frame();
        let bindings = Value::Vector(PVector::from_vec(vec![
            sym("x"),
            Value::Int(1),
            sym("y"),
            list(vec![sym("+"), sym("x"), Value::Int(1)]),
        ]));
        let form = list(vec![sym("let"), bindings, sym("y")]);
        assert_eq!(i.eval(&form, root).unwrap(), Value::Int(2));
    }

    #[test]
    fn fn_and_recur_loop() {
        let i = interp();
        let root = i.root_frame();
        let params = Value::Vector(PVector::from_vec(vec![sym("n"), sym("acc")]));
        let body = list(vec![
            sym("if"),
            list(vec![sym("zero?"), sym("n")]),
            sym("acc"),
            list(vec![
                sym("recur"),
                list(vec![sym("dec"), sym("n")]),
                list(vec![sym("*"), sym("acc"), sym("n")]),
            ]),
        ]);
        let fn_form = list(vec![sym("fn"), sym("fact"), params, body]);
        let lambda = i.eval(&fn_form, root).unwrap();
        let result = i.apply(lambda, vec![Value::Int(5), Value::Int(1)]).unwrap();
        assert_eq!(result, Value::Int(120));
    }

    #[test]
    fn recur_outside_fn_errors() {
        let i = interp();
        let root = i.root_frame();
        let form = list(vec![sym("recur"), Value::Int(1)]);
        assert!(matches!(i.eval(&form, root), Err(MacroError::RecurOutsideFn)));
    }

    #[test]
    fn unknown_head_symbol_becomes_code_literal() {
        let i = interp();
        let root = i.root_frame();
        let form = list(vec![sym("my-host-fn"), Value::Int(1), Value::Int(2)]);
        let result = i.eval(&form, root).unwrap();
        assert_eq!(
            result,
            list(vec![sym("my-host-fn"), Value::Int(1), Value::Int(2)])
        );
    }
}
