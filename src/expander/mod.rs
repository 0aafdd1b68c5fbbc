// ABOUTME: Macro expander (C5) — recursive expansion driver, defmacro registry, built-in macros

pub mod registry;
pub mod syntax_quote;

use crate::config::ExpanderConfig;
use crate::error::MacroError;
use crate::interp::Interpreter;
use crate::runtime::Runtime;
use crate::value::{PList, PMap, PSet, PVector, Value};
use registry::{parse_defmacro, MacroDef};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct Expander {
    interp: Interpreter,
    user_macros: RefCell<HashMap<String, MacroDef>>,
}

impl Expander {
    pub fn new() -> Self {
        Self::with_config(ExpanderConfig::default())
    }

    pub fn with_config(config: ExpanderConfig) -> Self {
        Expander {
            interp: Interpreter::with_gensym_start(Rc::new(Runtime::with_builtins()), config.gensym_start),
            user_macros: RefCell::new(HashMap::new()),
        }
    }

    /// Expands one top-level form to a fixed point, then recurses into children.
    pub fn expand_form(&self, form: &Value) -> Result<Value, MacroError> {
        let mut current = form.clone();
        while let Some(next) = self.try_expand_once(&current)? {
            current = next;
        }
        self.expand_children(&current)
    }

    fn try_expand_once(&self, form: &Value) -> Result<Option<Value>, MacroError> {
        let Value::List(l) = form else { return Ok(None) };
        let items: Vec<Value> = l.iter().collect();
        let Some(head) = items.first().and_then(Value::as_symbol) else {
            return Ok(None);
        };
        if head.is_qualified() {
            return Ok(None);
        }

        match head.name.as_ref() {
            "defmacro" => {
                let Some((name, def)) = parse_defmacro(&items) else {
                    return Err(MacroError::MalformedDefmacro(form.to_string()));
                };
                self.user_macros.borrow_mut().insert(name, def);
                Ok(Some(Value::Nil))
            }
            "future" => Ok(Some(self.expand_future(&items[1..])?)),
            "time" => Ok(Some(self.expand_time(&items[1..])?)),
            name => {
                let def = self.user_macros.borrow().get(name).cloned();
                match def {
                    Some(def) => Ok(Some(self.invoke_macro(&def, &items[1..])?)),
                    None => Ok(None),
                }
            }
        }
    }

    fn invoke_macro(&self, def: &MacroDef, operands: &[Value]) -> Result<Value, MacroError> {
        use crate::error::Arity;
        let min = def.params.len();
        let expected = if def.rest.is_some() { Arity::AtLeast(min) } else { Arity::Exact(min) };
        if !expected.accepts(operands.len()) {
            return Err(MacroError::arity("macro", expected, operands.len()));
        }

        let call_frame = self.interp.child_frame(self.interp.root_frame());
        for (p, v) in def.params.iter().zip(operands) {
            self.interp.define(call_frame, p, v.clone());
        }
        if let Some(rest) = &def.rest {
            self.interp
                .define(call_frame, rest, Value::List(PList::from_vec(operands[min..].to_vec())));
        }

        let mut result = Value::Nil;
        for form in &def.body {
            result = self.interp.eval(form, call_frame)?;
        }
        Ok(result)
    }

    fn expand_children(&self, form: &Value) -> Result<Value, MacroError> {
        match form {
            Value::List(l) => {
                let items: Vec<Value> = l.iter().collect();
                if let Some(head) = items.first().and_then(Value::as_symbol) {
                    if !head.is_qualified() && head.name.as_ref() == "quote" {
                        return Ok(form.clone());
                    }
                }
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.expand_form(&item)?);
                }
                Ok(Value::List(PList::from_vec(out)))
            }
            Value::Vector(v) => {
                let mut out = Vec::with_capacity(v.count());
                for item in v.iter() {
                    out.push(self.expand_form(item)?);
                }
                Ok(Value::Vector(PVector::from_vec(out)))
            }
            Value::Set(s) => {
                let mut out = Vec::new();
                for item in s.iter() {
                    out.push(self.expand_form(item)?);
                }
                Ok(Value::Set(out.into_iter().collect::<PSet>()))
            }
            Value::Map(m) => {
                let mut out = PMap::new();
                for (k, v) in m.iter() {
                    out = out.assoc(self.expand_form(k)?, self.expand_form(v)?);
                }
                Ok(Value::Map(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn gensym(&self, base: &str) -> String {
        format!("{base}__{}__auto__", self.interp.next_gensym())
    }

    /// `(future e…)` wraps the body in a zero-argument closure and hands it
    /// to a host concurrency primitive reference; both bindings are
    /// gensym'd so nested uses never collide.
    fn expand_future(&self, body: &[Value]) -> Result<Value, MacroError> {
        let f_name = self.gensym("f");
        let mut fn_form = vec![Value::symbol("fn"), Value::Vector(PVector::new())];
        fn_form.extend(body.iter().cloned());

        let bindings = Value::Vector(PVector::from_vec(vec![Value::symbol(f_name.as_str()), Value::List(PList::from_vec(fn_form))]));
        let call = Value::List(PList::from_vec(vec![Value::symbol("host/future-call"), Value::symbol(f_name.as_str())]));
        Ok(Value::List(PList::from_vec(vec![Value::symbol("let"), bindings, call])))
    }

    /// `(time e)` binds a stopwatch start, the value of `e`, and the elapsed
    /// milliseconds; prints `Elapsed time: <n> msecs` and returns `e`'s value.
    fn expand_time(&self, body: &[Value]) -> Result<Value, MacroError> {
        if body.len() != 1 {
            return Err(MacroError::arity("time", crate::error::Arity::Exact(1), body.len()));
        }
        let start = self.gensym("start");
        let result = self.gensym("result");
        let elapsed = self.gensym("elapsed");

        let now = || Value::List(PList::from_vec(vec![Value::symbol("host/now-millis")]));
        let bindings = Value::Vector(PVector::from_vec(vec![
            Value::symbol(start.as_str()),
            now(),
            Value::symbol(result.as_str()),
            body[0].clone(),
            Value::symbol(elapsed.as_str()),
            Value::List(PList::from_vec(vec![Value::symbol("-"), now(), Value::symbol(start.as_str())])),
        ]));
        let message = Value::List(PList::from_vec(vec![
            Value::symbol("str"),
            Value::string("Elapsed time: "),
            Value::symbol(elapsed.as_str()),
            Value::string(" msecs"),
        ]));
        let print_call = Value::List(PList::from_vec(vec![Value::symbol("host/print-line"), message]));
        Ok(Value::List(PList::from_vec(vec![
            Value::symbol("let"),
            bindings,
            print_call,
            Value::symbol(result.as_str()),
        ])))
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: Vec<Value>) -> Value {
        Value::List(PList::from_vec(items))
    }

    #[test]
    fn reads_and_expands_a_syntax_quoted_defmacro_end_to_end() {
        let e = Expander::new();
        let forms = crate::reader::read_str(
            r#"(defmacro unless [test body] `(if ~test nil ~body))
               (unless false 42)"#,
        )
        .unwrap();
        assert_eq!(e.expand_form(&forms[0]).unwrap(), Value::Nil);
        assert_eq!(
            e.expand_form(&forms[1]).unwrap(),
            list(vec![Value::symbol("if"), Value::Bool(false), Value::Nil, Value::Int(42)])
        );
    }

    #[test]
    fn defmacro_expands_to_nil_and_registers() {
        let e = Expander::new();
        let defmacro = list(vec![
            Value::symbol("defmacro"),
            Value::symbol("unless"),
            Value::Vector(PVector::from_vec(vec![Value::symbol("test"), Value::symbol("body")])),
            list(vec![
                Value::symbol("syntax-quote"),
                list(vec![
                    Value::symbol("if"),
                    list(vec![Value::symbol("unquote"), Value::symbol("test")]),
                    Value::Nil,
                    list(vec![Value::symbol("unquote"), Value::symbol("body")]),
                ]),
            ]),
        ]);
        assert_eq!(e.expand_form(&defmacro).unwrap(), Value::Nil);

        let usage = list(vec![Value::symbol("unless"), Value::Bool(false), Value::Int(42)]);
        let expanded = e.expand_form(&usage).unwrap();
        assert_eq!(
            expanded,
            list(vec![Value::symbol("if"), Value::Bool(false), Value::Nil, Value::Int(42)])
        );
    }

    #[test]
    fn quoted_forms_are_not_expanded() {
        let e = Expander::new();
        let defmacro = list(vec![
            Value::symbol("defmacro"),
            Value::symbol("id"),
            Value::Vector(PVector::from_vec(vec![Value::symbol("x")])),
            Value::symbol("x"),
        ]);
        e.expand_form(&defmacro).unwrap();

        let quoted = list(vec![Value::symbol("quote"), list(vec![Value::symbol("id"), Value::Int(1)])]);
        let expanded = e.expand_form(&quoted).unwrap();
        assert_eq!(expanded, quoted);
    }

    #[test]
    fn future_and_time_use_gensyms() {
        let e = Expander::new();
        let expanded = e.expand_form(&list(vec![Value::symbol("future"), Value::Int(1)])).unwrap();
        let Value::List(l) = &expanded else { panic!() };
        assert_eq!(l.first().and_then(Value::as_symbol).unwrap().name.as_ref(), "let");

        let expanded = e
            .expand_form(&list(vec![
                Value::symbol("time"),
                list(vec![Value::symbol("+"), Value::Int(1), Value::Int(2)]),
            ]))
            .unwrap();
        let Value::List(l) = &expanded else { panic!() };
        assert_eq!(l.first().and_then(Value::as_symbol).unwrap().name.as_ref(), "let");
    }
}
