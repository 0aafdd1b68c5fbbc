// ABOUTME: Macro runtime (C3) — a flat registry of pure functions over Value, callable from macro bodies

pub mod arithmetic;
pub mod comparison;
pub mod gensym;
pub mod higher_order;
pub mod predicates;
pub mod sequence;
pub mod strings;
pub mod symbols;

use crate::error::{Arity, MacroError};
use crate::value::Value;
use std::collections::HashMap;

/// Callback a higher-order builtin uses to invoke a `Value` as a function —
/// supplied by the interpreter, since the runtime itself knows nothing about
/// closures or `recur`. Parameterized over a lifetime (rather than defaulting
/// to `'static`) so the interpreter can pass a closure that borrows itself
/// for the duration of one call.
pub type ApplyFn<'a> = dyn Fn(&Value, &[Value]) -> Result<Value, MacroError> + 'a;

pub type BuiltinFn = fn(&[Value], &ApplyFn) -> Result<Value, MacroError>;

pub struct Overload {
    pub arity: Arity,
    pub guard: fn(&[Value]) -> bool,
    pub func: BuiltinFn,
}

fn no_guard(_: &[Value]) -> bool {
    true
}

pub struct Runtime {
    table: HashMap<&'static str, Vec<Overload>>,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            table: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut rt = Runtime::new();
        sequence::register(&mut rt);
        higher_order::register(&mut rt);
        predicates::register(&mut rt);
        comparison::register(&mut rt);
        arithmetic::register(&mut rt);
        symbols::register(&mut rt);
        strings::register(&mut rt);
        gensym::register(&mut rt);
        rt
    }

    pub fn register(&mut self, name: &'static str, arity: Arity, func: BuiltinFn) {
        self.register_guarded(name, arity, no_guard, func);
    }

    pub fn register_guarded(
        &mut self,
        name: &'static str,
        arity: Arity,
        guard: fn(&[Value]) -> bool,
        func: BuiltinFn,
    ) {
        self.table.entry(name).or_default().push(Overload { arity, guard, func });
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Resolves `name` against the registry using arity-and-type overload
    /// dispatch: overloads are tried in registration order, the first whose
    /// arity and type guard both accept the call wins. If none match, the
    /// closest (arity-accepting) overload's type mismatch is surfaced instead
    /// of a generic "no match" error.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, MacroError> {
        self.call_with(name, args, &|_, _| {
            Err(MacroError::Custom(
                "higher-order call attempted without an interpreter".to_string(),
            ))
        })
    }

    pub fn call_with(&self, name: &str, args: &[Value], apply: &ApplyFn) -> Result<Value, MacroError> {
        let Some(overloads) = self.table.get(name) else {
            return Err(MacroError::UndefinedSymbol(name.to_string()));
        };

        let mut arity_match: Option<&Overload> = None;
        for overload in overloads {
            if !overload.arity.accepts(args.len()) {
                continue;
            }
            if arity_match.is_none() {
                arity_match = Some(overload);
            }
            if (overload.guard)(args) {
                return (overload.func)(args, apply);
            }
        }

        match arity_match {
            Some(overload) => (overload.func)(args, apply),
            None => {
                let expected = overloads[0].arity;
                Err(MacroError::arity(name, expected, args.len()))
            }
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_name_is_reported() {
        let rt = Runtime::with_builtins();
        assert!(matches!(
            rt.call("no-such-fn", &[]),
            Err(MacroError::UndefinedSymbol(_))
        ));
    }
}
