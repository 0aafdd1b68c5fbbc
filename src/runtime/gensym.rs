//! `gensym`, with and without a prefix — monotonic within one runtime instance.

use super::{ApplyFn, Runtime};
use crate::error::{Arity, MacroError};
use crate::value::{Symbol, Value};

pub fn register(rt: &mut Runtime) {
    rt.register("gensym", Arity::Range(0, 1), gensym);
}

fn gensym(args: &[Value], _apply: &ApplyFn) -> Result<Value, MacroError> {
    // Process-wide counter: fine for this explicit user-facing builtin, which
    // makes no reproducibility promise. The expander's own auto-gensym
    // allocator (for `foo#` in syntax-quote) keeps a separate, per-instance
    // counter instead, since *that* one must restart at zero for tests.
    let prefix = match args.first() {
        Some(v) => v.as_str().map(str::to_string).ok_or_else(|| {
            MacroError::type_mismatch("gensym", "string", v.type_name(), 0)
        })?,
        None => "G__".to_string(),
    };
    Ok(Value::Symbol(Symbol::new(format!("{prefix}{}", next_id()))))
}

fn next_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;

    #[test]
    fn successive_gensyms_differ() {
        let rt = Runtime::with_builtins();
        let a = rt.call("gensym", &[]).unwrap();
        let b = rt.call("gensym", &[]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn prefix_is_honored() {
        let rt = Runtime::with_builtins();
        let a = rt.call("gensym", &[Value::string("tmp")]).unwrap();
        assert!(a.to_string().starts_with("tmp"));
    }
}
