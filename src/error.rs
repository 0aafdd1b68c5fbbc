// ABOUTME: Error types for the reader, macro runtime/interpreter/expander, and dependency resolver

use thiserror::Error;

/// A malformed-source error from the reader (C2). Carries the byte offset into
/// the input actually handed to the parser (post UTF-16-to-UTF-8 re-encode, if any).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("reader error at byte {offset}: {message}")]
pub struct ReaderError {
    pub offset: usize,
    pub message: String,
}

impl ReaderError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        ReaderError {
            offset,
            message: message.into(),
        }
    }
}

/// Arity shape accepted by a runtime-function overload, used both for dispatch
/// and for rendering arity-mismatch messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(k) => n == k,
            Arity::AtLeast(k) => n >= k,
            Arity::Range(lo, hi) => n >= lo && n <= hi,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(k) => write!(f, "{k}"),
            Arity::AtLeast(k) => write!(f, "at least {k}"),
            Arity::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

/// Errors raised while evaluating macro bodies (C4) or resolving/applying
/// runtime functions (C3) and user macros (C5). Fatal for the enclosing
/// top-level form; sibling top-level forms are unaffected.
#[derive(Error, Debug, Clone)]
pub enum MacroError {
    #[error("{function}: expected {expected} argument{}, got {actual}", if expected.to_string() == "1" { "" } else { "s" })]
    Arity {
        function: String,
        expected: Arity,
        actual: usize,
    },

    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    #[error("value is not callable: {0}")]
    NotCallable(String),

    #[error("recur used outside of a fn")]
    RecurOutsideFn,

    #[error("reduce: called on an empty collection with no initial value")]
    ReduceEmptyNoInit,

    #[error("malformed defmacro: {0}")]
    MalformedDefmacro(String),

    #[error("unquote-splicing used outside of a list or vector position")]
    SplicingOutOfContext,

    #[error("{0}")]
    Custom(String),
}

impl MacroError {
    pub fn arity(function: &str, expected: Arity, actual: usize) -> Self {
        MacroError::Arity {
            function: function.to_string(),
            expected,
            actual,
        }
    }

    pub fn type_mismatch(function: &str, expected: &str, actual: &str, position: usize) -> Self {
        MacroError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            position,
        }
    }
}

/// A single reported cycle in the namespace dependency graph, e.g. `a -> b -> c -> a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle(pub Vec<String>);

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Returned (not thrown) by the dependency resolver (C6) when the namespace
/// graph is not a DAG.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency cycle(s) detected: {}", cycles.iter().map(|c| c.to_string()).collect::<Vec<_>>().join("; "))]
pub struct DependencyError {
    pub cycles: Vec<Cycle>,
}

/// Misuse of a transient builder: mutating after finalization, or finalizing twice.
/// Indicative of a programmer bug in the caller, not recoverable data.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    #[error("transient used after it was persisted")]
    UsedAfterPersist,
    #[error("transient persisted more than once")]
    DoublePersist,
}

/// Umbrella error for callers that don't need to distinguish the four kinds.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error(transparent)]
    Macro(#[from] MacroError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Transient(#[from] TransientError),
}
