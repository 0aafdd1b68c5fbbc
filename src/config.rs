// ABOUTME: Plain configuration structs threaded through construction sites, not a settings framework

use std::path::PathBuf;

/// Search roots probed by the dependency resolver's `search_roots` helper.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub search_roots: Vec<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            search_roots: vec![PathBuf::from("."), PathBuf::from("src")],
        }
    }
}

/// Starting point for the macro expander's auto-gensym counter. Left at its
/// default (zero) in normal use; tests that need reproducible generated
/// symbol names can pin it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpanderConfig {
    pub gensym_start: u64,
}
