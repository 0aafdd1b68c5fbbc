// ABOUTME: Interned keyword table — two equal keywords are the identical Rc allocation

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct KeywordData {
    pub namespace: Option<String>,
    pub name: String,
}

/// An interned keyword. Identity (`Rc::ptr_eq`) is the required fast path for
/// equality; the intern table guarantees it is also sufficient.
#[derive(Debug, Clone)]
pub struct Keyword(pub Rc<KeywordData>);

impl Keyword {
    pub fn namespace(&self) -> Option<&str> {
        self.0.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Keyword {}

impl std::hash::Hash for Keyword {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.namespace() {
            Some(ns) => write!(f, ":{}/{}", ns, self.name()),
            None => write!(f, ":{}", self.name()),
        }
    }
}

type InternKey = (Option<String>, String);

/// Process-wide keyword intern table. Holds `Arc`, not `Rc` — `Rc` isn't
/// `Send`/`Sync` so it cannot live in a `static`. This table only agrees on
/// the *content* of each interned keyword across threads; the `ptr_eq`
/// identity guarantee is provided per-thread by `LOCAL` below.
static TABLE: std::sync::OnceLock<Mutex<HashMap<InternKey, Arc<KeywordData>>>> =
    std::sync::OnceLock::new();

thread_local! {
    // Each thread keeps its own Rc cache seeded from the canonical table,
    // re-interning lazily. ptr_eq is therefore valid *within* a thread, which
    // is the guarantee the core's single-threaded evaluator relies on; two
    // threads interning the same keyword get distinct Rc allocations with
    // equal contents, not the same allocation.
    static LOCAL: std::cell::RefCell<HashMap<InternKey, Rc<KeywordData>>> =
        std::cell::RefCell::new(HashMap::new());
}

fn canonical_table() -> &'static Mutex<HashMap<InternKey, Arc<KeywordData>>> {
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Intern a keyword by (optional namespace, name). Returns the canonical
/// `Keyword` for that pair; repeated calls on the same thread with equal
/// arguments return pointer-identical values.
pub fn intern(namespace: Option<&str>, name: &str) -> Keyword {
    let key: InternKey = (namespace.map(|s| s.to_string()), name.to_string());

    if let Some(existing) = LOCAL.with(|l| l.borrow().get(&key).cloned()) {
        return Keyword(existing);
    }

    {
        let mut guard = canonical_table().lock().unwrap();
        guard.entry(key.clone()).or_insert_with(|| {
            Arc::new(KeywordData {
                namespace: key.0.clone(),
                name: key.1.clone(),
            })
        });
    }

    let data = Rc::new(KeywordData {
        namespace: key.0.clone(),
        name: key.1.clone(),
    });
    LOCAL.with(|l| l.borrow_mut().insert(key, data.clone()));
    Keyword(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_identity_stable() {
        let a = intern(None, "foo");
        let b = intern(None, "foo");
        assert!(Rc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn namespaced_keywords_distinct_from_bare() {
        let a = intern(None, "foo");
        let b = intern(Some("ns"), "foo");
        assert_ne!(a, b);
    }

    #[test]
    fn display_format() {
        let a = intern(None, "foo");
        assert_eq!(format!("{a}"), ":foo");
        let b = intern(Some("ns"), "bar");
        assert_eq!(format!("{b}"), ":ns/bar");
    }
}
