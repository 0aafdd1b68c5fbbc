// ABOUTME: Persistent hash set (im::HashSet). No transient builder — only vector and map get one.

use super::Value;
use im::HashSet as ImHashSet;

#[derive(Debug, Clone, Default)]
pub struct PSet(ImHashSet<Value>);

impl PSet {
    pub fn new() -> Self {
        PSet(ImHashSet::new())
    }

    pub fn conj(&self, v: Value) -> Self {
        let mut new = self.0.clone();
        new.insert(v);
        PSet(new)
    }

    pub fn disjoin(&self, v: &Value) -> Self {
        let mut new = self.0.clone();
        new.remove(v);
        PSet(new)
    }

    pub fn contains(&self, v: &Value) -> bool {
        self.0.contains(v)
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> im::hashset::Iter<'_, Value> {
        self.0.iter()
    }
}

impl PartialEq for PSet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for PSet {}

impl std::hash::Hash for PSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        let mut acc: u64 = 0;
        for v in self.0.iter() {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            v.hash(&mut h);
            acc ^= std::hash::Hasher::finish(&h);
        }
        acc.hash(state);
    }
}

impl FromIterator<Value> for PSet {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        PSet(iter.into_iter().collect())
    }
}
