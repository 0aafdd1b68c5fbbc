// ABOUTME: Persistent hash map (im::HashMap) plus its single-owner transient builder

use super::Value;
use crate::error::TransientError;
use im::HashMap as ImHashMap;

#[derive(Debug, Clone, Default)]
pub struct PMap(ImHashMap<Value, Value>);

impl PMap {
    pub fn new() -> Self {
        PMap(ImHashMap::new())
    }

    pub fn assoc(&self, k: Value, v: Value) -> Self {
        let mut new = self.0.clone();
        new.insert(k, v);
        PMap(new)
    }

    pub fn dissoc(&self, k: &Value) -> Self {
        let mut new = self.0.clone();
        new.remove(k);
        PMap(new)
    }

    pub fn get(&self, k: &Value) -> Option<&Value> {
        self.0.get(k)
    }

    pub fn contains(&self, k: &Value) -> bool {
        self.0.contains_key(k)
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> im::hashmap::Iter<'_, Value, Value> {
        self.0.iter()
    }

    pub fn transient(&self) -> TransientMap {
        TransientMap {
            inner: self.0.clone(),
            finalized: false,
        }
    }
}

impl PartialEq for PMap {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for PMap {}

impl std::hash::Hash for PMap {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Order-independent: fold entry hashes with XOR so map equality implies hash equality.
        self.0.len().hash(state);
        let mut acc: u64 = 0;
        for (k, v) in self.0.iter() {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut h);
            v.hash(&mut h);
            acc ^= std::hash::Hasher::finish(&h);
        }
        acc.hash(state);
    }
}

impl FromIterator<(Value, Value)> for PMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        PMap(iter.into_iter().collect())
    }
}

pub struct TransientMap {
    inner: ImHashMap<Value, Value>,
    finalized: bool,
}

impl TransientMap {
    pub fn assoc(&mut self, k: Value, v: Value) -> Result<(), TransientError> {
        if self.finalized {
            return Err(TransientError::UsedAfterPersist);
        }
        self.inner.insert(k, v);
        Ok(())
    }

    pub fn dissoc(&mut self, k: &Value) -> Result<(), TransientError> {
        if self.finalized {
            return Err(TransientError::UsedAfterPersist);
        }
        self.inner.remove(k);
        Ok(())
    }

    pub fn persist(&mut self) -> Result<PMap, TransientError> {
        if self.finalized {
            return Err(TransientError::DoublePersist);
        }
        self.finalized = true;
        Ok(PMap(std::mem::take(&mut self.inner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assoc_get_dissoc() {
        let m = PMap::new().assoc(Value::string("a"), Value::Int(1));
        assert_eq!(m.get(&Value::string("a")), Some(&Value::Int(1)));
        let m2 = m.dissoc(&Value::string("a"));
        assert!(!m2.contains(&Value::string("a")));
        assert!(m.contains(&Value::string("a")));
    }

    #[test]
    fn get_finds_an_entry_keyed_by_a_cross_width_equal_number() {
        let m = PMap::new().assoc(Value::Int(1), Value::string("a"));
        assert_eq!(m.get(&Value::Float(1.0)), Some(&Value::string("a")));
        assert!(m.contains(&Value::Float(1.0)));
    }

    #[test]
    fn transient_round_trip() {
        let m = PMap::new();
        let mut t = m.transient();
        t.assoc(Value::Int(1), Value::Int(2)).unwrap();
        let persisted = t.persist().unwrap();
        assert_eq!(persisted.count(), 1);
        assert_eq!(m.count(), 0);
    }
}
