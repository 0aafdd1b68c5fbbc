// ABOUTME: Unified seq abstraction — tagged union over the collection kinds, not dynamic dispatch

use super::{PList, PMap, PSet, PVector, Value};
use std::rc::Rc;

/// A cursor over any collection. `rest` always returns a `Seq` (possibly
/// `Empty`); `next` returns `None` exactly when there is nothing left to
/// iterate, matching the "empty seq vs. no seq" contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Seq {
    Empty,
    List(PList),
    VectorSeq(PVector, usize),
    /// A snapshot entry list, used for map/set seqs: built once in O(n) at
    /// `seq()` time (Clojure-style "lazy" here just means cheap prepend, not
    /// true deferred computation — see the entries in the prepend/Cons case).
    Entries(PList),
    Cons(Rc<Value>, Box<Seq>),
}

impl Seq {
    pub fn from_list(l: PList) -> Self {
        if l.is_empty() {
            Seq::Empty
        } else {
            Seq::List(l)
        }
    }

    pub fn from_vector(v: PVector) -> Self {
        if v.is_empty() {
            Seq::Empty
        } else {
            Seq::VectorSeq(v, 0)
        }
    }

    pub fn from_map_entries(m: &PMap) -> Self {
        let entries: PList = PList::from_vec(
            m.iter()
                .map(|(k, v)| {
                    Value::Vector(PVector::from_vec(vec![k.clone(), v.clone()]))
                })
                .collect(),
        );
        Self::from_list(entries)
    }

    pub fn from_set_entries(s: &PSet) -> Self {
        let entries: PList = PList::from_vec(s.iter().cloned().collect());
        Self::from_list(entries)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Seq::Empty)
    }

    pub fn first(&self) -> Option<Value> {
        match self {
            Seq::Empty => None,
            Seq::List(l) => l.first().cloned(),
            Seq::VectorSeq(v, i) => v.nth(*i).cloned(),
            Seq::Entries(l) => l.first().cloned(),
            Seq::Cons(head, _) => Some((**head).clone()),
        }
    }

    /// Always returns a `Seq`; `Empty` when there is nothing more.
    pub fn rest(&self) -> Seq {
        match self {
            Seq::Empty => Seq::Empty,
            Seq::List(l) => Seq::from_list(l.rest()),
            Seq::VectorSeq(v, i) => {
                if i + 1 >= v.count() {
                    Seq::Empty
                } else {
                    Seq::VectorSeq(v.clone(), i + 1)
                }
            }
            Seq::Entries(l) => Seq::from_list(l.rest()).map_to_entries(),
            Seq::Cons(_, rest) => (**rest).clone(),
        }
    }

    /// `None` signals "no more seq" (the empty-continuation signal);
    /// `Some(Empty)` never occurs — `next` collapses that into `None`.
    pub fn next(&self) -> Option<Seq> {
        let r = self.rest();
        if r.is_empty() {
            None
        } else {
            Some(r)
        }
    }

    pub fn cons(self, v: Value) -> Seq {
        Seq::Cons(Rc::new(v), Box::new(self))
    }

    fn map_to_entries(self) -> Seq {
        match self {
            Seq::List(l) => Seq::Entries(l),
            other => other,
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        let mut out = Vec::new();
        let mut cur = self;
        while let Some(v) = cur.first() {
            out.push(v);
            cur = cur.rest();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_yields_empty_seq_not_none() {
        let v = Value::List(PList::new());
        let s = v.seq();
        assert!(s.is_empty());
        assert_eq!(s.first(), None);
    }

    #[test]
    fn next_signals_end_with_none() {
        let v = Value::List(PList::from_vec(vec![Value::Int(1)]));
        let s = v.seq();
        assert_eq!(s.first(), Some(Value::Int(1)));
        assert_eq!(s.next(), None);
        assert!(s.rest().is_empty());
    }

    #[test]
    fn vector_seq_walks_in_order() {
        let v = Value::Vector(PVector::from_vec(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
        ]));
        let collected = v.seq().into_vec();
        assert_eq!(
            collected,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn cons_prepends_without_touching_source() {
        let base = Value::List(PList::from_vec(vec![Value::Int(2), Value::Int(3)])).seq();
        let extended = base.clone().cons(Value::Int(1));
        assert_eq!(extended.into_vec(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(base.into_vec(), vec![Value::Int(2), Value::Int(3)]);
    }
}
