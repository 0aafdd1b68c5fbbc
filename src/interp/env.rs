// ABOUTME: Arena-allocated lexical frames, referenced by handle to avoid Rc cycles between closures

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(usize);

#[derive(Debug)]
struct Frame {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<FrameHandle>,
}

/// Owns every lexical frame created during one interpreter session. Frames
/// are never individually freed; the whole arena drops at once when the
/// interpreter does, which is what lets closures hold a cheap `Copy` handle
/// instead of an `Rc<Environment>` parent chain.
#[derive(Debug, Default)]
pub struct FrameArena {
    frames: RefCell<Vec<Frame>>,
}

impl FrameArena {
    pub fn new() -> Self {
        FrameArena {
            frames: RefCell::new(Vec::new()),
        }
    }

    pub fn root(&self) -> FrameHandle {
        if self.frames.borrow().is_empty() {
            self.push_frame(None)
        } else {
            FrameHandle(0)
        }
    }

    fn push_frame(&self, parent: Option<FrameHandle>) -> FrameHandle {
        let mut frames = self.frames.borrow_mut();
        frames.push(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent,
        });
        FrameHandle(frames.len() - 1)
    }

    pub fn child_of(&self, parent: FrameHandle) -> FrameHandle {
        self.push_frame(Some(parent))
    }

    pub fn define(&self, frame: FrameHandle, name: impl Into<String>, value: Value) {
        self.frames.borrow()[frame.0]
            .bindings
            .borrow_mut()
            .insert(name.into(), value);
    }

    pub fn get(&self, frame: FrameHandle, name: &str) -> Option<Value> {
        let frames = self.frames.borrow();
        let mut cur = Some(frame);
        while let Some(h) = cur {
            if let Some(v) = frames[h.0].bindings.borrow().get(name) {
                return Some(v.clone());
            }
            cur = frames[h.0].parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_and_parent_lookup() {
        let arena = FrameArena::new();
        let root = arena.root();
        arena.define(root, "x", Value::Int(1));

        let child = arena.child_of(root);
        arena.define(child, "x", Value::Int(2));

        assert_eq!(arena.get(child, "x"), Some(Value::Int(2)));
        assert_eq!(arena.get(root, "x"), Some(Value::Int(1)));
    }

    #[test]
    fn parent_visible_through_child() {
        let arena = FrameArena::new();
        let root = arena.root();
        arena.define(root, "a", Value::Int(1));
        let child = arena.child_of(root);
        assert_eq!(arena.get(child, "a"), Some(Value::Int(1)));
        assert_eq!(arena.get(child, "missing"), None);
    }
}
