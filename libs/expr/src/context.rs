//! Evaluation context
//!
//! A context pairs the value handed to `eval` (the root, fixed for the whole
//! call) with the cursor that navigation nodes act on.

use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Context {
    root: Value,
    current: Value,
}

impl Context {
    /// Start an evaluation with `root` as both root and cursor.
    pub fn new(root: Value) -> Self {
        Self {
            current: root.clone(),
            root,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn current(&self) -> &Value {
        &self.current
    }

    /// A new context sharing this root with `current` as its cursor.
    pub fn next(&self, current: Value) -> Self {
        Self {
            root: self.root.clone(),
            current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_keeps_root_and_leaves_receiver_alone() {
        let ctx = Context::new(Value::Int(1));
        let next = ctx.next(Value::Int(2));

        assert_eq!(next.root(), &Value::Int(1));
        assert_eq!(next.current(), &Value::Int(2));
        assert_eq!(ctx.current(), &Value::Int(1));
    }
}
