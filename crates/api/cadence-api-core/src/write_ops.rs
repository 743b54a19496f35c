//! Write operations produced by the mixer each tick to describe property
//! writes onto an animation target.
//!
//! WriteOp serializes to JSON as:
//!   { "path": "position.x", "value": { "type": "scalar", "data": 1.0 } }
//!
//! WriteBatch is a simple Vec<WriteOp> with helpers. It is the patch the
//! caller applies to its target; nothing is mutated behind its back.

use crate::{AnimationTarget, PropertyPath, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOp {
    pub path: PropertyPath,
    pub value: Value,
}

impl WriteOp {
    pub fn new(path: PropertyPath, value: Value) -> Self {
        Self { path, value }
    }
}

/// A batch of write operations. The mixer emits one WriteBatch per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch(pub Vec<WriteOp>);

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch(Vec::new())
    }

    pub fn push(&mut self, op: WriteOp) {
        self.0.push(op);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = WriteOp>) {
        self.0.extend(other);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn into_vec(self) -> Vec<WriteOp> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteOp> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last value written to `path` in this batch.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let path = PropertyPath::parse(path).ok()?;
        self.0
            .iter()
            .rev()
            .find(|op| op.path == path)
            .map(|op| &op.value)
    }

    /// Apply every op to `target` in order. Failed writes are logged and skipped;
    /// returns the number of ops that were applied.
    pub fn apply(&self, target: &mut dyn AnimationTarget) -> usize {
        let mut applied = 0;
        for op in &self.0 {
            match target.set_property(&op.path, op.value.clone()) {
                Ok(()) => applied += 1,
                Err(err) => log::warn!("write-back skipped: {err}"),
            }
        }
        applied
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val = serde_json::to_string(&self.value).map_err(|_| fmt::Error)?;
        write!(f, "{{ path: {}, value: {} }}", self.path, val)
    }
}
