//! cadence-api-core: value model, property paths and write batches shared by
//! the animation engine and its hosts (engine-agnostic).

pub mod error;
pub mod path;
pub mod target;
pub mod value;
pub mod write_ops;

pub use error::{PathError, TargetError};
pub use path::PropertyPath;
pub use target::{AnimationTarget, PropertyNode, PropertyTree};
pub use value::{Value, ValueKind};
pub use write_ops::{WriteBatch, WriteOp};
