//! Error types for paths and targets.

use thiserror::Error;

/// Errors produced while parsing a dot-separated property path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty property path")]
    Empty,
    #[error("invalid property path '{path}': empty segment")]
    EmptySegment { path: String },
    #[error("invalid property path '{path}': segment contains whitespace")]
    Whitespace { path: String },
}

/// Errors produced while writing into an [`AnimationTarget`](crate::AnimationTarget).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("path conflict at '{segment}' in '{path}': expected container, found value")]
    PathConflict { path: String, segment: String },
}
