//! Error types for construction-time misuse.
//!
//! Per-frame calls (sampling, mixer updates, keyframe edits) never return these;
//! they log and fall back instead.

use cadence_api_core::{PathError, ValueKind};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum AnimationError {
    #[error("unknown easing: {name}")]
    UnknownEasing { name: String },

    #[error("unknown interpolation mode: {name}")]
    UnknownInterpolation { name: String },

    /// `times` and `values` differ in length
    #[error("track '{track}' has {times} times but {values} values")]
    LengthMismatch {
        track: String,
        times: usize,
        values: usize,
    },

    #[error("track '{track}' mixes value kinds: expected {expected:?}, found {found:?}")]
    MixedValueKinds {
        track: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("track '{track}' has a non-finite keyframe time at index {index}")]
    NonFiniteTime { track: String, index: usize },

    /// A serialized value could not be decoded into the declared shape
    #[error("track '{track}': {reason}")]
    InvalidValue { track: String, reason: String },

    #[error("clip already registered: {name}")]
    ClipAlreadyRegistered { name: String },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnimationError>;
