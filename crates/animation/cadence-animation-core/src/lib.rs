//! Cadence Animation Core (engine-agnostic)
//!
//! Keyframe tracks and clips, standalone clip playback, and a mixer that runs
//! several clip actions at once and blends them into one [`WriteBatch`] per
//! frame. Hosts apply that batch to whatever object they animate through the
//! [`AnimationTarget`] contract.
//!
//! ```
//! use cadence_animation_core::{
//!     ActionOptions, AnimationClip, AnimationMixer, InterpolationMode, KeyframeTrack, Value,
//! };
//!
//! let track = KeyframeTrack::new(
//!     "opacity",
//!     vec![0.0, 1.0],
//!     vec![Value::Scalar(0.0), Value::Scalar(1.0)],
//!     InterpolationMode::Linear,
//! )
//! .unwrap();
//! let clip = AnimationClip::new("fade", 1.0).with_track(track);
//!
//! let mut mixer = AnimationMixer::default();
//! mixer.add_clip(clip, ActionOptions::default()).unwrap();
//! let out = mixer.update(0.5);
//! assert_eq!(out.changes.get("opacity"), Some(&Value::Scalar(0.5)));
//! ```

pub mod accumulate;
pub mod action;
pub mod clip;
pub mod config;
pub mod error;
pub mod interp;
pub mod mixer;
pub mod playback;
pub mod serialized;
pub mod track;

pub use accumulate::Accumulator;
pub use action::AnimationAction;
pub use clip::{AnimationClip, ClipSettings, PropertyMap};
pub use config::{ActionOptions, ActionSettings, BlendMode, MixerOptions};
pub use error::AnimationError;
pub use interp::{ease_in_out, Easing, InterpolationMode, Kernel};
pub use mixer::{AnimationMixer, MixerEvent, MixerOutputs, WeightTween};
pub use playback::{ClipPlayer, PlaybackEvent, PlaybackState, Playhead};
pub use serialized::{SerializedClip, SerializedTrack, SerializedValue};
pub use track::{KeyframeTrack, SegmentCursor};

pub use cadence_api_core::{
    AnimationTarget, PropertyPath, PropertyTree, Value, ValueKind, WriteBatch, WriteOp,
};
