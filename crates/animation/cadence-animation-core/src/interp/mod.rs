//! Interpolation modes and the kernel table.
//!
//! A track's mode and value kind are fixed at construction, so the kernel is
//! resolved once there. Combinations a kernel cannot handle degrade to linear
//! (numeric kinds) or to a discrete step (opaque values).

pub mod easing;
pub mod functions;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use cadence_api_core::{Value, ValueKind};

use crate::error::AnimationError;
pub use easing::{ease_in_out, Easing};
use functions::{hermite_value, linear_value, spherical_value, step_value};

/// Interpolation mode requested for a track.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    Step,
    #[default]
    Linear,
    Cubic,
    Quaternion,
}

impl InterpolationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InterpolationMode::Step => "step",
            InterpolationMode::Linear => "linear",
            InterpolationMode::Cubic => "cubic",
            InterpolationMode::Quaternion => "quaternion",
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMode {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "step" => Ok(InterpolationMode::Step),
            "linear" => Ok(InterpolationMode::Linear),
            "cubic" => Ok(InterpolationMode::Cubic),
            "quaternion" => Ok(InterpolationMode::Quaternion),
            other => Err(AnimationError::UnknownInterpolation {
                name: other.to_string(),
            }),
        }
    }
}

/// Concrete interpolation function used by a track.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kernel {
    Step,
    Linear,
    Slerp,
    Hermite,
}

impl Kernel {
    /// Resolve the kernel for a (mode, kind) pair.
    pub fn select(mode: InterpolationMode, kind: ValueKind) -> Kernel {
        if !kind.is_numeric() {
            return Kernel::Step;
        }
        match (mode, kind) {
            (InterpolationMode::Step, _) => Kernel::Step,
            (InterpolationMode::Quaternion, ValueKind::Quat) => Kernel::Slerp,
            (InterpolationMode::Cubic, ValueKind::Vec3) => Kernel::Hermite,
            _ => Kernel::Linear,
        }
    }

    /// Interpolate between two keyframe values. `Hermite` needs tangents; without
    /// them it behaves linearly (see [`Kernel::interpolate_with_tangents`]).
    #[inline]
    pub fn interpolate(self, a: &Value, b: &Value, t: f32) -> Value {
        match self {
            Kernel::Step => step_value(a, b, t),
            Kernel::Linear | Kernel::Hermite => linear_value(a, b, t),
            Kernel::Slerp => spherical_value(a, b, t),
        }
    }

    #[inline]
    pub fn interpolate_with_tangents(
        self,
        a: &Value,
        m0: &Value,
        b: &Value,
        m1: &Value,
        t: f32,
    ) -> Value {
        match self {
            Kernel::Hermite => hermite_value(a, m0, b, m1, t),
            other => other.interpolate(a, b, t),
        }
    }
}
