//! Keyframe tracks: one property's keyframes plus how to interpolate them.
//!
//! Model:
//! - `times` and `values` are parallel and kept sorted by time (stable, so equal
//!   times keep insertion order).
//! - A track is homogeneous in value kind. The kind is fixed by the first
//!   keyframe and the interpolation kernel is resolved from (mode, kind) once.
//! - Queries below the first key return the first value, queries at or past the
//!   last key return the last value. A single keyframe is returned for any time.
//!
//! Segment lookup can reuse a [`SegmentCursor`] owned by the caller. The cursor
//! only remembers a segment index and is checked against the live key times on
//! every query, so edits never produce stale samples.

use cadence_api_core::{PropertyPath, Value, ValueKind};

use crate::error::{AnimationError, Result};
use crate::interp::{Easing, InterpolationMode, Kernel};

/// Remembers the segment used by the previous query on one track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SegmentCursor {
    segment: Option<usize>,
}

impl SegmentCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment index resolved by the last interior query.
    pub fn segment(&self) -> Option<usize> {
        self.segment
    }

    pub fn reset(&mut self) {
        self.segment = None;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeTrack {
    name: String,
    path: PropertyPath,
    times: Vec<f32>,
    values: Vec<Value>,
    mode: InterpolationMode,
    easing: Easing,
    kind: Option<ValueKind>,
    kernel: Kernel,
}

impl KeyframeTrack {
    /// Build a track from parallel `times`/`values`. Keys are sorted by time.
    pub fn new(
        name: impl Into<String>,
        times: Vec<f32>,
        values: Vec<Value>,
        mode: InterpolationMode,
    ) -> Result<Self> {
        let name = name.into();
        let path = PropertyPath::parse(&name)?;

        if times.len() != values.len() {
            return Err(AnimationError::LengthMismatch {
                track: name,
                times: times.len(),
                values: values.len(),
            });
        }
        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(AnimationError::NonFiniteTime { track: name, index });
        }

        let kind = values.first().map(Value::kind);
        if let Some(expected) = kind {
            if let Some(found) = values.iter().map(Value::kind).find(|k| *k != expected) {
                return Err(AnimationError::MixedValueKinds {
                    track: name,
                    expected,
                    found,
                });
            }
        }

        let mut track = Self {
            name,
            path,
            times,
            values,
            mode,
            easing: Easing::Linear,
            kind,
            kernel: Kernel::Step,
        };
        track.kernel = track.resolve_kernel();
        track.resort();
        Ok(track)
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    /// Value kind shared by every keyframe; `None` until the first key exists.
    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last keyframe (0 for an empty track).
    pub fn duration_hint(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Sample the track at `time`. `None` only for an empty track.
    pub fn sample(&self, time: f32) -> Option<Value> {
        let mut cursor = SegmentCursor::new();
        self.sample_with_cursor(time, &mut cursor)
    }

    /// Sample reusing (and updating) the caller's segment cursor.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut SegmentCursor) -> Option<Value> {
        let n = self.times.len();
        match n {
            0 => return None,
            1 => return Some(self.values[0].clone()),
            _ => {}
        }
        if time.is_nan() || time < self.times[0] {
            return Some(self.values[0].clone());
        }
        if time >= self.times[n - 1] {
            return Some(self.values[n - 1].clone());
        }

        let i = self.locate(time, cursor);
        let t0 = self.times[i];
        let t1 = self.times[i + 1];
        let span = t1 - t0;
        let local = if span > 0.0 {
            ((time - t0) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = self.easing.apply(local);

        let a = &self.values[i];
        let b = &self.values[i + 1];
        let out = match self.kernel {
            Kernel::Hermite => match (self.tangent(i), self.tangent(i + 1)) {
                (Some(m0), Some(m1)) => {
                    self.kernel.interpolate_with_tangents(a, &m0, b, &m1, eased)
                }
                _ => self.kernel.interpolate(a, b, eased),
            },
            kernel => kernel.interpolate(a, b, eased),
        };
        Some(out)
    }

    /// Find `i` with `times[i] <= time < times[i + 1]`, assuming `time` lies strictly
    /// inside the key range. Tries the cursor's segment and its successor first.
    fn locate(&self, time: f32, cursor: &mut SegmentCursor) -> usize {
        let last_segment = self.times.len() - 2;
        if let Some(prev) = cursor.segment {
            for i in [prev, prev + 1] {
                if i <= last_segment && self.times[i] <= time && time < self.times[i + 1] {
                    cursor.segment = Some(i);
                    return i;
                }
            }
        }
        let upper = self.times.partition_point(|t| *t <= time);
        let i = upper.saturating_sub(1).min(last_segment);
        cursor.segment = Some(i);
        i
    }

    /// Hermite tangent at keyframe `index`: central difference of the neighbouring
    /// values, forward/backward difference at the ends. `None` for opaque tracks
    /// or an out-of-range index.
    pub fn tangent(&self, index: usize) -> Option<Value> {
        let n = self.values.len();
        if index >= n {
            return None;
        }
        let kind = self.kind?;
        if !kind.is_numeric() {
            return None;
        }
        if n == 1 {
            return Value::with_components(kind, &[0.0; 4]);
        }
        let (lo, hi, scale) = if index == 0 {
            (0, 1, 1.0)
        } else if index == n - 1 {
            (n - 2, n - 1, 1.0)
        } else {
            (index - 1, index + 1, 0.5)
        };
        let a = self.values[lo].components()?;
        let b = self.values[hi].components()?;
        let mut out = [0.0f32; 4];
        for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b)) {
            *o = (y - x) * scale;
        }
        Value::with_components(kind, &out)
    }

    /// Insert a keyframe, keeping time order. Rejected (returns false) for a
    /// non-finite time or a value of the wrong kind.
    pub fn add_keyframe(&mut self, time: f32, value: Value) -> bool {
        if !time.is_finite() {
            log::warn!("track '{}': ignoring keyframe at non-finite time", self.name);
            return false;
        }
        if !self.accepts(&value) {
            return false;
        }
        if self.kind.is_none() {
            self.kind = Some(value.kind());
            self.kernel = self.resolve_kernel();
        }
        let at = self.times.partition_point(|t| *t <= time);
        self.times.insert(at, time);
        self.values.insert(at, value);
        true
    }

    pub fn remove_keyframe(&mut self, index: usize) -> bool {
        if index >= self.times.len() {
            log::warn!(
                "track '{}': remove_keyframe index {index} out of range",
                self.name
            );
            return false;
        }
        self.times.remove(index);
        self.values.remove(index);
        true
    }

    /// Replace the value at `index`; the kind must match the track.
    pub fn update_keyframe(&mut self, index: usize, value: Value) -> bool {
        if index >= self.values.len() {
            log::warn!(
                "track '{}': update_keyframe index {index} out of range",
                self.name
            );
            return false;
        }
        if !self.accepts(&value) {
            return false;
        }
        self.values[index] = value;
        true
    }

    /// Move the keyframe at `index` to `time` and re-sort.
    pub fn update_keyframe_time(&mut self, index: usize, time: f32) -> bool {
        if index >= self.times.len() {
            log::warn!(
                "track '{}': update_keyframe_time index {index} out of range",
                self.name
            );
            return false;
        }
        if !time.is_finite() {
            log::warn!("track '{}': ignoring non-finite keyframe time", self.name);
            return false;
        }
        self.times[index] = time;
        self.resort();
        true
    }

    fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            Some(kind) if kind != value.kind() => {
                log::warn!(
                    "track '{}': expected {kind:?} keyframe, got {:?}",
                    self.name,
                    value.kind()
                );
                false
            }
            _ => true,
        }
    }

    fn resolve_kernel(&self) -> Kernel {
        Kernel::select(self.mode, self.kind.unwrap_or(ValueKind::Scalar))
    }

    fn resort(&mut self) {
        if self.times.windows(2).all(|w| w[0] <= w[1]) {
            return;
        }
        let mut order: Vec<usize> = (0..self.times.len()).collect();
        order.sort_by(|a, b| self.times[*a].total_cmp(&self.times[*b]));
        self.times = order.iter().map(|i| self.times[*i]).collect();
        self.values = order.iter().map(|i| self.values[*i].clone()).collect();
    }
}
