//! JSON shapes for tracks and clips, and conversion to/from the runtime types.
//!
//! Track:
//!   { "name": "position", "times": [0, 1], "values": [[0,0,0], [1,2,3]],
//!     "type": "linear", "easing": "linear", "valueSize": 3, "length": 2 }
//!
//! An optional `"valueKind"` pins the decoded kind where the values alone are
//! ambiguous: `"Quat"` for quaternions on a non-`quaternion` track, `"Opaque"`
//! for tracks whose payloads are arbitrary JSON.
//!
//! Clip:
//!   { "name": "move", "duration": 2, "tracks": [...], "loop": false,
//!     "timeScale": 1, "fadeIn": 0, "fadeOut": 0, "weight": 1,
//!     "blendMode": "normal", "easing": "linear" }
//!
//! Values are plain numbers (scalars), 2/3/4-element arrays (vectors; a
//! 4-element array on a `quaternion` track is a quaternion) or any other JSON
//! (opaque). Unknown `type`, `easing` or `blendMode` names fall back to the
//! defaults with a warning. A track without `easing` inherits the clip's.

use serde::{Deserialize, Serialize};

use cadence_api_core::{Value, ValueKind};

use crate::clip::{AnimationClip, ClipSettings};
use crate::config::BlendMode;
use crate::error::{AnimationError, Result};
use crate::interp::{Easing, InterpolationMode};
use crate::track::KeyframeTrack;

/// One serialized keyframe value.
///
/// Untagged, so an opaque payload that happens to be a number or a numeric
/// array parses as `Number`/`Array`. Tracks carrying `valueKind: "Opaque"`
/// turn those back into opaque values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedValue {
    Number(f32),
    Array(Vec<f32>),
    Other(serde_json::Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTrack {
    pub name: String,
    pub times: Vec<f32>,
    pub values: Vec<SerializedValue>,
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_kind: Option<ValueKind>,
    #[serde(default)]
    pub value_size: usize,
    #[serde(default)]
    pub length: usize,
}

fn default_type() -> String {
    InterpolationMode::Linear.as_str().to_string()
}

fn default_one() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedClip {
    pub name: String,
    /// Seconds; derived from the tracks when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
    #[serde(default)]
    pub tracks: Vec<SerializedTrack>,
    #[serde(rename = "loop", default, skip_serializing_if = "Option::is_none")]
    pub loop_mode: Option<bool>,
    #[serde(default = "default_one")]
    pub time_scale: f32,
    #[serde(default)]
    pub fade_in: f32,
    #[serde(default)]
    pub fade_out: f32,
    #[serde(default = "default_one")]
    pub weight: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}

fn parse_mode(track: &str, name: &str) -> InterpolationMode {
    name.parse().unwrap_or_else(|err| {
        log::warn!("track '{track}': {err}, using linear");
        InterpolationMode::Linear
    })
}

fn parse_easing(owner: &str, name: &str) -> Easing {
    name.parse().unwrap_or_else(|err| {
        log::warn!("'{owner}': {err}, using linear");
        Easing::Linear
    })
}

fn encode_value(value: &Value) -> SerializedValue {
    match value {
        Value::Scalar(v) => SerializedValue::Number(*v),
        Value::Opaque(v) => SerializedValue::Other(v.clone()),
        numeric => {
            SerializedValue::Array(numeric.components().map(<[f32]>::to_vec).unwrap_or_default())
        }
    }
}

fn opaque_payload(value: &SerializedValue) -> serde_json::Value {
    match value {
        SerializedValue::Number(v) => serde_json::Value::from(f64::from(*v)),
        SerializedValue::Array(items) => items.iter().map(|v| f64::from(*v)).collect(),
        SerializedValue::Other(v) => v.clone(),
    }
}

fn decode_value(
    track: &str,
    value: &SerializedValue,
    mode: InterpolationMode,
    value_kind: Option<ValueKind>,
    value_size: usize,
) -> Result<Value> {
    let invalid = |reason: String| AnimationError::InvalidValue {
        track: track.to_string(),
        reason,
    };
    if value_kind == Some(ValueKind::Opaque) {
        return Ok(Value::Opaque(opaque_payload(value)));
    }
    let quat = mode == InterpolationMode::Quaternion || value_kind == Some(ValueKind::Quat);
    match value {
        SerializedValue::Number(v) => Ok(Value::Scalar(*v)),
        SerializedValue::Other(v) => Ok(Value::Opaque(v.clone())),
        SerializedValue::Array(items) => {
            if value_size != 0 && items.len() != value_size {
                return Err(invalid(format!(
                    "value has {} components, valueSize is {value_size}",
                    items.len()
                )));
            }
            let kind = match items.len() {
                2 => ValueKind::Vec2,
                3 => ValueKind::Vec3,
                4 if quat => ValueKind::Quat,
                4 => ValueKind::Vec4,
                n => return Err(invalid(format!("unsupported vector size {n}"))),
            };
            Value::with_components(kind, items).ok_or_else(|| invalid("bad components".into()))
        }
    }
}

impl KeyframeTrack {
    /// Serialized form of this track.
    pub fn to_json(&self) -> SerializedTrack {
        SerializedTrack {
            name: self.name().to_string(),
            times: self.times().to_vec(),
            values: self.values().iter().map(encode_value).collect(),
            kind: self.mode().as_str().to_string(),
            easing: Some(self.easing().as_str().to_string()),
            value_kind: self.kind().filter(|kind| match kind {
                ValueKind::Quat => self.mode() != InterpolationMode::Quaternion,
                ValueKind::Opaque => true,
                _ => false,
            }),
            value_size: self.kind().map(ValueKind::arity).unwrap_or(0),
            length: self.len(),
        }
    }

    /// Build a track from its serialized form. A missing easing means linear.
    pub fn from_json(data: &SerializedTrack) -> Result<Self> {
        Self::from_serialized(data, Easing::Linear)
    }

    pub(crate) fn from_serialized(
        data: &SerializedTrack,
        default_easing: Easing,
    ) -> Result<Self> {
        let mode = parse_mode(&data.name, &data.kind);
        let easing = data
            .easing
            .as_deref()
            .map(|e| parse_easing(&data.name, e))
            .unwrap_or(default_easing);
        if data.length != 0 && data.length != data.times.len() {
            log::warn!(
                "track '{}': length {} disagrees with {} times",
                data.name,
                data.length,
                data.times.len()
            );
        }
        let values = data
            .values
            .iter()
            .map(|v| decode_value(&data.name, v, mode, data.value_kind, data.value_size))
            .collect::<Result<Vec<_>>>()?;
        let track = KeyframeTrack::new(data.name.clone(), data.times.clone(), values, mode)?;
        Ok(track.with_easing(easing))
    }
}

impl AnimationClip {
    /// Serialized form of this clip.
    pub fn to_json(&self) -> SerializedClip {
        let settings = self.settings();
        SerializedClip {
            name: self.name().to_string(),
            duration: Some(self.duration()),
            tracks: self.tracks().iter().map(KeyframeTrack::to_json).collect(),
            loop_mode: settings.loop_mode,
            time_scale: settings.time_scale,
            fade_in: settings.fade_in,
            fade_out: settings.fade_out,
            weight: settings.weight,
            blend_mode: settings.blend_mode.map(|m| m.as_str().to_string()),
            easing: Some(settings.easing.as_str().to_string()),
        }
    }

    /// Build a clip from its serialized form.
    pub fn from_data(data: &SerializedClip) -> Result<Self> {
        let easing = data
            .easing
            .as_deref()
            .map(|e| parse_easing(&data.name, e))
            .unwrap_or_default();
        let blend_mode = data.blend_mode.as_deref().map(|m| {
            m.parse::<BlendMode>().unwrap_or_else(|err| {
                log::warn!("clip '{}': {err}, using normal", data.name);
                BlendMode::Normal
            })
        });

        let tracks = data
            .tracks
            .iter()
            .map(|t| KeyframeTrack::from_serialized(t, easing))
            .collect::<Result<Vec<_>>>()?;

        let mut clip = match data.duration {
            Some(duration) => {
                let mut clip = AnimationClip::new(data.name.clone(), duration);
                for track in tracks {
                    clip.add_track(track);
                }
                clip
            }
            None => AnimationClip::from_tracks(data.name.clone(), tracks),
        };
        *clip.settings_mut() = ClipSettings {
            loop_mode: data.loop_mode,
            time_scale: data.time_scale,
            weight: data.weight.clamp(0.0, 1.0),
            fade_in: data.fade_in.max(0.0),
            fade_out: data.fade_out.max(0.0),
            blend_mode,
            easing,
        };
        Ok(clip)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let data: SerializedClip = serde_json::from_str(s)?;
        Self::from_data(&data)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json())?)
    }
}
