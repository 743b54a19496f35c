//! Mixer and action options.
//!
//! Action settings resolve in three layers: explicit [`ActionOptions`] fields,
//! then the clip's own [`ClipSettings`](crate::clip::ClipSettings), then the
//! mixer-wide [`MixerOptions`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clip::ClipSettings;

/// How an action's samples combine with the others writing the same property.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Weighted mean with the other normal-mode actions.
    #[default]
    Normal,
    /// `value * weight` layered on top of the normal-mode result.
    Additive,
}

impl BlendMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Additive => "additive",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(BlendMode::Normal),
            "additive" => Ok(BlendMode::Additive),
            other => Err(format!("unknown blend mode: {other}")),
        }
    }
}

/// Options fixed when a mixer is created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixerOptions {
    /// Global multiplier applied to every `update` delta.
    pub time_scale: f32,
    /// Loop flag for clips that do not set one.
    #[serde(rename = "loop")]
    pub loop_mode: bool,
    /// Blend mode for clips that do not set one.
    pub blend_mode: BlendMode,
    /// A disabled mixer neither advances nor writes.
    pub enabled: bool,
}

impl Default for MixerOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            loop_mode: false,
            blend_mode: BlendMode::Normal,
            enabled: true,
        }
    }
}

/// Per-registration overrides for `AnimationMixer::add_clip`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionOptions {
    #[serde(rename = "loop")]
    pub loop_mode: Option<bool>,
    pub time_scale: Option<f32>,
    pub weight: Option<f32>,
    pub enabled: Option<bool>,
    pub blend_mode: Option<BlendMode>,
    pub fade_in: Option<f32>,
    pub fade_out: Option<f32>,
    /// Start playing immediately after registration.
    pub play: bool,
}

impl Default for ActionOptions {
    fn default() -> Self {
        Self {
            loop_mode: None,
            time_scale: None,
            weight: None,
            enabled: None,
            blend_mode: None,
            fade_in: None,
            fade_out: None,
            play: true,
        }
    }
}

impl ActionOptions {
    pub fn looping(mut self, looping: bool) -> Self {
        self.loop_mode = Some(looping);
        self
    }

    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = Some(time_scale);
        self
    }

    pub fn blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = Some(mode);
        self
    }

    pub fn paused(mut self) -> Self {
        self.play = false;
        self
    }

    /// Collapse the three option layers into concrete action settings.
    pub fn resolve(&self, clip: &ClipSettings, mixer: &MixerOptions) -> ActionSettings {
        ActionSettings {
            looping: self
                .loop_mode
                .or(clip.loop_mode)
                .unwrap_or(mixer.loop_mode),
            time_scale: self.time_scale.unwrap_or(clip.time_scale),
            weight: self.weight.unwrap_or(clip.weight).clamp(0.0, 1.0),
            enabled: self.enabled.unwrap_or(true),
            blend_mode: self
                .blend_mode
                .or(clip.blend_mode)
                .unwrap_or(mixer.blend_mode),
            fade_in: self.fade_in.unwrap_or(clip.fade_in).max(0.0),
            fade_out: self.fade_out.unwrap_or(clip.fade_out).max(0.0),
        }
    }
}

/// Fully resolved settings an action is created with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionSettings {
    pub looping: bool,
    pub time_scale: f32,
    pub weight: f32,
    pub enabled: bool,
    pub blend_mode: BlendMode,
    pub fade_in: f32,
    pub fade_out: f32,
}

impl Default for ActionSettings {
    fn default() -> Self {
        ActionOptions::default().resolve(&ClipSettings::default(), &MixerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_layer_in_order() {
        let mixer = MixerOptions {
            loop_mode: true,
            blend_mode: BlendMode::Additive,
            ..MixerOptions::default()
        };
        let clip = ClipSettings {
            loop_mode: Some(false),
            time_scale: 2.0,
            ..ClipSettings::default()
        };
        let resolved = ActionOptions::default().resolve(&clip, &mixer);
        assert!(!resolved.looping);
        assert_eq!(resolved.time_scale, 2.0);
        assert_eq!(resolved.blend_mode, BlendMode::Additive);
        assert_eq!(resolved.weight, 1.0);

        let resolved = ActionOptions::default()
            .looping(true)
            .weight(3.0)
            .resolve(&clip, &mixer);
        assert!(resolved.looping);
        assert_eq!(resolved.weight, 1.0);
    }

    #[test]
    fn options_from_json() {
        let opts: MixerOptions =
            serde_json::from_str(r#"{ "timeScale": 0.5, "loop": true }"#).unwrap();
        assert_eq!(opts.time_scale, 0.5);
        assert!(opts.loop_mode);
        assert!(opts.enabled);
        assert_eq!(opts.blend_mode, BlendMode::Normal);

        let action: ActionOptions =
            serde_json::from_str(r#"{ "weight": 0.25, "blendMode": "additive" }"#).unwrap();
        assert!(action.play);
        assert_eq!(action.weight, Some(0.25));
        assert_eq!(action.blend_mode, Some(BlendMode::Additive));
    }
}
