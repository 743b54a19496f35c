//! Animation clips: a named, timed bundle of keyframe tracks.

use indexmap::IndexMap;

use cadence_api_core::{PropertyPath, Value};

use crate::config::BlendMode;
use crate::interp::Easing;
use crate::track::{KeyframeTrack, SegmentCursor};

/// Evaluated clip: property path to sampled value, in track insertion order.
pub type PropertyMap = IndexMap<PropertyPath, Value>;

/// Playback defaults carried by a clip. `None` fields defer to the mixer.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipSettings {
    pub loop_mode: Option<bool>,
    pub time_scale: f32,
    pub weight: f32,
    /// Seconds of automatic fade-in when playback starts from stopped.
    pub fade_in: f32,
    /// Seconds of automatic fade-out before a non-looping end.
    pub fade_out: f32,
    pub blend_mode: Option<BlendMode>,
    /// Easing for serialized tracks that do not name one.
    pub easing: Easing,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            loop_mode: None,
            time_scale: 1.0,
            weight: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
            blend_mode: None,
            easing: Easing::Linear,
        }
    }
}

/// A named clip. Its duration is explicit and may differ from the extent of its
/// tracks; sampling past a track's last key holds that key.
///
/// Clips are shared between actions as `Arc<AnimationClip>`. Edit a shared clip
/// through `Arc::make_mut`, which copies it when other actions still hold it.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    tracks: Vec<KeyframeTrack>,
    settings: ClipSettings,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: sanitize_duration(duration),
            tracks: Vec::new(),
            settings: ClipSettings::default(),
        }
    }

    /// Build a clip whose duration is the last key time across `tracks`.
    pub fn from_tracks(name: impl Into<String>, tracks: Vec<KeyframeTrack>) -> Self {
        let duration = tracks
            .iter()
            .map(KeyframeTrack::duration_hint)
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
            settings: ClipSettings::default(),
        }
    }

    pub fn with_track(mut self, track: KeyframeTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn with_settings(mut self, settings: ClipSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = sanitize_duration(duration);
    }

    pub fn settings(&self) -> &ClipSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ClipSettings {
        &mut self.settings
    }

    pub fn add_track(&mut self, track: KeyframeTrack) {
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[KeyframeTrack] {
        &self.tracks
    }

    /// First track named `name`.
    pub fn track(&self, name: &str) -> Option<&KeyframeTrack> {
        self.tracks.iter().find(|t| t.name() == name)
    }

    pub fn track_mut(&mut self, name: &str) -> Option<&mut KeyframeTrack> {
        self.tracks.iter_mut().find(|t| t.name() == name)
    }

    pub fn remove_track(&mut self, name: &str) -> Option<KeyframeTrack> {
        let index = self.tracks.iter().position(|t| t.name() == name)?;
        Some(self.tracks.remove(index))
    }

    /// Sample every track at `time`. When several tracks share a property the
    /// later track wins. Empty tracks contribute nothing.
    pub fn evaluate(&self, time: f32) -> PropertyMap {
        let mut out = PropertyMap::with_capacity(self.tracks.len());
        for track in &self.tracks {
            if let Some(value) = track.sample(time) {
                out.insert(track.path().clone(), value);
            }
        }
        out
    }

    /// Like [`evaluate`](Self::evaluate), reusing one segment cursor per track.
    pub fn evaluate_with_cursors(
        &self,
        time: f32,
        cursors: &mut Vec<SegmentCursor>,
    ) -> PropertyMap {
        if cursors.len() != self.tracks.len() {
            cursors.resize(self.tracks.len(), SegmentCursor::default());
        }
        let mut out = PropertyMap::with_capacity(self.tracks.len());
        for (track, cursor) in self.tracks.iter().zip(cursors.iter_mut()) {
            if let Some(value) = track.sample_with_cursor(time, cursor) {
                out.insert(track.path().clone(), value);
            }
        }
        out
    }
}

fn sanitize_duration(duration: f32) -> f32 {
    if duration.is_finite() && duration >= 0.0 {
        duration
    } else {
        log::warn!("clip duration {duration} is invalid, using 0");
        0.0
    }
}
