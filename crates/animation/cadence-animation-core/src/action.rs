//! Runtime playback of one clip inside one mixer.
//!
//! An action owns only playback state: a [`Playhead`], its blend weight and
//! per-track segment cursors. Keyframe data stays in the shared clip. Weight
//! fades are not driven here; the mixer's tween queue writes [`set_weight`].
//!
//! [`set_weight`]: AnimationAction::set_weight

use std::sync::Arc;

use crate::clip::{AnimationClip, PropertyMap};
use crate::config::{ActionSettings, BlendMode};
use crate::playback::{PlaybackEvent, PlaybackState, Playhead};
use crate::track::SegmentCursor;

#[derive(Clone, Debug)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,
    playhead: Playhead,
    weight: f32,
    base_weight: f32,
    enabled: bool,
    blend_mode: BlendMode,
    fade_in: f32,
    fade_out: f32,
    fade_out_armed: bool,
    epoch: u64,
    cursors: Vec<SegmentCursor>,
}

impl AnimationAction {
    pub fn new(clip: Arc<AnimationClip>, settings: ActionSettings) -> Self {
        let track_count = clip.tracks().len();
        Self {
            clip,
            playhead: Playhead::new(settings.time_scale, settings.looping),
            weight: settings.weight,
            base_weight: settings.weight,
            enabled: settings.enabled,
            blend_mode: settings.blend_mode,
            fade_in: settings.fade_in,
            fade_out: settings.fade_out,
            fade_out_armed: false,
            epoch: 0,
            cursors: vec![SegmentCursor::default(); track_count],
        }
    }

    pub fn name(&self) -> &str {
        self.clip.name()
    }

    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    pub fn state(&self) -> PlaybackState {
        self.playhead.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playhead.is_playing()
    }

    pub fn local_time(&self) -> f32 {
        self.playhead.local_time()
    }

    pub fn elapsed(&self) -> f32 {
        self.playhead.elapsed()
    }

    pub fn duration(&self) -> f32 {
        self.clip.duration()
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Set the blend weight directly, clamped to `[0, 1]`. A running fade on this
    /// action overwrites it on the next mixer update.
    pub fn set_weight(&mut self, weight: f32) {
        if weight.is_finite() {
            self.weight = weight.clamp(0.0, 1.0);
        } else {
            log::warn!("action '{}': ignoring non-finite weight", self.name());
        }
    }

    /// Weight the action was configured with; the target of automatic fade-ins.
    pub fn base_weight(&self) -> f32 {
        self.base_weight
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    pub fn time_scale(&self) -> f32 {
        self.playhead.time_scale()
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.playhead.set_time_scale(time_scale);
    }

    pub fn is_looping(&self) -> bool {
        self.playhead.is_looping()
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.playhead.set_looping(looping);
    }

    pub fn fade_in_duration(&self) -> f32 {
        self.fade_in
    }

    pub fn fade_out_duration(&self) -> f32 {
        self.fade_out
    }

    /// Incremented by every explicit stop; fades started before it are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True when this action takes part in the blend pass.
    pub fn contributes(&self) -> bool {
        self.enabled && self.weight > 0.0
    }

    pub fn play(&mut self) -> Option<PlaybackEvent> {
        let event = self.playhead.play();
        if event.is_some() {
            self.fade_out_armed = self.fade_out > 0.0;
        }
        event
    }

    pub fn pause(&mut self) -> Option<PlaybackEvent> {
        self.playhead.pause()
    }

    pub fn resume(&mut self) -> Option<PlaybackEvent> {
        self.playhead.resume()
    }

    /// Rewind, drop the weight to zero and invalidate in-flight fades.
    pub fn stop(&mut self) -> Option<PlaybackEvent> {
        self.weight = 0.0;
        self.epoch = self.epoch.wrapping_add(1);
        self.fade_out_armed = false;
        self.cursors.iter_mut().for_each(SegmentCursor::reset);
        self.playhead.stop()
    }

    /// Advance playback by an already time-scaled mixer delta.
    pub fn update(&mut self, dt: f32) -> Option<PlaybackEvent> {
        self.playhead.advance(dt, self.clip.duration())
    }

    /// Sample the clip at the current local time.
    pub fn evaluate(&mut self) -> PropertyMap {
        self.clip
            .evaluate_with_cursors(self.playhead.local_time(), &mut self.cursors)
    }

    /// Seconds of mixer time left before a non-looping action ends, or `None`
    /// when the action is not heading towards an end.
    pub fn remaining(&self) -> Option<f32> {
        let scale = self.playhead.time_scale();
        if !self.is_playing() || self.is_looping() || scale <= 0.0 {
            return None;
        }
        Some(((self.duration() - self.local_time()) / scale).max(0.0))
    }

    /// Take the pending automatic fade-out, if it is due now.
    pub(crate) fn take_due_fade_out(&mut self) -> Option<f32> {
        if !self.fade_out_armed {
            return None;
        }
        let remaining = self.remaining()?;
        if remaining <= self.fade_out {
            self.fade_out_armed = false;
            Some(remaining)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::InterpolationMode;
    use crate::track::KeyframeTrack;
    use cadence_api_core::{PropertyPath, Value};

    fn action(settings: ActionSettings) -> AnimationAction {
        let track = KeyframeTrack::new(
            "x",
            vec![0.0, 2.0],
            vec![Value::Scalar(0.0), Value::Scalar(20.0)],
            InterpolationMode::Linear,
        )
        .unwrap();
        let clip = AnimationClip::new("ramp", 2.0).with_track(track);
        AnimationAction::new(Arc::new(clip), settings)
    }

    #[test]
    fn stop_resets_time_weight_and_epoch() {
        let mut a = action(ActionSettings::default());
        a.play();
        a.update(0.5);
        assert_eq!(a.local_time(), 0.5);
        assert_eq!(a.stop(), Some(PlaybackEvent::Ended));
        assert_eq!(a.local_time(), 0.0);
        assert_eq!(a.weight(), 0.0);
        assert_eq!(a.epoch(), 1);
        assert!(!a.contributes());
    }

    #[test]
    fn natural_end_keeps_weight() {
        let mut a = action(ActionSettings::default());
        a.play();
        assert_eq!(a.update(3.0), Some(PlaybackEvent::Ended));
        assert_eq!(a.state(), PlaybackState::Stopped);
        assert_eq!(a.weight(), 1.0);
        let x = PropertyPath::parse("x").unwrap();
        assert_eq!(a.evaluate().get(&x), Some(&Value::Scalar(20.0)));
    }

    #[test]
    fn time_scale_speeds_local_time() {
        let mut a = action(ActionSettings {
            time_scale: 2.0,
            ..ActionSettings::default()
        });
        a.play();
        a.update(0.25);
        assert_eq!(a.local_time(), 0.5);
        assert_eq!(a.remaining(), Some(0.75));
    }

    #[test]
    fn fade_out_comes_due_near_the_end() {
        let mut a = action(ActionSettings {
            fade_out: 0.5,
            ..ActionSettings::default()
        });
        a.play();
        a.update(1.0);
        assert_eq!(a.take_due_fade_out(), None);
        a.update(0.5);
        assert_eq!(a.take_due_fade_out(), Some(0.5));
        assert_eq!(a.take_due_fade_out(), None);
    }

    #[test]
    fn set_weight_clamps() {
        let mut a = action(ActionSettings::default());
        a.set_weight(2.0);
        assert_eq!(a.weight(), 1.0);
        a.set_weight(f32::NAN);
        assert_eq!(a.weight(), 1.0);
        a.set_weight(-1.0);
        assert_eq!(a.weight(), 0.0);
    }
}
