//! Playback clock shared by standalone clip players and mixer actions.
//!
//! State machine: `Stopped -> Playing <-> Paused -> Stopped`. Transitions report
//! what happened as a [`PlaybackEvent`] instead of calling hooks; callers
//! collect the events and hand them out (see `MixerOutputs::events`).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clip::{AnimationClip, PropertyMap};
use crate::track::SegmentCursor;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Lifecycle notification produced by a playback transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackEvent {
    Started,
    Paused,
    Resumed,
    /// Local time wrapped around the clip duration.
    Looped,
    /// Stopped, either explicitly or by running past a non-looping end.
    Ended,
}

/// Elapsed/local time bookkeeping for one playing clip.
#[derive(Clone, Debug, PartialEq)]
pub struct Playhead {
    state: PlaybackState,
    elapsed: f32,
    local_time: f32,
    time_scale: f32,
    looping: bool,
}

impl Default for Playhead {
    fn default() -> Self {
        Self::new(1.0, false)
    }
}

impl Playhead {
    pub fn new(time_scale: f32, looping: bool) -> Self {
        Self {
            state: PlaybackState::Stopped,
            elapsed: 0.0,
            local_time: 0.0,
            time_scale,
            looping,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Unscaled time accumulated while playing.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Clip-local time used for sampling.
    pub fn local_time(&self) -> f32 {
        self.local_time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        if time_scale.is_finite() {
            self.time_scale = time_scale;
        } else {
            log::warn!("ignoring non-finite time scale");
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Enter `Playing`. Reports `Started` only when coming from `Stopped` or `Paused`.
    /// Playing from `Stopped` rewinds, so a playhead that ran off its end starts over.
    pub fn play(&mut self) -> Option<PlaybackEvent> {
        match self.state {
            PlaybackState::Playing => None,
            PlaybackState::Stopped => {
                self.elapsed = 0.0;
                self.local_time = 0.0;
                self.state = PlaybackState::Playing;
                Some(PlaybackEvent::Started)
            }
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                Some(PlaybackEvent::Started)
            }
        }
    }

    pub fn pause(&mut self) -> Option<PlaybackEvent> {
        match self.state {
            PlaybackState::Playing => {
                self.state = PlaybackState::Paused;
                Some(PlaybackEvent::Paused)
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<PlaybackEvent> {
        match self.state {
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                Some(PlaybackEvent::Resumed)
            }
            _ => None,
        }
    }

    /// Rewind to zero and enter `Stopped`. Reports `Ended` unless already stopped.
    pub fn stop(&mut self) -> Option<PlaybackEvent> {
        let was = self.state;
        self.state = PlaybackState::Stopped;
        self.elapsed = 0.0;
        self.local_time = 0.0;
        (was != PlaybackState::Stopped).then_some(PlaybackEvent::Ended)
    }

    /// Advance by `dt` against a clip of `duration` seconds. No-op unless playing.
    ///
    /// Looping playheads wrap into `[0, duration)` and report `Looped` when the
    /// cycle index changes. Non-looping playheads that run past either end clamp
    /// to it, stop, and report `Ended`; elapsed time is kept until the next
    /// `play` so the final pose can still be inspected.
    pub fn advance(&mut self, dt: f32, duration: f32) -> Option<PlaybackEvent> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        if !dt.is_finite() {
            log::warn!("ignoring non-finite playback delta");
            return None;
        }

        let prev_raw = self.elapsed * self.time_scale;
        self.elapsed += dt;
        let raw = self.elapsed * self.time_scale;

        if self.looping {
            if duration > 0.0 {
                self.local_time = raw.rem_euclid(duration);
                let prev_cycle = (prev_raw / duration).floor();
                let cycle = (raw / duration).floor();
                if cycle != prev_cycle {
                    return Some(PlaybackEvent::Looped);
                }
            } else {
                self.local_time = raw;
            }
            return None;
        }

        if raw > duration || raw < 0.0 {
            self.local_time = raw.clamp(0.0, duration.max(0.0));
            self.state = PlaybackState::Stopped;
            return Some(PlaybackEvent::Ended);
        }
        self.local_time = raw;
        None
    }
}

/// Standalone playback of one clip, independent of any mixer.
#[derive(Clone, Debug)]
pub struct ClipPlayer {
    clip: Arc<AnimationClip>,
    playhead: Playhead,
    cursors: Vec<SegmentCursor>,
    events: Vec<PlaybackEvent>,
}

impl ClipPlayer {
    /// Create a stopped player using the clip's own loop and time-scale settings.
    pub fn new(clip: impl Into<Arc<AnimationClip>>) -> Self {
        let clip = clip.into();
        let settings = clip.settings();
        let playhead = Playhead::new(settings.time_scale, settings.loop_mode.unwrap_or(false));
        Self {
            cursors: vec![SegmentCursor::default(); clip.tracks().len()],
            clip,
            playhead,
            events: Vec::new(),
        }
    }

    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    pub fn state(&self) -> PlaybackState {
        self.playhead.state()
    }

    pub fn local_time(&self) -> f32 {
        self.playhead.local_time()
    }

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub fn playhead_mut(&mut self) -> &mut Playhead {
        &mut self.playhead
    }

    pub fn play(&mut self) {
        self.events.extend(self.playhead.play());
    }

    pub fn pause(&mut self) {
        self.events.extend(self.playhead.pause());
    }

    pub fn resume(&mut self) {
        self.events.extend(self.playhead.resume());
    }

    pub fn stop(&mut self) {
        self.events.extend(self.playhead.stop());
    }

    pub fn update(&mut self, dt: f32) {
        let duration = self.clip.duration();
        self.events.extend(self.playhead.advance(dt, duration));
    }

    /// Sample every track at the current local time.
    pub fn evaluate(&mut self) -> PropertyMap {
        self.clip
            .evaluate_with_cursors(self.playhead.local_time(), &mut self.cursors)
    }

    /// Take the lifecycle events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_reports_start_once() {
        let mut p = Playhead::default();
        assert_eq!(p.play(), Some(PlaybackEvent::Started));
        assert_eq!(p.play(), None);
        assert_eq!(p.pause(), Some(PlaybackEvent::Paused));
        assert_eq!(p.pause(), None);
        assert_eq!(p.play(), Some(PlaybackEvent::Started));
        assert_eq!(p.resume(), None);
    }

    #[test]
    fn paused_playhead_holds_time() {
        let mut p = Playhead::default();
        p.play();
        p.advance(0.25, 1.0);
        p.pause();
        assert_eq!(p.advance(0.5, 1.0), None);
        assert_eq!(p.local_time(), 0.25);
        p.resume();
        p.advance(0.25, 1.0);
        assert_eq!(p.local_time(), 0.5);
    }

    #[test]
    fn looping_wraps_and_reports() {
        let mut p = Playhead::new(1.0, true);
        p.play();
        assert_eq!(p.advance(0.75, 1.0), None);
        assert_eq!(p.advance(0.5, 1.0), Some(PlaybackEvent::Looped));
        assert!((p.local_time() - 0.25).abs() < 1e-6);
        assert!(p.is_playing());
    }

    #[test]
    fn non_looping_ends_and_clamps() {
        let mut p = Playhead::new(2.0, false);
        p.play();
        assert_eq!(p.advance(0.25, 1.0), None);
        assert_eq!(p.local_time(), 0.5);
        assert_eq!(p.advance(0.5, 1.0), Some(PlaybackEvent::Ended));
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert_eq!(p.local_time(), 1.0);
    }

    #[test]
    fn play_after_natural_end_starts_over() {
        let mut p = Playhead::default();
        p.play();
        assert_eq!(p.advance(1.5, 1.0), Some(PlaybackEvent::Ended));
        assert_eq!(p.local_time(), 1.0);
        assert_eq!(p.play(), Some(PlaybackEvent::Started));
        assert_eq!(p.local_time(), 0.0);
        assert_eq!(p.advance(0.25, 1.0), None);
        assert_eq!(p.local_time(), 0.25);
        assert!(p.is_playing());
    }

    #[test]
    fn play_after_pause_keeps_time() {
        let mut p = Playhead::default();
        p.play();
        p.advance(0.5, 1.0);
        p.pause();
        assert_eq!(p.play(), Some(PlaybackEvent::Started));
        assert_eq!(p.local_time(), 0.5);
    }

    #[test]
    fn stop_rewinds() {
        let mut p = Playhead::default();
        p.play();
        p.advance(0.5, 2.0);
        assert_eq!(p.stop(), Some(PlaybackEvent::Ended));
        assert_eq!(p.local_time(), 0.0);
        assert_eq!(p.elapsed(), 0.0);
        assert_eq!(p.stop(), None);
    }

    #[test]
    fn stopped_playhead_does_not_advance() {
        let mut p = Playhead::default();
        assert_eq!(p.advance(1.0, 2.0), None);
        assert_eq!(p.local_time(), 0.0);
    }
}
