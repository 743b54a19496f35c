//! Mixer: owns the actions driving one target and blends them each frame.
//!
//! `update(dt)` order:
//! 1. scale `dt` by the global time scale and advance the mixer clock
//! 2. advance every action (collecting playback events)
//! 3. schedule automatic fade-outs, then advance the weight tweens
//! 4. blend every contributing action into a [`WriteBatch`]
//! 5. invoke the `on_update` callback
//!
//! The mixer never touches the target itself. Callers apply the returned batch,
//! or use [`AnimationMixer::apply_to`].
//!
//! Weight fades have a single driver: the tween queue. A tween remembers the
//! action's stop epoch, so stopping an action cancels its fades.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use cadence_api_core::{AnimationTarget, WriteBatch};

use crate::accumulate::Accumulator;
use crate::action::AnimationAction;
use crate::clip::AnimationClip;
use crate::config::{ActionOptions, MixerOptions};
use crate::error::{AnimationError, Result};
use crate::interp::ease_in_out;
use crate::playback::{PlaybackEvent, PlaybackState};

/// Eased weight transition of one action, timed in mixer time.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightTween {
    pub action: String,
    pub epoch: u64,
    pub from_weight: f32,
    pub to_weight: f32,
    pub start_time: f32,
    pub duration: f32,
}

impl WeightTween {
    /// Eased progress in `[0, 1]` at mixer time `now`.
    pub fn alpha(&self, now: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ease_in_out(((now - self.start_time) / self.duration).clamp(0.0, 1.0))
    }

    pub fn weight_at(&self, now: f32) -> f32 {
        let a = self.alpha(now);
        self.from_weight + (self.to_weight - self.from_weight) * a
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MixerEvent {
    Playback {
        action: String,
        event: PlaybackEvent,
    },
    TweenFinished {
        action: String,
        weight: f32,
    },
}

/// What one `update` produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MixerOutputs {
    #[serde(default)]
    pub changes: WriteBatch,
    #[serde(default)]
    pub events: Vec<MixerEvent>,
}

impl MixerOutputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }
}

type UpdateCallback = Box<dyn FnMut(f32, &MixerOutputs) + Send>;

pub struct AnimationMixer {
    options: MixerOptions,
    actions: IndexMap<String, AnimationAction>,
    tweens: Vec<WeightTween>,
    time: f32,
    time_scale: f32,
    enabled: bool,
    accumulator: Accumulator,
    outputs: MixerOutputs,
    pending: Vec<MixerEvent>,
    on_update: Option<UpdateCallback>,
}

impl fmt::Debug for AnimationMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationMixer")
            .field("time", &self.time)
            .field("time_scale", &self.time_scale)
            .field("enabled", &self.enabled)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("tweens", &self.tweens.len())
            .finish()
    }
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new(MixerOptions::default())
    }
}

impl AnimationMixer {
    pub fn new(options: MixerOptions) -> Self {
        let time_scale = if options.time_scale.is_finite() {
            options.time_scale
        } else {
            1.0
        };
        Self {
            enabled: options.enabled,
            time_scale,
            options,
            actions: IndexMap::new(),
            tweens: Vec::new(),
            time: 0.0,
            accumulator: Accumulator::new(),
            outputs: MixerOutputs::default(),
            pending: Vec::new(),
            on_update: None,
        }
    }

    pub fn options(&self) -> &MixerOptions {
        &self.options
    }

    /// Mixer clock: the sum of scaled update deltas.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        if time_scale.is_finite() {
            self.time_scale = time_scale;
        } else {
            log::warn!("mixer: ignoring non-finite time scale");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_on_update(&mut self, callback: impl FnMut(f32, &MixerOutputs) + Send + 'static) {
        self.on_update = Some(Box::new(callback));
    }

    pub fn clear_on_update(&mut self) {
        self.on_update = None;
    }

    /// Register a clip under its name. Fails if that name is already registered;
    /// use [`replace_clip`](Self::replace_clip) to swap it deliberately.
    pub fn add_clip(
        &mut self,
        clip: impl Into<Arc<AnimationClip>>,
        options: ActionOptions,
    ) -> Result<&mut AnimationAction> {
        let clip = clip.into();
        let name = clip.name().to_string();
        let settings = options.resolve(clip.settings(), &self.options);
        match self.actions.entry(name) {
            Entry::Occupied(o) => Err(AnimationError::ClipAlreadyRegistered {
                name: o.key().clone(),
            }),
            Entry::Vacant(v) => {
                log::debug!("mixer: registered clip '{}'", v.key());
                let action = v.insert(AnimationAction::new(clip, settings));
                if options.play {
                    start_action(action, self.time, &mut self.tweens, &mut self.pending);
                }
                Ok(action)
            }
        }
    }

    /// Register a clip, replacing any action already bound to its name. The old
    /// action's fades are dropped.
    pub fn replace_clip(
        &mut self,
        clip: impl Into<Arc<AnimationClip>>,
        options: ActionOptions,
    ) -> &mut AnimationAction {
        let clip = clip.into();
        let name = clip.name().to_string();
        let settings = options.resolve(clip.settings(), &self.options);
        self.tweens.retain(|t| t.action != name);
        let action = AnimationAction::new(clip, settings);
        let action = match self.actions.entry(name) {
            Entry::Occupied(mut o) => {
                log::debug!("mixer: replaced clip '{}'", o.key());
                o.insert(action);
                o.into_mut()
            }
            Entry::Vacant(v) => v.insert(action),
        };
        if options.play {
            start_action(action, self.time, &mut self.tweens, &mut self.pending);
        }
        action
    }

    /// Unregister a clip, returning its action. The clip itself is untouched.
    pub fn remove_clip(&mut self, name: &str) -> Option<AnimationAction> {
        let removed = self.actions.shift_remove(name);
        if removed.is_some() {
            self.tweens.retain(|t| t.action != name);
            log::debug!("mixer: removed clip '{name}'");
        } else {
            log::warn!("mixer: remove_clip for unknown clip '{name}'");
        }
        removed
    }

    pub fn action(&self, name: &str) -> Option<&AnimationAction> {
        self.actions.get(name)
    }

    pub fn action_mut(&mut self, name: &str) -> Option<&mut AnimationAction> {
        self.actions.get_mut(name)
    }

    /// Actions in registration order.
    pub fn actions(&self) -> impl Iterator<Item = &AnimationAction> {
        self.actions.values()
    }

    /// Tweens still in flight.
    pub fn tweens(&self) -> &[WeightTween] {
        &self.tweens
    }

    /// Start (or restart after stop) the named action.
    pub fn play(&mut self, name: &str) -> bool {
        match self.actions.get_mut(name) {
            Some(action) => {
                start_action(action, self.time, &mut self.tweens, &mut self.pending);
                true
            }
            None => unknown(name, "play"),
        }
    }

    pub fn pause(&mut self, name: &str) -> bool {
        match self.actions.get_mut(name) {
            Some(action) => {
                push_event(&mut self.pending, name, action.pause());
                true
            }
            None => unknown(name, "pause"),
        }
    }

    pub fn resume(&mut self, name: &str) -> bool {
        match self.actions.get_mut(name) {
            Some(action) => {
                push_event(&mut self.pending, name, action.resume());
                true
            }
            None => unknown(name, "resume"),
        }
    }

    /// Stop the named action: rewinds it, zeroes its weight and cancels its fades.
    pub fn stop(&mut self, name: &str) -> bool {
        match self.actions.get_mut(name) {
            Some(action) => {
                push_event(&mut self.pending, name, action.stop());
                self.tweens.retain(|t| t.action != name);
                true
            }
            None => unknown(name, "stop"),
        }
    }

    pub fn stop_all(&mut self) {
        for (name, action) in self.actions.iter_mut() {
            push_event(&mut self.pending, name, action.stop());
        }
        self.tweens.clear();
    }

    /// Ease the action's weight from its current value to 1 over `duration`.
    pub fn fade_in(&mut self, name: &str, duration: f32) -> bool {
        self.fade_to(name, 1.0, duration)
    }

    /// Ease the action's weight from its current value to 0 over `duration`.
    pub fn fade_out(&mut self, name: &str, duration: f32) -> bool {
        self.fade_to(name, 0.0, duration)
    }

    /// Ease the action's weight to `weight` over `duration`, replacing any fade
    /// already running on it.
    pub fn fade_to(&mut self, name: &str, weight: f32, duration: f32) -> bool {
        let Some(action) = self.actions.get(name) else {
            return unknown(name, "fade");
        };
        let tween = WeightTween {
            action: name.to_string(),
            epoch: action.epoch(),
            from_weight: action.weight(),
            to_weight: weight.clamp(0.0, 1.0),
            start_time: self.time,
            duration: duration.max(0.0),
        };
        push_tween(&mut self.tweens, tween);
        true
    }

    /// Transition from `from` to `to` over `duration`: `from` goes 1 -> 0 while
    /// `to` goes 0 -> 1. `to` is started if it is not playing.
    pub fn cross_fade(&mut self, from: &str, to: &str, duration: f32) -> bool {
        if from == to {
            log::warn!("mixer: cross_fade from '{from}' to itself ignored");
            return false;
        }
        let Some(from_epoch) = self.actions.get(from).map(AnimationAction::epoch) else {
            return unknown(from, "cross_fade");
        };
        let Some(action) = self.actions.get_mut(to) else {
            return unknown(to, "cross_fade");
        };
        action.set_weight(0.0);
        if action.state() != PlaybackState::Playing {
            push_event(&mut self.pending, to, action.play());
        }
        let to_epoch = action.epoch();

        let duration = duration.max(0.0);
        push_tween(
            &mut self.tweens,
            WeightTween {
                action: from.to_string(),
                epoch: from_epoch,
                from_weight: 1.0,
                to_weight: 0.0,
                start_time: self.time,
                duration,
            },
        );
        push_tween(
            &mut self.tweens,
            WeightTween {
                action: to.to_string(),
                epoch: to_epoch,
                from_weight: 0.0,
                to_weight: 1.0,
                start_time: self.time,
                duration,
            },
        );
        log::debug!("mixer: cross-fade '{from}' -> '{to}' over {duration}s");
        true
    }

    /// Advance by `dt` seconds and blend. Events raised by control calls since
    /// the previous update are reported here too.
    pub fn update(&mut self, dt: f32) -> &MixerOutputs {
        self.outputs.clear();
        self.outputs.events.append(&mut self.pending);
        if !self.enabled {
            return &self.outputs;
        }

        let dt = if dt.is_finite() {
            dt * self.time_scale
        } else {
            log::warn!("mixer: ignoring non-finite delta");
            0.0
        };
        self.time += dt;

        for (name, action) in self.actions.iter_mut() {
            push_event(&mut self.outputs.events, name, action.update(dt));
        }

        self.schedule_fade_outs();
        self.advance_tweens();

        self.accumulator.clear();
        for action in self.actions.values_mut() {
            if !action.contributes() {
                continue;
            }
            let weight = action.weight();
            let mode = action.blend_mode();
            for (path, value) in action.evaluate() {
                self.accumulator.add(&path, &value, weight, mode);
            }
        }
        self.accumulator.write_into(&mut self.outputs.changes);

        if let Some(callback) = self.on_update.as_mut() {
            callback(dt, &self.outputs);
        }
        &self.outputs
    }

    /// Outputs of the most recent update.
    pub fn outputs(&self) -> &MixerOutputs {
        &self.outputs
    }

    /// Write the most recent blend onto `target`; returns the number of writes applied.
    pub fn apply_to(&self, target: &mut dyn AnimationTarget) -> usize {
        self.outputs.changes.apply(target)
    }

    fn schedule_fade_outs(&mut self) {
        for (name, action) in self.actions.iter_mut() {
            if let Some(remaining) = action.take_due_fade_out() {
                push_tween(
                    &mut self.tweens,
                    WeightTween {
                        action: name.clone(),
                        epoch: action.epoch(),
                        from_weight: action.weight(),
                        to_weight: 0.0,
                        start_time: self.time,
                        duration: remaining,
                    },
                );
            }
        }
    }

    fn advance_tweens(&mut self) {
        let now = self.time;
        let actions = &mut self.actions;
        let events = &mut self.outputs.events;
        self.tweens.retain(|tween| {
            let Some(action) = actions.get_mut(&tween.action) else {
                return false;
            };
            if action.epoch() != tween.epoch {
                log::debug!("mixer: dropping stale fade on '{}'", tween.action);
                return false;
            }
            action.set_weight(tween.weight_at(now));
            if tween.alpha(now) >= 1.0 {
                events.push(MixerEvent::TweenFinished {
                    action: tween.action.clone(),
                    weight: action.weight(),
                });
                return false;
            }
            true
        });
    }
}

/// Play `action`; an automatic fade-in ramps it from 0 when starting from stopped.
fn start_action(
    action: &mut AnimationAction,
    now: f32,
    tweens: &mut Vec<WeightTween>,
    events: &mut Vec<MixerEvent>,
) {
    let was_stopped = action.state() == PlaybackState::Stopped;
    let event = action.play();
    if was_stopped && action.fade_in_duration() > 0.0 {
        action.set_weight(0.0);
        push_tween(
            tweens,
            WeightTween {
                action: action.name().to_string(),
                epoch: action.epoch(),
                from_weight: 0.0,
                to_weight: action.base_weight(),
                start_time: now,
                duration: action.fade_in_duration(),
            },
        );
    }
    let name = action.name().to_string();
    push_event(events, &name, event);
}

/// Queue `tween`, replacing any tween already driving the same action.
fn push_tween(tweens: &mut Vec<WeightTween>, tween: WeightTween) {
    tweens.retain(|t| t.action != tween.action);
    log::debug!(
        "mixer: fade '{}' {} -> {} over {}s",
        tween.action,
        tween.from_weight,
        tween.to_weight,
        tween.duration
    );
    tweens.push(tween);
}

fn push_event(events: &mut Vec<MixerEvent>, action: &str, event: Option<PlaybackEvent>) {
    if let Some(event) = event {
        events.push(MixerEvent::Playback {
            action: action.to_string(),
            event,
        });
    }
}

fn unknown(name: &str, op: &str) -> bool {
    log::warn!("mixer: {op} for unknown clip '{name}'");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::InterpolationMode;
    use crate::track::KeyframeTrack;
    use cadence_api_core::Value;

    fn constant(name: &str, value: f32) -> AnimationClip {
        let track = KeyframeTrack::new(
            "x",
            vec![0.0],
            vec![Value::Scalar(value)],
            InterpolationMode::Linear,
        )
        .unwrap();
        AnimationClip::new(name, 10.0).with_track(track)
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut mixer = AnimationMixer::default();
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        let err = mixer.add_clip(constant("a", 2.0), ActionOptions::default());
        assert!(matches!(err, Err(AnimationError::ClipAlreadyRegistered { .. })));

        mixer.replace_clip(constant("a", 2.0), ActionOptions::default());
        let out = mixer.update(0.1);
        assert_eq!(out.changes.get("x"), Some(&Value::Scalar(2.0)));
    }

    #[test]
    fn control_events_are_reported_on_next_update() {
        let mut mixer = AnimationMixer::default();
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        mixer.play("a");
        let events = mixer.update(0.0).events.clone();
        assert_eq!(
            events,
            vec![MixerEvent::Playback {
                action: "a".into(),
                event: PlaybackEvent::Started
            }]
        );
        assert!(mixer.update(0.0).events.is_empty());
        assert!(!mixer.play("missing"));
    }

    #[test]
    fn new_fade_replaces_old_one() {
        let mut mixer = AnimationMixer::default();
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        mixer.fade_out("a", 1.0);
        mixer.update(0.5);
        mixer.fade_in("a", 1.0);
        assert_eq!(mixer.tweens().len(), 1);
        assert_eq!(mixer.tweens()[0].to_weight, 1.0);
        assert_eq!(mixer.tweens()[0].from_weight, 0.5);
    }

    #[test]
    fn stop_cancels_fade() {
        let mut mixer = AnimationMixer::default();
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        mixer.fade_out("a", 1.0);
        mixer.update(0.25);
        mixer.stop("a");
        assert!(mixer.tweens().is_empty());
        mixer.update(0.25);
        assert_eq!(mixer.action("a").unwrap().weight(), 0.0);
    }

    #[test]
    fn stale_tween_is_dropped_after_direct_stop() {
        let mut mixer = AnimationMixer::default();
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        mixer.fade_in("a", 1.0);
        mixer.action_mut("a").unwrap().stop();
        mixer.update(0.5);
        assert!(mixer.tweens().is_empty());
        assert_eq!(mixer.action("a").unwrap().weight(), 0.0);
    }

    #[test]
    fn global_time_scale_scales_clock() {
        let mut mixer = AnimationMixer::new(MixerOptions {
            time_scale: 2.0,
            ..MixerOptions::default()
        });
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        mixer.update(0.25);
        assert_eq!(mixer.time(), 0.5);
        assert_eq!(mixer.action("a").unwrap().local_time(), 0.5);
    }

    #[test]
    fn disabled_mixer_writes_nothing() {
        let mut mixer = AnimationMixer::default();
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        mixer.set_enabled(false);
        assert!(mixer.update(0.1).changes.is_empty());
        assert_eq!(mixer.time(), 0.0);
    }

    #[test]
    fn on_update_sees_outputs() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let mut mixer = AnimationMixer::default();
        mixer.add_clip(constant("a", 1.0), ActionOptions::default()).unwrap();
        mixer.set_on_update(move |_, out| {
            sink.fetch_add(out.changes.len(), Ordering::SeqCst);
        });
        mixer.update(0.1);
        mixer.update(0.1);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
