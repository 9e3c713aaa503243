//! Animation instances
//!
//! Runtime half of an animation: playback state, clock, progress and the
//! per-property values computed each tick. Progress is always the position
//! along the forward (start to end) path; [`Direction`] says which way the
//! clock is moving along it.
//!
//! ```text
//! Idle ──play──▶ Running ◀──pause/resume──▶ Paused
//!  │               │  ▲                       │
//!  └─set_fraction──┴──┼──▶ Scrubbed ◀─────────┘
//!                     └────play/resume──┘
//! any ──stop / evict / target lost / last pass──▶ Completed
//! ```

use smallvec::SmallVec;

use crate::animation::{AnimationSpec, Motion};
use crate::completion::{AnimationOutcome, CompletionSignal, Completer};
use crate::easing::TimingCurve;
use crate::error::{AnimationError, Result};
use crate::keyframe;
use crate::property::{lerp, AnimatableProperty, RenderSink, TargetId};
use crate::spring::{Spring, DEFAULT_REST_EPSILON};

/// Callback for per-tick faults on one animation
pub type ErrorCallback = Box<dyn FnMut(&AnimationError)>;

/// Playback state of an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationState {
    Idle,
    Running,
    Paused,
    /// Progress only moves through explicit fraction writes
    Scrubbed,
    Completed,
}

/// Which way the clock moves along the forward path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// Progress where a pass in this direction starts
    pub fn origin(self) -> f32 {
        match self {
            Self::Forward => 0.0,
            Self::Reverse => 1.0,
        }
    }

    /// Progress where a pass in this direction ends
    pub fn end(self) -> f32 {
        1.0 - self.origin()
    }

    /// Direction whose pass ends nearest `to`
    pub(crate) fn toward(to: f32) -> Self {
        if to >= 0.5 {
            Self::Forward
        } else {
            Self::Reverse
        }
    }
}

/// How a spring-timed animation reverses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ReverseMode {
    /// Keep moving: the spring's velocity is negated
    #[default]
    PreserveMomentum,
    /// Restart the spring from rest toward the new end
    FromRest,
}

/// Who advances the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Driver {
    /// The instance's own elapsed clock or spring
    Clock,
    /// A sequencer timeline sets progress directly
    Timeline,
}

/// A running (or finished) animation
pub struct AnimationInstance {
    spec: AnimationSpec,
    state: AnimationState,
    direction: Direction,
    /// Milliseconds into the current pass; negative while delayed
    elapsed_ms: f32,
    progress: f32,
    /// Normalized 0..1 spring for spring-timed curves
    spring: Option<Spring>,
    passes_done: u32,
    pass_limit: Option<u32>,
    /// End the next pass in Scrubbed instead of Completed
    hold_at_end: bool,
    driver: Driver,
    /// Resolved (property, from, to) for delta motion
    endpoints: SmallVec<[(AnimatableProperty, f32, f32); 4]>,
    resolved: bool,
    values: SmallVec<[(AnimatableProperty, f32); 4]>,
    /// Finished this tick; present the final values once more
    final_frame: bool,
    /// Went live outside the engine's control calls; claim keys next tick
    claim_requested: bool,
    outcome: Option<AnimationOutcome>,
    completer: Completer,
    on_error: Option<ErrorCallback>,
}

impl AnimationInstance {
    pub(crate) fn new(spec: AnimationSpec) -> Self {
        let spring = match spec.curve() {
            TimingCurve::Spring(config) => {
                let mut spring = Spring::new(*config, 0.0);
                spring.set_target(1.0);
                spring.set_velocity(spec.initial_velocity());
                Some(spring)
            }
            _ => None,
        };
        let pass_limit = u32::try_from(spec.repeat_count()).ok();

        Self {
            elapsed_ms: -spec.delay_ms(),
            spec,
            state: AnimationState::Idle,
            direction: Direction::Forward,
            progress: 0.0,
            spring,
            passes_done: 0,
            pass_limit,
            hold_at_end: false,
            driver: Driver::Clock,
            endpoints: SmallVec::new(),
            resolved: false,
            values: SmallVec::new(),
            final_frame: false,
            claim_requested: false,
            outcome: None,
            completer: Completer::new(),
            on_error: None,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }

    pub fn target(&self) -> TargetId {
        self.spec.target()
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Position along the forward path, always in [0, 1]
    pub fn fraction_complete(&self) -> f32 {
        self.progress
    }

    /// Last computed value of a property
    pub fn value(&self, property: AnimatableProperty) -> Option<f32> {
        self.values
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| *v)
    }

    pub fn values(&self) -> &[(AnimatableProperty, f32)] {
        &self.values
    }

    pub fn is_additive(&self) -> bool {
        self.spec.is_additive()
    }

    pub fn completed_passes(&self) -> u32 {
        self.passes_done
    }

    /// Terminal outcome, once Completed
    pub fn outcome(&self) -> Option<AnimationOutcome> {
        self.outcome
    }

    pub fn is_completed(&self) -> bool {
        self.state == AnimationState::Completed
    }

    /// Still waiting out its start delay
    pub fn is_delayed(&self) -> bool {
        self.elapsed_ms < 0.0
    }

    /// Whether this instance writes values this tick
    pub(crate) fn is_presenting(&self) -> bool {
        if !self.resolved {
            return false;
        }
        self.final_frame || (self.is_live() && !self.is_delayed())
    }

    /// Whether the instance should resolve its start values before presenting
    pub(crate) fn wants_resolve(&self) -> bool {
        !self.resolved && (self.final_frame || (self.is_live() && !self.is_delayed()))
    }

    pub(crate) fn is_revivable(&self) -> bool {
        matches!(self.outcome, None | Some(AnimationOutcome::Finished))
    }

    /// Running, paused or scrubbed: the instance may write its keys
    pub(crate) fn is_live(&self) -> bool {
        matches!(
            self.state,
            AnimationState::Running | AnimationState::Paused | AnimationState::Scrubbed
        )
    }

    pub(crate) fn request_claim(&mut self) {
        self.claim_requested = true;
    }

    pub(crate) fn take_claim_request(&mut self) -> bool {
        std::mem::take(&mut self.claim_requested)
    }

    // ========================================================================
    // Control
    // ========================================================================

    pub(crate) fn subscribe(&mut self) -> CompletionSignal {
        self.completer.subscribe()
    }

    pub(crate) fn set_error_callback(&mut self, callback: ErrorCallback) {
        self.on_error = Some(callback);
    }

    pub(crate) fn attach_timeline(&mut self) {
        self.driver = Driver::Timeline;
    }

    pub(crate) fn detach_timeline(&mut self) {
        self.driver = Driver::Clock;
    }

    /// Start, resume or leave scrubbing. No-op when Running or Completed.
    pub(crate) fn play(&mut self) -> AnimationState {
        match self.state {
            AnimationState::Idle => {
                self.claim_requested = true;
                self.state = AnimationState::Running;
            }
            AnimationState::Paused => {
                self.state = AnimationState::Running;
            }
            AnimationState::Scrubbed => {
                self.sync_clock_to_progress();
                if let Some(spring) = self.spring.as_mut() {
                    spring.reset(self.progress);
                    spring.set_target(self.direction.end());
                }
                self.state = AnimationState::Running;
            }
            AnimationState::Running | AnimationState::Completed => {}
        }
        self.state
    }

    /// Resume only from Paused or Scrubbed
    pub(crate) fn resume(&mut self) -> AnimationState {
        match self.state {
            AnimationState::Paused | AnimationState::Scrubbed => self.play(),
            _ => self.state,
        }
    }

    pub(crate) fn pause(&mut self) -> AnimationState {
        if self.state == AnimationState::Running {
            self.state = AnimationState::Paused;
        }
        self.state
    }

    /// Flip direction keeping the current position. Nothing has moved yet
    /// while Idle or delayed, so reversing then is a no-op.
    pub(crate) fn reverse(&mut self, mode: ReverseMode) -> AnimationState {
        if matches!(self.state, AnimationState::Idle | AnimationState::Completed) || self.is_delayed() {
            return self.state;
        }

        self.direction = self.direction.flipped();
        match self.spring.as_mut() {
            Some(spring) => {
                spring.set_target(self.direction.end());
                match mode {
                    ReverseMode::PreserveMomentum => spring.set_velocity(-spring.velocity()),
                    ReverseMode::FromRest => spring.set_velocity(0.0),
                }
            }
            None => self.sync_clock_to_progress(),
        }
        self.state
    }

    /// Enter scrub mode at `fraction` (clamped)
    pub(crate) fn scrub(&mut self, fraction: f32) -> AnimationState {
        if self.is_completed() {
            return self.state;
        }

        if self.state == AnimationState::Idle {
            self.claim_requested = true;
        }
        self.progress = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.sync_clock_to_progress();
        if let Some(spring) = self.spring.as_mut() {
            spring.reset(self.progress);
            spring.set_target(self.direction.end());
        }
        self.state = AnimationState::Scrubbed;
        self.state
    }

    /// Run one final pass toward `direction`'s end.
    ///
    /// With `hold`, reaching the end parks the instance in Scrubbed instead of
    /// completing it. `velocity` (normalized units/s along the forward path) is
    /// injected into spring-timed instances.
    pub(crate) fn settle_toward(&mut self, direction: Direction, hold: bool, velocity: Option<f32>) {
        if self.is_completed() {
            return;
        }

        let was_scrubbing = matches!(self.state, AnimationState::Scrubbed | AnimationState::Idle);
        if self.state == AnimationState::Idle {
            self.claim_requested = true;
        }
        self.direction = direction;
        self.pass_limit = Some(self.passes_done + 1);
        self.hold_at_end = hold;
        self.sync_clock_to_progress();
        if let Some(spring) = self.spring.as_mut() {
            if was_scrubbing {
                spring.reset(self.progress);
            }
            spring.set_target(direction.end());
            if let Some(v) = velocity {
                spring.set_velocity(v);
            }
        }
        self.state = AnimationState::Running;
    }

    /// Set progress from a timeline. Instances stopped, evicted or faulted are left alone.
    pub(crate) fn drive(&mut self, progress: f32, state: AnimationState) {
        if !self.is_revivable() {
            return;
        }

        self.direction = Direction::Forward;
        self.progress = progress.clamp(0.0, 1.0);
        self.sync_clock_to_progress();
        if let Some(spring) = self.spring.as_mut() {
            spring.reset(self.progress);
            spring.set_target(1.0);
        }

        match state {
            AnimationState::Completed => {
                if !self.is_completed() {
                    self.finish();
                }
            }
            other => {
                self.outcome = None;
                self.state = other;
            }
        }
    }

    /// Terminal transition for stop, eviction and target loss
    pub(crate) fn terminate(&mut self, outcome: AnimationOutcome) {
        self.final_frame = false;
        self.outcome = Some(outcome);
        self.state = AnimationState::Completed;
        self.completer.resolve(outcome);
    }

    /// Report a fault to the callback and complete with TargetLost
    pub(crate) fn fail(&mut self, error: AnimationError) {
        if let Some(callback) = self.on_error.as_mut() {
            callback(&error);
        }
        self.terminate(AnimationOutcome::TargetLost);
    }

    fn finish(&mut self) {
        self.state = AnimationState::Completed;
        self.outcome = Some(AnimationOutcome::Finished);
        self.final_frame = true;
        self.completer.resolve(AnimationOutcome::Finished);
    }

    // ========================================================================
    // Per-tick
    // ========================================================================

    /// Step the normalized spring (`dt` in seconds)
    pub(crate) fn step_spring(&mut self, dt: f32) {
        if self.state != AnimationState::Running
            || self.driver != Driver::Clock
            || self.is_delayed()
        {
            return;
        }
        if let Some(spring) = self.spring.as_mut() {
            spring.step(dt);
        }
    }

    /// Advance the clock and detect the end of a pass (`dt_ms` in milliseconds)
    pub(crate) fn advance(&mut self, dt_ms: f32) {
        if self.state != AnimationState::Running || self.driver != Driver::Clock {
            return;
        }

        self.elapsed_ms += dt_ms;
        if self.is_delayed() {
            return;
        }

        let pass_over = match self.spring.as_mut() {
            Some(spring) => {
                let rested = spring.is_at_rest(spring.target(), DEFAULT_REST_EPSILON);
                if rested {
                    spring.settle();
                }
                self.progress = spring.value().clamp(0.0, 1.0);
                rested
            }
            None => {
                let t = (self.elapsed_ms / self.spec.duration_ms()).clamp(0.0, 1.0);
                self.progress = match self.direction {
                    Direction::Forward => t,
                    Direction::Reverse => 1.0 - t,
                };
                self.elapsed_ms >= self.spec.duration_ms()
            }
        };
        if pass_over {
            self.end_pass();
        }
    }

    fn end_pass(&mut self) {
        self.passes_done += 1;
        let more = self.pass_limit.map_or(true, |limit| self.passes_done < limit);

        if !more {
            if self.hold_at_end {
                self.hold_at_end = false;
                self.state = AnimationState::Scrubbed;
            } else {
                self.finish();
            }
            return;
        }

        self.elapsed_ms = 0.0;
        if self.spec.auto_reverse() {
            self.direction = self.direction.flipped();
        } else {
            self.progress = self.direction.origin();
        }
        if let Some(spring) = self.spring.as_mut() {
            spring.reset(self.progress);
            spring.set_target(self.direction.end());
        }
    }

    /// Resolve implicit start values from the sink
    pub(crate) fn resolve<S: RenderSink + ?Sized>(&mut self, sink: &S) -> Result<()> {
        let target = self.spec.target();
        if !sink.is_live(target) {
            return Err(AnimationError::InvalidTarget(target));
        }

        if let Motion::Properties(deltas) = self.spec.motion() {
            let mut endpoints = SmallVec::new();
            for delta in deltas {
                let from = match delta.from {
                    Some(from) => from,
                    None if self.spec.is_additive() => 0.0,
                    None => sink
                        .current_value(target, delta.property)
                        .ok_or(AnimationError::InvalidTarget(target))?,
                };
                endpoints.push((delta.property, from, delta.to));
            }
            self.endpoints = endpoints;
        }
        self.resolved = true;
        Ok(())
    }

    /// Recompute per-property values from progress
    pub(crate) fn refresh_values(&mut self) {
        if !self.resolved {
            return;
        }

        let eased = match &self.spring {
            Some(spring) => spring.value(),
            None => self.spec.curve().ease(self.progress),
        };

        self.values.clear();
        match self.spec.motion() {
            Motion::Properties(_) => {
                for (property, from, to) in &self.endpoints {
                    self.values.push((*property, lerp(*from, *to, eased)));
                }
            }
            Motion::Keyframes(kfs) => {
                let at = match &self.spring {
                    Some(spring) => spring.value().clamp(0.0, 1.0),
                    None => self.progress,
                };
                for property in keyframe::properties(kfs) {
                    if let Some(v) = keyframe::sample(kfs, property, at, self.spec.curve()) {
                        self.values.push((property, v));
                    }
                }
            }
        }
    }

    /// Clear the one-shot final frame flag, returning whether it was set
    pub(crate) fn take_final_frame(&mut self) -> bool {
        std::mem::take(&mut self.final_frame)
    }

    fn sync_clock_to_progress(&mut self) {
        let t = match self.direction {
            Direction::Forward => self.progress,
            Direction::Reverse => 1.0 - self.progress,
        };
        self.elapsed_ms = t * self.spec.duration_ms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;
    use crate::spring::SpringConfig;
    use AnimatableProperty::*;

    const T: TargetId = TargetId(7);

    struct Blank;

    impl RenderSink for Blank {
        fn current_value(&self, _: TargetId, property: AnimatableProperty) -> Option<f32> {
            Some(property.identity())
        }

        fn apply(&mut self, _: TargetId, _: AnimatableProperty, _: f32) {}
    }

    fn linear(duration: f32) -> AnimationInstance {
        let spec = AnimationSpec::builder(T)
            .animate_from(X, 0.0, 100.0)
            .linear()
            .duration(duration)
            .build()
            .unwrap();
        let mut inst = AnimationInstance::new(spec);
        inst.resolve(&Blank).unwrap();
        inst
    }

    fn run(inst: &mut AnimationInstance, dt_ms: f32, frames: usize) {
        for _ in 0..frames {
            inst.step_spring(dt_ms / 1000.0);
            inst.advance(dt_ms);
            inst.refresh_values();
        }
    }

    #[test]
    fn test_linear_progress_and_completion() {
        let mut inst = linear(100.0);
        assert_eq!(inst.play(), AnimationState::Running);

        run(&mut inst, 25.0, 2);
        assert!((inst.fraction_complete() - 0.5).abs() < 1e-5);
        assert_eq!(inst.value(X), Some(50.0));

        run(&mut inst, 25.0, 2);
        assert_eq!(inst.state(), AnimationState::Completed);
        assert_eq!(inst.outcome(), Some(AnimationOutcome::Finished));
        assert_eq!(inst.value(X), Some(100.0));
        assert!(inst.take_final_frame());
        assert!(!inst.take_final_frame());
    }

    #[test]
    fn test_delay_holds_progress() {
        let spec = AnimationSpec::builder(T)
            .animate_from(X, 0.0, 10.0)
            .linear()
            .duration(100.0)
            .delay(50.0)
            .build()
            .unwrap();
        let mut inst = AnimationInstance::new(spec);
        inst.play();
        run(&mut inst, 25.0, 1);
        assert!(inst.is_delayed());
        assert!(!inst.wants_resolve());

        run(&mut inst, 25.0, 2);
        assert!(!inst.is_delayed());
        assert!((inst.fraction_complete() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut inst = linear(100.0);
        inst.play();
        run(&mut inst, 20.0, 1);
        inst.pause();
        run(&mut inst, 20.0, 10);
        assert!((inst.fraction_complete() - 0.2).abs() < 1e-5);

        assert_eq!(inst.resume(), AnimationState::Running);
        run(&mut inst, 20.0, 1);
        assert!((inst.fraction_complete() - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_scrub_then_resume_continues_from_fraction() {
        let mut inst = linear(100.0);
        inst.play();
        run(&mut inst, 10.0, 3);

        assert_eq!(inst.scrub(0.8), AnimationState::Scrubbed);
        run(&mut inst, 10.0, 5);
        assert_eq!(inst.fraction_complete(), 0.8);

        inst.play();
        run(&mut inst, 10.0, 1);
        assert!((inst.fraction_complete() - 0.9).abs() < 1e-5);

        // Out of range writes are clamped
        inst.scrub(4.0);
        assert_eq!(inst.fraction_complete(), 1.0);
        inst.scrub(-1.0);
        assert_eq!(inst.fraction_complete(), 0.0);
    }

    #[test]
    fn test_reverse_is_visually_continuous() {
        let mut inst = linear(100.0);
        inst.play();
        run(&mut inst, 10.0, 3);
        let before = inst.value(X).unwrap();

        inst.reverse(ReverseMode::PreserveMomentum);
        assert_eq!(inst.direction(), Direction::Reverse);
        inst.refresh_values();
        assert!((inst.value(X).unwrap() - before).abs() < 1e-4);

        run(&mut inst, 10.0, 1);
        assert!((inst.fraction_complete() - 0.2).abs() < 1e-5);

        run(&mut inst, 10.0, 2);
        assert_eq!(inst.state(), AnimationState::Completed);
        assert_eq!(inst.fraction_complete(), 0.0);
    }

    #[test]
    fn test_reverse_before_motion_is_noop() {
        let mut idle = linear(100.0);
        assert_eq!(idle.reverse(ReverseMode::default()), AnimationState::Idle);
        assert_eq!(idle.direction(), Direction::Forward);

        let spec = AnimationSpec::builder(T)
            .animate_from(X, 0.0, 100.0)
            .linear()
            .duration(100.0)
            .delay(40.0)
            .build()
            .unwrap();
        let mut delayed = AnimationInstance::new(spec);
        delayed.resolve(&Blank).unwrap();
        delayed.play();
        run(&mut delayed, 20.0, 1);
        assert_eq!(delayed.reverse(ReverseMode::default()), AnimationState::Running);
        assert_eq!(delayed.direction(), Direction::Forward);

        // The delay is still honored and the pass runs in full
        run(&mut delayed, 20.0, 1);
        assert!(!delayed.is_delayed());
        assert_eq!(delayed.fraction_complete(), 0.0);
        run(&mut delayed, 50.0, 1);
        assert!((delayed.fraction_complete() - 0.5).abs() < 1e-5);
        assert_eq!(delayed.value(X), Some(50.0));
        assert!(!delayed.is_completed());
    }

    #[test]
    fn test_going_live_requests_claim() {
        let mut inst = linear(100.0);
        assert!(!inst.take_claim_request());
        inst.scrub(0.3);
        assert!(inst.take_claim_request());
        inst.play();
        assert!(!inst.take_claim_request());
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut inst = linear(10.0);
        inst.play();
        run(&mut inst, 10.0, 1);
        assert!(inst.is_completed());

        assert_eq!(inst.play(), AnimationState::Completed);
        assert_eq!(inst.pause(), AnimationState::Completed);
        assert_eq!(inst.scrub(0.3), AnimationState::Completed);
        assert_eq!(inst.reverse(ReverseMode::FromRest), AnimationState::Completed);
        assert_eq!(inst.fraction_complete(), 1.0);
    }

    #[test]
    fn test_repeat_without_auto_reverse_restarts() {
        let spec = AnimationSpec::builder(T)
            .animate_from(X, 0.0, 1.0)
            .linear()
            .duration(50.0)
            .repeat(2)
            .build()
            .unwrap();
        let mut inst = AnimationInstance::new(spec);
        inst.resolve(&Blank).unwrap();
        inst.play();

        run(&mut inst, 50.0, 1);
        assert_eq!(inst.completed_passes(), 1);
        assert_eq!(inst.fraction_complete(), 0.0);
        assert_eq!(inst.direction(), Direction::Forward);

        run(&mut inst, 50.0, 1);
        assert!(inst.is_completed());
    }

    #[test]
    fn test_spring_timed_completes_at_rest() {
        let spec = AnimationSpec::builder(T)
            .animate_from(Opacity, 0.0, 1.0)
            .spring(SpringConfig::snappy())
            .build()
            .unwrap();
        let mut inst = AnimationInstance::new(spec);
        inst.resolve(&Blank).unwrap();
        inst.play();

        let mut frames = 0;
        while !inst.is_completed() {
            run(&mut inst, 1000.0 / 60.0, 1);
            let f = inst.fraction_complete();
            assert!((0.0..=1.0).contains(&f));
            frames += 1;
            assert!(frames < 600);
        }
        assert_eq!(inst.value(Opacity), Some(1.0));
    }

    #[test]
    fn test_spring_reverse_modes_differ() {
        let spec = AnimationSpec::builder(T)
            .animate_from(X, 0.0, 1.0)
            .spring(SpringConfig::default())
            .build()
            .unwrap();

        let mut momentum = AnimationInstance::new(spec.clone());
        let mut rest = AnimationInstance::new(spec);
        for inst in [&mut momentum, &mut rest] {
            inst.resolve(&Blank).unwrap();
            inst.play();
            run(inst, 16.0, 5);
        }
        let v = momentum.spring.map(|s| s.velocity()).unwrap_or_default();
        assert!(v > 0.0);

        momentum.reverse(ReverseMode::PreserveMomentum);
        rest.reverse(ReverseMode::FromRest);
        assert_eq!(momentum.spring.map(|s| s.velocity()), Some(-v));
        assert_eq!(rest.spring.map(|s| s.velocity()), Some(0.0));
        assert_eq!(momentum.fraction_complete(), rest.fraction_complete());
    }

    #[test]
    fn test_keyframes_follow_progress() {
        let spec = AnimationSpec::builder(T)
            .keyframes([
                Keyframe::at(0.0).with_scale(0.0),
                Keyframe::at(0.5).with_scale(1.2),
                Keyframe::at(1.0).with_scale(1.0),
            ])
            .linear()
            .duration(100.0)
            .build()
            .unwrap();
        let mut inst = AnimationInstance::new(spec);
        inst.resolve(&Blank).unwrap();
        inst.play();
        run(&mut inst, 25.0, 1);
        assert!((inst.value(Scale).unwrap() - 0.6).abs() < 1e-5);
        run(&mut inst, 25.0, 1);
        assert!((inst.value(Scale).unwrap() - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_settle_with_hold_parks_in_scrubbed() {
        let mut inst = linear(100.0);
        inst.scrub(0.4);
        inst.settle_toward(Direction::Reverse, true, None);
        run(&mut inst, 10.0, 4);
        assert_eq!(inst.state(), AnimationState::Scrubbed);
        assert_eq!(inst.fraction_complete(), 0.0);
        assert_eq!(inst.outcome(), None);
    }

    #[test]
    fn test_drive_respects_terminal_outcomes() {
        let mut inst = linear(100.0);
        inst.attach_timeline();
        inst.drive(0.5, AnimationState::Running);
        // Timeline-driven instances ignore their own clock
        run(&mut inst, 10.0, 3);
        assert_eq!(inst.fraction_complete(), 0.5);

        inst.drive(1.0, AnimationState::Completed);
        assert_eq!(inst.outcome(), Some(AnimationOutcome::Finished));
        inst.drive(0.2, AnimationState::Scrubbed);
        assert_eq!(inst.state(), AnimationState::Scrubbed);

        inst.terminate(AnimationOutcome::Stopped);
        inst.drive(0.7, AnimationState::Running);
        assert!(inst.is_completed());
    }

    #[test]
    fn test_missing_start_value_is_invalid_target() {
        struct Gone;
        impl RenderSink for Gone {
            fn current_value(&self, _: TargetId, _: AnimatableProperty) -> Option<f32> {
                None
            }
            fn apply(&mut self, _: TargetId, _: AnimatableProperty, _: f32) {}
        }

        let spec = AnimationSpec::builder(T).animate(X, 5.0).build().unwrap();
        let mut inst = AnimationInstance::new(spec);
        assert_eq!(inst.resolve(&Gone), Err(AnimationError::InvalidTarget(T)));
    }
}
