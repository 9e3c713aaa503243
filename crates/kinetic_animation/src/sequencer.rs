//! Timeline composition
//!
//! A [`Sequencer`] lays animations out on one global clock. Steps are placed
//! relative to the previously added step:
//!
//! - `then`: starts when the previous step ends
//! - `with`: starts together with the previous step
//! - `overlap(at)`: starts `at` (0..1) of the way through the previous step
//!
//! Each step's window is half-open, `[start, start + duration)`. While the
//! sequencer drives a handle, the handle's own clock, delay and repeat are
//! ignored.
//!
//! A step claims its keys while the playhead is inside `[start, end]`, so steps
//! animating the same property hand it over at their window boundary (the
//! later step wins the shared instant).

use std::ops::Deref;

use slotmap::SlotMap;

use crate::engine::AnimationId;
use crate::error::{AnimationError, Result};
use crate::instance::{AnimationInstance, AnimationState};

/// One scheduled animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequenceStep {
    pub animation: AnimationId,
    pub start_ms: f32,
    pub duration_ms: f32,
}

impl SequenceStep {
    pub fn end_ms(&self) -> f32 {
        self.start_ms + self.duration_ms
    }

    fn holds(&self, elapsed_ms: f32) -> bool {
        (self.start_ms..=self.end_ms()).contains(&elapsed_ms)
    }

    /// Local progress and state at global time `elapsed_ms`
    fn placement(&self, elapsed_ms: f32, inside: AnimationState) -> (f32, AnimationState) {
        if elapsed_ms < self.start_ms {
            (0.0, AnimationState::Idle)
        } else if elapsed_ms >= self.end_ms() {
            (1.0, AnimationState::Completed)
        } else {
            ((elapsed_ms - self.start_ms) / self.duration_ms, inside)
        }
    }
}

/// How steps inside their window are driven
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drive {
    Playing,
    Paused,
    Seeking,
}

/// Composed timeline of animations
#[derive(Debug, Default)]
pub struct Sequencer {
    steps: Vec<SequenceStep>,
    elapsed_ms: f32,
    running: bool,
    /// Steps holding the playhead since the engine last looked, in step order
    claims: Vec<AnimationId>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `max(start + duration)` over all steps
    pub fn total_duration_ms(&self) -> f32 {
        self.steps.iter().map(SequenceStep::end_ms).fold(0.0, f32::max)
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// Global progress in [0, 1]
    pub fn fraction(&self) -> f32 {
        let total = self.total_duration_ms();
        if total > 0.0 {
            (self.elapsed_ms / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.steps.iter().any(|s| s.animation == id)
    }

    pub(crate) fn remove_step(&mut self, id: AnimationId) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.animation != id);
        before != self.steps.len()
    }

    pub(crate) fn take_claims(&mut self) -> Vec<AnimationId> {
        std::mem::take(&mut self.claims)
    }

    pub(crate) fn advance(&mut self, dt_ms: f32, animations: &mut SlotMap<AnimationId, AnimationInstance>) {
        if !self.running {
            return;
        }
        let total = self.total_duration_ms();
        self.elapsed_ms = (self.elapsed_ms + dt_ms).min(total);
        if self.elapsed_ms >= total {
            self.running = false;
            tracing::debug!("sequencer finished after {:.0}ms", total);
        }
        self.drive_all(animations, Drive::Playing);
    }

    fn drive_all(&mut self, animations: &mut SlotMap<AnimationId, AnimationInstance>, mode: Drive) {
        for i in 0..self.steps.len() {
            self.drive_step(i, animations, mode);
        }
    }

    fn drive_step(
        &mut self,
        index: usize,
        animations: &mut SlotMap<AnimationId, AnimationInstance>,
        mode: Drive,
    ) {
        let step = self.steps[index];
        let Some(anim) = animations.get_mut(step.animation) else {
            return;
        };
        let inside = match mode {
            Drive::Playing if self.running => AnimationState::Running,
            Drive::Playing | Drive::Paused => AnimationState::Paused,
            Drive::Seeking => AnimationState::Scrubbed,
        };
        let (progress, state) = step.placement(self.elapsed_ms, inside);
        let state = if mode == Drive::Seeking {
            AnimationState::Scrubbed
        } else {
            state
        };
        anim.drive(progress, state);
        if step.holds(self.elapsed_ms) {
            self.claims.push(step.animation);
        }
    }
}

/// Mutable access to a sequencer together with the animations it drives
pub struct SequencerMut<'a> {
    pub(crate) sequencer: &'a mut Sequencer,
    pub(crate) animations: &'a mut SlotMap<AnimationId, AnimationInstance>,
}

impl Deref for SequencerMut<'_> {
    type Target = Sequencer;

    fn deref(&self) -> &Sequencer {
        &*self.sequencer
    }
}

impl SequencerMut<'_> {
    /// Append a step starting when the previous one ends
    pub fn then(&mut self, id: AnimationId) -> Result<&mut Self> {
        let start = self.sequencer.steps.last().map_or(0.0, SequenceStep::end_ms);
        self.push(id, start)
    }

    /// Append a step starting with the previous one
    pub fn with(&mut self, id: AnimationId) -> Result<&mut Self> {
        let start = self.sequencer.steps.last().map_or(0.0, |s| s.start_ms);
        self.push(id, start)
    }

    /// Append a step starting `at` (0..1) of the way through the previous one
    pub fn overlap(&mut self, id: AnimationId, at: f32) -> Result<&mut Self> {
        if !at.is_finite() || !(0.0..=1.0).contains(&at) {
            return Err(AnimationError::config(format!(
                "overlap point must be in [0, 1], got {at}"
            )));
        }
        let start = self
            .sequencer
            .steps
            .last()
            .map_or(0.0, |s| s.start_ms + at * s.duration_ms);
        self.push(id, start)
    }

    fn push(&mut self, id: AnimationId, start_ms: f32) -> Result<&mut Self> {
        let anim = self
            .animations
            .get_mut(id)
            .ok_or(AnimationError::UnknownAnimation)?;
        if self.sequencer.contains(id) {
            return Err(AnimationError::config("animation is already sequenced"));
        }
        if !anim.is_revivable() {
            return Err(AnimationError::config(
                "stopped, evicted or faulted animations cannot be sequenced",
            ));
        }

        anim.attach_timeline();
        let step = SequenceStep {
            animation: id,
            start_ms,
            duration_ms: anim.spec().duration_ms(),
        };
        self.sequencer.steps.push(step);
        let index = self.sequencer.steps.len() - 1;
        self.sequencer.drive_step(index, self.animations, Drive::Paused);
        Ok(self)
    }

    /// Start (or restart, once finished) the global clock
    pub fn play(&mut self) {
        if self.sequencer.elapsed_ms >= self.sequencer.total_duration_ms() {
            self.sequencer.elapsed_ms = 0.0;
        }
        self.sequencer.running = !self.sequencer.steps.is_empty();
        self.sequencer.drive_all(self.animations, Drive::Playing);
    }

    /// Freeze the global clock
    pub fn pause(&mut self) {
        self.sequencer.running = false;
        self.sequencer.drive_all(self.animations, Drive::Paused);
    }

    /// Freeze and rewind the global clock
    pub fn stop(&mut self) {
        self.sequencer.running = false;
        self.sequencer.elapsed_ms = 0.0;
        for step in &self.sequencer.steps {
            if let Some(anim) = self.animations.get_mut(step.animation) {
                anim.drive(0.0, AnimationState::Idle);
            }
        }
    }

    /// Jump to a global fraction, scrubbing every step to its local fraction
    pub fn seek_to(&mut self, fraction: f32) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.sequencer.elapsed_ms = fraction * self.sequencer.total_duration_ms();
        self.sequencer.drive_all(self.animations, Drive::Seeking);
    }
}
