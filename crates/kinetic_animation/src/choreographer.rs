//! Interactive transitions
//!
//! A [`Choreographer`] coordinates the animations of one transition (present,
//! dismiss, push, pop) and exposes the interactive protocol used by drag
//! gestures: begin, update with a 0..1 fraction, then finish (commit or
//! cancel) with a release velocity.
//!
//! The drag fraction always runs 0..1 in the "doing the transition"
//! direction. Dismiss and pop run their animations backwards, so members see
//! `1 - fraction`.

use std::ops::Deref;

use kinetic_core::StateMachine;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::engine::AnimationId;
use crate::error::{AnimationError, Result};
use crate::instance::{AnimationInstance, AnimationState, Direction};

/// Semantic direction of a coordinated transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionContext {
    Present,
    Dismiss,
    Push,
    Pop,
}

impl TransitionContext {
    /// Whether members run from their end back to their start
    pub fn is_inverted(self) -> bool {
        matches!(self, Self::Dismiss | Self::Pop)
    }

    /// Member progress for a drag fraction
    pub fn map_fraction(self, fraction: f32) -> f32 {
        if self.is_inverted() {
            1.0 - fraction
        } else {
            fraction
        }
    }
}

/// Phase of a choreographed transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChoreographerPhase {
    Idle,
    Interactive,
    Completing,
    Cancelling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum PhaseEvent {
    Begin,
    Commit,
    Cancel,
    Settled,
}

/// Tuning for finish decisions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChoreographerConfig {
    pub completion_threshold: f32,
    /// Seconds of release velocity projected onto the fraction
    pub extrapolation_window: f32,
}

impl Default for ChoreographerConfig {
    fn default() -> Self {
        Self {
            completion_threshold: 0.5,
            extrapolation_window: 0.2,
        }
    }
}

impl ChoreographerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.completion_threshold) {
            return Err(AnimationError::config(format!(
                "completion threshold must be in [0, 1], got {}",
                self.completion_threshold
            )));
        }
        if !self.extrapolation_window.is_finite() || self.extrapolation_window < 0.0 {
            return Err(AnimationError::config("extrapolation window must be >= 0"));
        }
        Ok(())
    }
}

/// Coordinator for one transition's animations
#[derive(Debug)]
pub struct Choreographer {
    context: TransitionContext,
    config: ChoreographerConfig,
    members: SmallVec<[AnimationId; 8]>,
    phase: StateMachine<ChoreographerPhase, PhaseEvent>,
    fraction: f32,
    cancelled: bool,
}

impl Choreographer {
    pub fn new(context: TransitionContext) -> Self {
        use ChoreographerPhase::*;
        use PhaseEvent::*;

        let phase = StateMachine::builder(Idle)
            .on(Idle, Begin, Interactive)
            .on(Idle, Commit, Completing)
            .on(Interactive, Commit, Completing)
            .on(Interactive, Cancel, Cancelling)
            .on(Completing, Cancel, Cancelling)
            .on(Completing, Begin, Interactive)
            .on(Cancelling, Begin, Interactive)
            .on(Completing, Settled, Idle)
            .on(Cancelling, Settled, Idle)
            .build();

        Self {
            context,
            config: ChoreographerConfig::default(),
            members: SmallVec::new(),
            phase,
            fraction: 0.0,
            cancelled: false,
        }
    }

    pub fn with_config(context: TransitionContext, config: ChoreographerConfig) -> Result<Self> {
        config.validate()?;
        let mut choreographer = Self::new(context);
        choreographer.config = config;
        Ok(choreographer)
    }

    pub fn context(&self) -> TransitionContext {
        self.context
    }

    pub fn config(&self) -> &ChoreographerConfig {
        &self.config
    }

    pub fn phase(&self) -> ChoreographerPhase {
        self.phase.current_state()
    }

    pub fn is_interactive(&self) -> bool {
        self.phase.is_in(ChoreographerPhase::Interactive)
    }

    /// Set when the last finish went down the cancel path
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Last drag fraction
    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn members(&self) -> &[AnimationId] {
        &self.members
    }

    /// Whether a finish at `fraction` with `velocity` (fraction/s) commits
    pub fn should_complete(&self, fraction: f32, velocity: f32) -> bool {
        let threshold = self.config.completion_threshold;
        let projected = fraction + velocity * self.config.extrapolation_window;
        fraction >= threshold || projected >= threshold
    }

    pub(crate) fn remove_member(&mut self, id: AnimationId) {
        self.members.retain(|m| *m != id);
    }

    /// Return to Idle once every member has settled
    pub(crate) fn observe(&mut self, animations: &SlotMap<AnimationId, AnimationInstance>) {
        let settled = match self.phase() {
            ChoreographerPhase::Completing => self
                .members
                .iter()
                .all(|id| animations.get(*id).map_or(true, |a| a.is_completed())),
            ChoreographerPhase::Cancelling => self
                .members
                .iter()
                .all(|id| animations.get(*id).map_or(true, |a| a.state() != AnimationState::Running)),
            _ => false,
        };
        if settled {
            self.phase.send(PhaseEvent::Settled);
            tracing::debug!("choreographer {:?} settled (cancelled: {})", self.context, self.cancelled);
        }
    }
}

/// Mutable access to a choreographer together with the animations it drives
pub struct ChoreographerMut<'a> {
    pub(crate) choreographer: &'a mut Choreographer,
    pub(crate) animations: &'a mut SlotMap<AnimationId, AnimationInstance>,
}

impl Deref for ChoreographerMut<'_> {
    type Target = Choreographer;

    fn deref(&self) -> &Choreographer {
        &*self.choreographer
    }
}

impl ChoreographerMut<'_> {
    /// Add an animation to the transition
    pub fn add(&mut self, id: AnimationId) -> Result<&mut Self> {
        if !self.animations.contains_key(id) {
            return Err(AnimationError::UnknownAnimation);
        }
        if !self.choreographer.members.contains(&id) {
            self.choreographer.members.push(id);
        }
        Ok(self)
    }

    /// Put every member into scrub mode. Returns false if already interactive.
    pub fn begin_interactive(&mut self) -> bool {
        let from_idle = self.choreographer.phase() == ChoreographerPhase::Idle;
        if self.choreographer.phase.send(PhaseEvent::Begin).is_none() {
            tracing::warn!("begin_interactive ignored in {:?}", self.choreographer.phase());
            return false;
        }

        let context = self.choreographer.context;
        self.choreographer.cancelled = false;
        if from_idle {
            self.choreographer.fraction = 0.0;
            let start = context.map_fraction(0.0);
            self.scrub_members(|_| start);
        } else {
            // Grabbed mid-settle: continue from where the members are
            let current = self
                .choreographer
                .members
                .iter()
                .find_map(|id| self.animations.get(*id))
                .map(|a| a.fraction_complete());
            if let Some(progress) = current {
                self.choreographer.fraction = context.map_fraction(progress);
            }
            self.scrub_members(|a| a.fraction_complete());
        }
        tracing::debug!("choreographer {:?} interactive", context);
        true
    }

    /// Forward a drag fraction to every member
    pub fn update_interactive(&mut self, fraction: f32) {
        if !self.choreographer.is_interactive() || !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        self.choreographer.fraction = fraction;
        let progress = self.choreographer.context.map_fraction(fraction);
        self.scrub_members(|_| progress);
    }

    /// Decide commit vs. cancel from the fraction and release velocity (fraction/s)
    pub fn finish_interactive(&mut self, velocity: f32) -> bool {
        if !self.choreographer.is_interactive() {
            return false;
        }
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };
        let commit = self
            .choreographer
            .should_complete(self.choreographer.fraction, velocity);
        self.settle(commit, velocity);
        commit
    }

    /// Commit regardless of fraction
    pub fn commit_interactive(&mut self, velocity: f32) {
        if self.choreographer.is_interactive() {
            self.settle(true, velocity);
        }
    }

    /// Send every member back to its origin regardless of fraction
    pub fn cancel_interactive(&mut self) {
        self.settle(false, 0.0);
    }

    /// Run the transition to completion without a gesture
    pub fn play(&mut self) -> bool {
        if self.choreographer.phase() != ChoreographerPhase::Idle {
            return false;
        }
        let start = self.choreographer.context.map_fraction(0.0);
        for id in self.choreographer.members.iter() {
            if let Some(anim) = self.animations.get_mut(*id) {
                if anim.state() == AnimationState::Idle {
                    anim.scrub(start);
                }
            }
        }
        self.settle(true, 0.0);
        true
    }

    pub(crate) fn cancel_with_velocity(&mut self, velocity: f32) {
        self.settle(false, velocity);
    }

    fn settle(&mut self, commit: bool, velocity: f32) {
        let event = if commit {
            PhaseEvent::Commit
        } else {
            PhaseEvent::Cancel
        };
        if self.choreographer.phase.send(event).is_none() {
            return;
        }

        let context = self.choreographer.context;
        self.choreographer.cancelled = !commit;
        let goal = context.map_fraction(if commit { 1.0 } else { 0.0 });
        let direction = Direction::toward(goal);
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };
        let member_velocity = if context.is_inverted() { -velocity } else { velocity };

        for id in self.choreographer.members.iter() {
            if let Some(anim) = self.animations.get_mut(*id) {
                anim.settle_toward(direction, !commit, Some(member_velocity));
            }
        }
        tracing::debug!(
            "choreographer {:?} {} at fraction {:.3}",
            context,
            if commit { "completing" } else { "cancelling" },
            self.choreographer.fraction
        );
    }

    fn scrub_members(&mut self, mut progress: impl FnMut(&AnimationInstance) -> f32) {
        for id in self.choreographer.members.iter() {
            if let Some(anim) = self.animations.get_mut(*id) {
                let p = progress(anim);
                anim.scrub(p);
            }
        }
    }
}
