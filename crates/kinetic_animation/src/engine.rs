//! Animation engine
//!
//! Owns every spring, animation, gesture, choreographer and sequencer and
//! advances them from one caller-driven [`AnimationEngine::tick`]. A tick runs
//! in a fixed order:
//!
//! 0. queued gesture commands are applied
//! 1. springs step (free springs and spring-timed animations)
//! 2. animation clocks and sequencer timelines advance, pending claims are
//!    taken, start values resolve
//! 3. choreographers observe their members
//! 4. values are written to the [`RenderSink`], once per `(target, property)`
//!
//! The `(target, property)` ownership table decides who may write a key.
//! A non-additive animation claims its keys when it goes live: at once for
//! engine control calls, at the next tick for choreographer and gesture
//! hand-offs, and while the playhead is inside its window for sequencer steps.
//! A live previous owner is evicted; an idle or finished one, or a step of the
//! same sequencer, simply loses the key. Additive animations never own keys;
//! their deltas are summed on top of the owner's value (or the value the key
//! had when they started).

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::animation::{AnimationBuilder, AnimationSpec};
use crate::choreographer::{Choreographer, ChoreographerMut};
use crate::completion::{AnimationOutcome, CompletionSignal};
use crate::error::{AnimationError, Result};
use crate::gesture::{GestureCommand, GestureController, GestureTarget};
use crate::instance::{AnimationInstance, AnimationState, Direction, ReverseMode};
use crate::property::{AnimatableProperty, RenderSink, TargetId};
use crate::sequencer::{Sequencer, SequencerMut};
use crate::spring::Spring;

new_key_type! {
    pub struct AnimationId;
    pub struct SpringId;
    pub struct GestureId;
    pub struct ChoreographerId;
    pub struct SequencerId;
}

type PropertyKey = (TargetId, AnimatableProperty);

/// Additive composition state for one key
#[derive(Clone, Copy, Debug)]
struct AdditiveBase {
    /// Value underneath the deltas: the owner's latest value, else the value
    /// the key had when the first additive animation arrived
    base: f32,
    /// Final deltas of additive animations that already finished
    settled: f32,
}

/// Per-key accumulator for one present phase
#[derive(Clone, Copy, Debug, Default)]
struct Composite {
    owned: Option<f32>,
    delta: f32,
    additive: bool,
}

/// The engine that ticks all animation state
pub struct AnimationEngine {
    springs: SlotMap<SpringId, Spring>,
    animations: SlotMap<AnimationId, AnimationInstance>,
    owners: FxHashMap<PropertyKey, AnimationId>,
    additive: FxHashMap<PropertyKey, AdditiveBase>,
    gestures: SlotMap<GestureId, GestureController>,
    choreographers: SlotMap<ChoreographerId, Choreographer>,
    sequencers: SlotMap<SequencerId, Sequencer>,
    frame: u64,
    elapsed_ms: f64,
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self {
            springs: SlotMap::with_key(),
            animations: SlotMap::with_key(),
            owners: FxHashMap::default(),
            additive: FxHashMap::default(),
            gestures: SlotMap::with_key(),
            choreographers: SlotMap::with_key(),
            sequencers: SlotMap::with_key(),
            frame: 0,
            elapsed_ms: 0.0,
        }
    }

    /// Number of ticks run so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Sum of every `dt` passed to [`tick`](Self::tick)
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    // ========================================================================
    // Animations
    // ========================================================================

    /// Register an animation in Idle. Its keys are claimed once it goes live.
    pub fn create(&mut self, spec: AnimationSpec) -> AnimationId {
        let target = spec.target();
        let id = self.animations.insert(AnimationInstance::new(spec));
        tracing::debug!("animation {:?} created for {:?}", id, target);
        id
    }

    /// Register an animation and start it, evicting the live owner of its keys
    pub fn start(&mut self, spec: AnimationSpec) -> AnimationId {
        let id = self.create(spec);
        if let Some(anim) = self.animations.get_mut(id) {
            anim.play();
        }
        self.claim_if_requested(id);
        id
    }

    /// Build and start in one step
    pub fn animate(&mut self, builder: AnimationBuilder) -> Result<AnimationId> {
        Ok(self.start(builder.build()?))
    }

    pub fn play(&mut self, id: AnimationId) -> Result<AnimationState> {
        self.control(id, "play", AnimationInstance::play)
    }

    pub fn pause(&mut self, id: AnimationId) -> Result<AnimationState> {
        self.control(id, "pause", AnimationInstance::pause)
    }

    pub fn resume(&mut self, id: AnimationId) -> Result<AnimationState> {
        self.control(id, "resume", AnimationInstance::resume)
    }

    /// Reverse keeping spring momentum
    pub fn reverse(&mut self, id: AnimationId) -> Result<AnimationState> {
        self.reverse_with(id, ReverseMode::default())
    }

    pub fn reverse_with(&mut self, id: AnimationId, mode: ReverseMode) -> Result<AnimationState> {
        self.control(id, "reverse", |anim| anim.reverse(mode))
    }

    /// Enter scrub mode at `fraction` (clamped to [0, 1])
    pub fn set_fraction_complete(&mut self, id: AnimationId, fraction: f32) -> Result<AnimationState> {
        self.control(id, "set_fraction_complete", |anim| anim.scrub(fraction))
    }

    /// Complete immediately with [`AnimationOutcome::Stopped`]
    pub fn stop(&mut self, id: AnimationId) -> Result<AnimationState> {
        let anim = self
            .animations
            .get_mut(id)
            .ok_or(AnimationError::UnknownAnimation)?;
        if anim.is_completed() {
            tracing::warn!("stop ignored: animation {:?} already completed", id);
            return Ok(AnimationState::Completed);
        }

        anim.terminate(AnimationOutcome::Stopped);
        tracing::debug!("animation {:?} stopped", id);
        self.release(id);
        self.detach(id);
        Ok(AnimationState::Completed)
    }

    fn control(
        &mut self,
        id: AnimationId,
        op: &str,
        f: impl FnOnce(&mut AnimationInstance) -> AnimationState,
    ) -> Result<AnimationState> {
        let anim = self
            .animations
            .get_mut(id)
            .ok_or(AnimationError::UnknownAnimation)?;
        if anim.is_completed() {
            tracing::warn!("{} ignored: animation {:?} already completed", op, id);
        }
        let state = f(anim);
        self.claim_if_requested(id);
        Ok(state)
    }

    /// Future resolving when the animation reaches a terminal state
    pub fn completion(&mut self, id: AnimationId) -> Result<CompletionSignal> {
        self.animations
            .get_mut(id)
            .map(AnimationInstance::subscribe)
            .ok_or(AnimationError::UnknownAnimation)
    }

    /// Callback for per-tick faults (e.g. the target went away)
    pub fn on_error(
        &mut self,
        id: AnimationId,
        callback: impl FnMut(&AnimationError) + 'static,
    ) -> Result<()> {
        let anim = self
            .animations
            .get_mut(id)
            .ok_or(AnimationError::UnknownAnimation)?;
        anim.set_error_callback(Box::new(callback));
        Ok(())
    }

    pub fn get_animation(&self, id: AnimationId) -> Option<&AnimationInstance> {
        self.animations.get(id)
    }

    pub fn state(&self, id: AnimationId) -> Option<AnimationState> {
        self.animations.get(id).map(AnimationInstance::state)
    }

    pub fn direction(&self, id: AnimationId) -> Option<Direction> {
        self.animations.get(id).map(AnimationInstance::direction)
    }

    pub fn fraction_complete(&self, id: AnimationId) -> Option<f32> {
        self.animations.get(id).map(AnimationInstance::fraction_complete)
    }

    /// Last value computed for one property of an animation
    pub fn value(&self, id: AnimationId, property: AnimatableProperty) -> Option<f32> {
        self.animations.get(id)?.value(property)
    }

    /// Animation currently owning a key
    pub fn owner_of(&self, target: TargetId, property: AnimatableProperty) -> Option<AnimationId> {
        self.owners.get(&(target, property)).copied()
    }

    /// Drop an animation. Pending completion waiters see `Cancelled`.
    pub fn remove(&mut self, id: AnimationId) -> bool {
        if !self.animations.contains_key(id) {
            return false;
        }
        self.release(id);
        self.detach(id);
        self.animations.remove(id).is_some()
    }

    /// Drop completed animations no choreographer or sequencer refers to
    pub fn gc_completed(&mut self) -> usize {
        let referenced: FxHashSet<AnimationId> = self
            .choreographers
            .values()
            .flat_map(|c| c.members().iter().copied())
            .chain(
                self.sequencers
                    .values()
                    .flat_map(|s| s.steps().iter().map(|step| step.animation)),
            )
            .collect();
        let done: SmallVec<[AnimationId; 8]> = self
            .animations
            .iter()
            .filter(|(id, anim)| anim.is_completed() && !referenced.contains(id))
            .map(|(id, _)| id)
            .collect();

        for id in &done {
            self.release(*id);
            self.animations.remove(*id);
        }
        if !done.is_empty() {
            tracing::debug!("collected {} completed animations", done.len());
        }
        done.len()
    }

    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Whether another tick would change anything
    pub fn has_active_animations(&self) -> bool {
        self.springs.values().any(|s| !s.is_settled())
            || self
                .animations
                .values()
                .any(|a| a.state() == AnimationState::Running)
            || self.sequencers.values().any(Sequencer::is_running)
    }

    // ========================================================================
    // Springs
    // ========================================================================

    pub fn add_spring(&mut self, spring: Spring) -> SpringId {
        self.springs.insert(spring)
    }

    pub fn get_spring(&self, id: SpringId) -> Option<&Spring> {
        self.springs.get(id)
    }

    pub fn get_spring_mut(&mut self, id: SpringId) -> Option<&mut Spring> {
        self.springs.get_mut(id)
    }

    pub fn remove_spring(&mut self, id: SpringId) -> Option<Spring> {
        for gesture in self.gestures.values_mut() {
            if gesture.bound_spring() == Some(id) {
                gesture.unbind_spring();
            }
        }
        self.springs.remove(id)
    }

    pub fn springs_iter(&self) -> impl Iterator<Item = (SpringId, &Spring)> {
        self.springs.iter()
    }

    pub fn springs_iter_mut(&mut self) -> impl Iterator<Item = (SpringId, &mut Spring)> {
        self.springs.iter_mut()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    // ========================================================================
    // Gestures
    // ========================================================================

    pub fn add_gesture(&mut self, gesture: GestureController) -> GestureId {
        self.gestures.insert(gesture)
    }

    pub fn get_gesture(&self, id: GestureId) -> Option<&GestureController> {
        self.gestures.get(id)
    }

    pub fn get_gesture_mut(&mut self, id: GestureId) -> Option<&mut GestureController> {
        self.gestures.get_mut(id)
    }

    pub fn remove_gesture(&mut self, id: GestureId) -> Option<GestureController> {
        self.gestures.remove(id)
    }

    /// Connect a gesture to an animation or choreographer, checking both exist
    pub fn connect_gesture(&mut self, id: GestureId, target: GestureTarget) -> Result<()> {
        match target {
            GestureTarget::Animation(anim) if !self.animations.contains_key(anim) => {
                return Err(AnimationError::UnknownAnimation);
            }
            GestureTarget::Choreographer(c) if !self.choreographers.contains_key(c) => {
                return Err(AnimationError::UnknownChoreographer);
            }
            _ => {}
        }
        let gesture = self
            .gestures
            .get_mut(id)
            .ok_or(AnimationError::UnknownGesture)?;
        gesture.connect(target);
        Ok(())
    }

    /// Let a gesture drive a free spring
    pub fn bind_gesture_spring(&mut self, id: GestureId, spring: SpringId) -> Result<()> {
        if !self.springs.contains_key(spring) {
            return Err(AnimationError::UnknownSpring);
        }
        let gesture = self
            .gestures
            .get_mut(id)
            .ok_or(AnimationError::UnknownGesture)?;
        gesture.bind_spring(spring);
        Ok(())
    }

    // ========================================================================
    // Choreographers
    // ========================================================================

    pub fn add_choreographer(&mut self, choreographer: Choreographer) -> ChoreographerId {
        self.choreographers.insert(choreographer)
    }

    pub fn get_choreographer(&self, id: ChoreographerId) -> Option<&Choreographer> {
        self.choreographers.get(id)
    }

    pub fn get_choreographer_mut(&mut self, id: ChoreographerId) -> Option<ChoreographerMut<'_>> {
        let choreographer = self.choreographers.get_mut(id)?;
        Some(ChoreographerMut {
            choreographer,
            animations: &mut self.animations,
        })
    }

    pub fn remove_choreographer(&mut self, id: ChoreographerId) -> Option<Choreographer> {
        for gesture in self.gestures.values_mut() {
            if gesture.connection() == Some(GestureTarget::Choreographer(id)) {
                gesture.disconnect();
            }
        }
        self.choreographers.remove(id)
    }

    // ========================================================================
    // Sequencers
    // ========================================================================

    pub fn add_sequencer(&mut self, sequencer: Sequencer) -> SequencerId {
        self.sequencers.insert(sequencer)
    }

    pub fn get_sequencer(&self, id: SequencerId) -> Option<&Sequencer> {
        self.sequencers.get(id)
    }

    pub fn get_sequencer_mut(&mut self, id: SequencerId) -> Option<SequencerMut<'_>> {
        let sequencer = self.sequencers.get_mut(id)?;
        Some(SequencerMut {
            sequencer,
            animations: &mut self.animations,
        })
    }

    /// Drop a sequencer; its steps go back to their own clocks
    pub fn remove_sequencer(&mut self, id: SequencerId) -> Option<Sequencer> {
        let sequencer = self.sequencers.remove(id)?;
        for step in sequencer.steps() {
            if let Some(anim) = self.animations.get_mut(step.animation) {
                anim.detach_timeline();
                if anim.is_live() {
                    anim.request_claim();
                }
            }
        }
        Some(sequencer)
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    /// Take every key of a non-additive animation
    fn claim(&mut self, id: AnimationId) {
        let Some(anim) = self.animations.get(id) else {
            return;
        };
        if anim.is_additive() || anim.is_completed() {
            return;
        }
        let target = anim.target();
        let properties = anim.spec().properties();
        for property in properties {
            let key = (target, property);
            match self.owners.insert(key, id) {
                Some(prev) if prev != id => {
                    let live = self.animations.get(prev).is_some_and(AnimationInstance::is_live);
                    if live && !self.same_timeline(prev, id) {
                        self.evict(prev);
                    } else {
                        tracing::trace!(
                            "{} on {:?} handed from {:?} to {:?}",
                            property.name(),
                            target,
                            prev,
                            id
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn claim_if_requested(&mut self, id: AnimationId) {
        let requested = self
            .animations
            .get_mut(id)
            .is_some_and(AnimationInstance::take_claim_request);
        if requested {
            self.claim(id);
        }
    }

    /// Claims for this tick: sequencer windows in step order, then hand-offs
    fn claim_pending(&mut self) {
        let mut pending: SmallVec<[AnimationId; 8]> = SmallVec::new();
        for sequencer in self.sequencers.values_mut() {
            pending.extend(sequencer.take_claims());
        }
        for (id, anim) in self.animations.iter_mut() {
            if anim.take_claim_request() {
                pending.push(id);
            }
        }
        for id in pending {
            self.claim(id);
        }
    }

    fn same_timeline(&self, a: AnimationId, b: AnimationId) -> bool {
        self.sequencers
            .values()
            .any(|s| s.contains(a) && s.contains(b))
    }

    fn owns_any(&self, id: AnimationId, anim: &AnimationInstance) -> bool {
        let target = anim.target();
        anim.spec()
            .properties()
            .into_iter()
            .any(|p| self.owners.get(&(target, p)) == Some(&id))
    }

    fn evict(&mut self, id: AnimationId) {
        if let Some(anim) = self.animations.get_mut(id) {
            // Finished handles keep their Finished signal; only the record changes
            anim.terminate(AnimationOutcome::Evicted);
            tracing::debug!("animation {:?} evicted", id);
        }
        self.release(id);
        self.detach(id);
    }

    fn release(&mut self, id: AnimationId) {
        self.owners.retain(|_, owner| *owner != id);
    }

    /// Drop every choreographer and sequencer membership
    fn detach(&mut self, id: AnimationId) {
        for choreographer in self.choreographers.values_mut() {
            choreographer.remove_member(id);
        }
        for sequencer in self.sequencers.values_mut() {
            sequencer.remove_step(id);
        }
        if let Some(anim) = self.animations.get_mut(id) {
            anim.detach_timeline();
        }
    }

    fn fault(&mut self, id: AnimationId, error: AnimationError) {
        tracing::warn!("animation {:?} faulted: {}", id, error);
        if let Some(anim) = self.animations.get_mut(id) {
            anim.fail(error);
        }
        self.release(id);
        self.detach(id);
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Advance everything by `dt_ms` milliseconds and write values to `sink`.
    /// Negative or non-finite `dt_ms` is treated as zero.
    pub fn tick<S: RenderSink + ?Sized>(&mut self, dt_ms: f32, sink: &mut S) {
        let dt_ms = if dt_ms.is_finite() && dt_ms > 0.0 {
            dt_ms
        } else {
            0.0
        };
        self.frame += 1;
        self.elapsed_ms += f64::from(dt_ms);

        self.apply_gesture_commands();

        let dt = dt_ms / 1000.0;
        for spring in self.springs.values_mut() {
            spring.step(dt);
        }
        for anim in self.animations.values_mut() {
            anim.step_spring(dt);
        }

        for anim in self.animations.values_mut() {
            anim.advance(dt_ms);
        }
        for sequencer in self.sequencers.values_mut() {
            sequencer.advance(dt_ms, &mut self.animations);
        }
        self.claim_pending();

        // Non-additive instances without a key (timeline steps outside their
        // window) neither resolve nor present
        let idle_writers: FxHashSet<AnimationId> = self
            .animations
            .iter()
            .filter(|(id, anim)| !anim.is_additive() && !self.owns_any(*id, anim))
            .map(|(id, _)| id)
            .collect();

        let mut faults: SmallVec<[(AnimationId, AnimationError); 2]> = SmallVec::new();
        for (id, anim) in self.animations.iter_mut() {
            if idle_writers.contains(&id) {
                continue;
            }
            if anim.wants_resolve() {
                if let Err(error) = anim.resolve(&*sink) {
                    faults.push((id, error));
                    continue;
                }
            } else if anim.is_presenting() && !sink.is_live(anim.target()) {
                faults.push((id, AnimationError::InvalidTarget(anim.target())));
                continue;
            }
            anim.refresh_values();
        }
        for (id, error) in faults {
            self.fault(id, error);
        }

        for choreographer in self.choreographers.values_mut() {
            choreographer.observe(&self.animations);
        }

        let writes = self.present(sink);
        tracing::trace!(
            "frame {} dt={:.2}ms wrote {} values",
            self.frame,
            dt_ms,
            writes
        );
    }

    /// Compose and write this frame's values, once per key
    fn present<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let mut composed: FxHashMap<PropertyKey, Composite> = FxHashMap::default();
        for (id, anim) in self.animations.iter() {
            if !anim.is_presenting() {
                continue;
            }
            let target = anim.target();
            for &(property, value) in anim.values() {
                let key = (target, property);
                if anim.is_additive() {
                    let slot = composed.entry(key).or_default();
                    slot.delta += value;
                    slot.additive = true;
                } else if self.owners.get(&key) == Some(&id) {
                    composed.entry(key).or_default().owned = Some(value);
                }
            }
        }

        let writes = composed.len();
        for (key, slot) in composed {
            let (target, property) = key;
            let value = if slot.additive || self.additive.contains_key(&key) {
                let entry = self.additive.entry(key).or_insert_with(|| {
                    let base = sink.current_value(target, property).unwrap_or_else(|| {
                        tracing::warn!(
                            "no current {} on {:?}, composing from identity",
                            property.name(),
                            target
                        );
                        property.identity()
                    });
                    AdditiveBase { base, settled: 0.0 }
                });
                if let Some(owned) = slot.owned {
                    entry.base = owned;
                }
                entry.base + entry.settled + slot.delta
            } else {
                match slot.owned {
                    Some(value) => value,
                    None => continue,
                }
            };
            sink.apply(target, property, value);
        }

        self.finish_frame();
        writes
    }

    /// Consume final frames and retire additive state nobody contributes to
    fn finish_frame(&mut self) {
        let mut live: FxHashSet<PropertyKey> = FxHashSet::default();
        for (id, anim) in self.animations.iter_mut() {
            let finishing = anim.take_final_frame();
            if finishing {
                tracing::debug!("animation {:?} finished", id);
            }
            if !anim.is_additive() {
                continue;
            }

            let target = anim.target();
            if finishing {
                for &(property, value) in anim.values() {
                    if let Some(entry) = self.additive.get_mut(&(target, property)) {
                        entry.settled += value;
                    }
                }
            } else if !anim.is_completed() {
                live.extend(anim.spec().properties().into_iter().map(|p| (target, p)));
            }
        }
        self.additive.retain(|key, _| live.contains(key));
    }

    fn apply_gesture_commands(&mut self) {
        for gesture in self.gestures.values_mut() {
            let commands = gesture.take_commands();
            if commands.is_empty() {
                continue;
            }
            let sensitivity = gesture.config().sensitivity;
            let connection = gesture.connection();
            let bound = gesture.bound_spring();

            for command in commands {
                if let Some(spring) = bound.and_then(|id| self.springs.get_mut(id)) {
                    drive_spring(spring, command, sensitivity);
                }
                match connection {
                    Some(GestureTarget::Animation(id)) => {
                        if let Some(anim) = self.animations.get_mut(id) {
                            drive_animation(anim, command, sensitivity);
                        }
                    }
                    Some(GestureTarget::Choreographer(id)) => {
                        if let Some(choreographer) = self.choreographers.get_mut(id) {
                            let mut ctl = ChoreographerMut {
                                choreographer,
                                animations: &mut self.animations,
                            };
                            drive_choreographer(&mut ctl, command, sensitivity);
                        }
                    }
                    None => {}
                }
            }
        }
    }
}

impl Default for AnimationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Bound springs track the dragged displacement, then fly to the decided end
fn drive_spring(spring: &mut Spring, command: GestureCommand, sensitivity: f32) {
    match command {
        GestureCommand::Begin => spring.reset(spring.value()),
        GestureCommand::Scrub { displacement, .. } => {
            spring.reset(displacement);
            spring.set_target(displacement);
        }
        GestureCommand::Release {
            commit,
            displacement,
            velocity,
            ..
        } => {
            spring.reset(displacement);
            spring.set_target(if commit { sensitivity } else { 0.0 });
            spring.set_velocity(velocity);
        }
    }
}

fn drive_animation(anim: &mut AnimationInstance, command: GestureCommand, sensitivity: f32) {
    match command {
        GestureCommand::Begin => {
            let at = anim.fraction_complete();
            anim.scrub(at);
        }
        GestureCommand::Scrub { fraction, .. } => {
            anim.scrub(fraction);
        }
        GestureCommand::Release {
            commit,
            fraction,
            velocity,
            ..
        } => {
            anim.scrub(fraction);
            let velocity = Some(velocity / sensitivity);
            if commit {
                anim.settle_toward(Direction::Forward, false, velocity);
            } else {
                anim.settle_toward(Direction::Reverse, true, velocity);
            }
        }
    }
}

fn drive_choreographer(ctl: &mut ChoreographerMut<'_>, command: GestureCommand, sensitivity: f32) {
    match command {
        GestureCommand::Begin => {
            ctl.begin_interactive();
        }
        GestureCommand::Scrub { fraction, .. } => ctl.update_interactive(fraction),
        GestureCommand::Release {
            commit,
            fraction,
            velocity,
            ..
        } => {
            ctl.update_interactive(fraction);
            if commit {
                ctl.commit_interactive(velocity / sensitivity);
            } else {
                ctl.cancel_with_velocity(velocity / sensitivity);
            }
        }
    }
}
