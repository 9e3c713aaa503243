//! Caller-owned animation groups
//!
//! A group is just a list of handles with fan-out controls. It holds no
//! animation state itself, so members removed from the engine are skipped.

use smallvec::SmallVec;

use crate::engine::{AnimationEngine, AnimationId};
use crate::error::{AnimationError, Result};
use crate::instance::{AnimationState, ReverseMode};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationGroup {
    members: SmallVec<[AnimationId; 8]>,
}

impl AnimationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: AnimationId) -> Self {
        self.add(id);
        self
    }

    /// Add a member; duplicates are ignored
    pub fn add(&mut self, id: AnimationId) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    pub fn remove(&mut self, id: AnimationId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != id);
        before != self.members.len()
    }

    pub fn members(&self) -> &[AnimationId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members still known to the engine and not yet completed
    pub fn active_count(&self, engine: &AnimationEngine) -> usize {
        self.members
            .iter()
            .filter(|id| engine.state(**id).is_some_and(|s| s != AnimationState::Completed))
            .count()
    }

    pub fn play(&self, engine: &mut AnimationEngine) -> usize {
        self.each(engine, AnimationEngine::play)
    }

    pub fn pause(&self, engine: &mut AnimationEngine) -> usize {
        self.each(engine, AnimationEngine::pause)
    }

    pub fn resume(&self, engine: &mut AnimationEngine) -> usize {
        self.each(engine, AnimationEngine::resume)
    }

    pub fn stop(&self, engine: &mut AnimationEngine) -> usize {
        self.each(engine, AnimationEngine::stop)
    }

    pub fn reverse(&self, engine: &mut AnimationEngine, mode: ReverseMode) -> usize {
        self.each(engine, |engine, id| engine.reverse_with(id, mode))
    }

    /// Apply `op` to every member, returning how many were still registered
    fn each(
        &self,
        engine: &mut AnimationEngine,
        mut op: impl FnMut(&mut AnimationEngine, AnimationId) -> Result<AnimationState>,
    ) -> usize {
        let mut reached = 0;
        for id in &self.members {
            match op(engine, *id) {
                Ok(_) => reached += 1,
                Err(AnimationError::UnknownAnimation) => {
                    tracing::trace!("group member {:?} no longer registered", id);
                }
                Err(e) => tracing::warn!("group control failed for {:?}: {}", id, e),
            }
        }
        reached
    }
}
