#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use kinetic_animation::{AnimatableProperty, AnimationEngine, RenderSink, TargetId};
use tracing_subscriber::EnvFilter;

pub const FRAME_MS: f32 = 1000.0 / 60.0;

/// Route engine logs to the test harness; `RUST_LOG=kinetic_animation=trace`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory render layer recording every write
#[derive(Debug, Default)]
pub struct TestSink {
    pub values: HashMap<(TargetId, AnimatableProperty), f32>,
    pub writes: Vec<(TargetId, AnimatableProperty, f32)>,
    pub removed: HashSet<TargetId>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, target: TargetId, property: AnimatableProperty, value: f32) -> Self {
        self.values.insert((target, property), value);
        self
    }

    pub fn get(&self, target: TargetId, property: AnimatableProperty) -> Option<f32> {
        self.values.get(&(target, property)).copied()
    }

    /// Writes to one key during the last `tick`
    pub fn writes_to(&self, target: TargetId, property: AnimatableProperty) -> usize {
        self.writes
            .iter()
            .filter(|(t, p, _)| *t == target && *p == property)
            .count()
    }
}

impl RenderSink for TestSink {
    fn current_value(&self, target: TargetId, property: AnimatableProperty) -> Option<f32> {
        if self.removed.contains(&target) {
            return None;
        }
        Some(self.get(target, property).unwrap_or(property.identity()))
    }

    fn apply(&mut self, target: TargetId, property: AnimatableProperty, value: f32) {
        self.writes.push((target, property, value));
        self.values.insert((target, property), value);
    }

    fn is_live(&self, target: TargetId) -> bool {
        !self.removed.contains(&target)
    }
}

/// One tick with a fresh write log
pub fn frame(engine: &mut AnimationEngine, sink: &mut TestSink, dt_ms: f32) {
    sink.writes.clear();
    engine.tick(dt_ms, sink);
}

pub fn frames(engine: &mut AnimationEngine, sink: &mut TestSink, dt_ms: f32, count: usize) {
    for _ in 0..count {
        frame(engine, sink, dt_ms);
    }
}
