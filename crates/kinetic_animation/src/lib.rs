//! Kinetic Animation System
//!
//! Interruptible property animations driven by one caller-owned frame tick.
//!
//! # Features
//!
//! - **Spring Physics**: sub-stepped damped springs with stiffness, damping, mass
//! - **Timing Curves**: cubic-bezier presets, linear, or spring-timed progress
//! - **Keyframes**: per-property bracketing with local easing
//! - **Colors**: RGBA properties animated channel by channel
//! - **Interruptible**: pause, scrub, reverse with preserved momentum
//! - **Ownership**: one owner per `(target, property)`, additive layering on top
//! - **Gestures**: windowed velocity tracking with commit/cancel hand-off
//! - **Choreography**: interactive present/dismiss transitions
//! - **Sequencing**: `then`/`with`/`overlap` timelines with global seeking
//!
//! # Example
//!
//! ```rust
//! use kinetic_animation::{AnimatableProperty, AnimationEngine, AnimationSpec, RenderSink, TargetId};
//!
//! struct Layer(f32);
//!
//! impl RenderSink for Layer {
//!     fn current_value(&self, _: TargetId, _: AnimatableProperty) -> Option<f32> {
//!         Some(self.0)
//!     }
//!     fn apply(&mut self, _: TargetId, _: AnimatableProperty, value: f32) {
//!         self.0 = value;
//!     }
//! }
//!
//! let mut engine = AnimationEngine::new();
//! let mut layer = Layer(0.0);
//! let spec = AnimationSpec::builder(TargetId(1))
//!     .animate(AnimatableProperty::Opacity, 1.0)
//!     .linear()
//!     .duration(100.0)
//!     .build()
//!     .unwrap();
//! engine.start(spec);
//!
//! engine.tick(50.0, &mut layer);
//! assert_eq!(layer.0, 0.5);
//! ```

pub mod animation;
pub mod choreographer;
pub mod completion;
pub mod easing;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod group;
pub mod instance;
pub mod keyframe;
pub mod presets;
pub mod property;
pub mod sequencer;
pub mod spring;

pub use animation::{AnimationBuilder, AnimationSpec, Motion, DEFAULT_DURATION_MS, REPEAT_FOREVER};
pub use choreographer::{
    Choreographer, ChoreographerConfig, ChoreographerMut, ChoreographerPhase, TransitionContext,
};
pub use completion::{AnimationOutcome, CompletionSignal};
pub use easing::{CubicBezier, TimingCurve};
pub use engine::{AnimationEngine, AnimationId, ChoreographerId, GestureId, SequencerId, SpringId};
pub use error::{AnimationError, Result};
pub use gesture::{
    GestureAxis, GestureCommand, GestureConfig, GestureController, GestureRelease, GestureTarget,
};
pub use group::AnimationGroup;
pub use instance::{AnimationInstance, AnimationState, Direction, ErrorCallback, ReverseMode};
pub use keyframe::Keyframe;
pub use presets::{AnimationPreset, Edge};
pub use property::{
    AnimatableProperty, ColorChannel, ColorProperty, PropertyDelta, RenderSink, Rgba, TargetId,
};
pub use sequencer::{SequenceStep, Sequencer, SequencerMut};
pub use spring::{Spring, SpringConfig};
