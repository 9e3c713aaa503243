//! Spring physics
//!
//! Damped harmonic oscillator integrated with semi-implicit Euler.
//! Frame hitches are absorbed by splitting `dt` into equal sub-steps no longer
//! than [`MAX_SUBSTEP_SECS`] and no longer than the spring's own stable step,
//! so one long step and several short ones land on the same trajectory within
//! integration error.

use crate::error::{AnimationError, Result};

/// Upper bound for a single integration sub-step (seconds)
pub const MAX_SUBSTEP_SECS: f32 = 1.0 / 30.0;

/// Hard cap on sub-steps per call; longer hitches are truncated
const MAX_SUBSTEPS: u32 = 10_000;

/// Default position tolerance used by [`Spring::is_settled`]
pub const DEFAULT_REST_EPSILON: f32 = 0.001;

/// Velocity tolerance is `pos_eps * VELOCITY_EPSILON_RATIO` (units per second)
pub const VELOCITY_EPSILON_RATIO: f32 = 1.0;

/// Spring tuning parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Config with unit mass
    pub fn with_stiffness_damping(stiffness: f32, damping: f32) -> Self {
        Self::new(stiffness, damping, 1.0)
    }

    /// More bounce (250, 15)
    pub fn bouncy() -> Self {
        Self::with_stiffness_damping(250.0, 15.0)
    }

    /// Less bounce (400, 40)
    pub fn smooth() -> Self {
        Self::with_stiffness_damping(400.0, 40.0)
    }

    /// Fast, nearly critically damped (500, 35)
    pub fn snappy() -> Self {
        Self::with_stiffness_damping(500.0, 35.0)
    }

    /// Slow and soft (200, 25)
    pub fn gentle() -> Self {
        Self::with_stiffness_damping(200.0, 25.0)
    }

    /// Reject non-positive or non-finite parameters
    pub fn validate(&self) -> Result<()> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(self.stiffness) {
            return Err(AnimationError::InvalidConfiguration(format!(
                "spring stiffness must be > 0, got {}",
                self.stiffness
            )));
        }
        if !valid(self.damping) {
            return Err(AnimationError::InvalidConfiguration(format!(
                "spring damping must be > 0, got {}",
                self.damping
            )));
        }
        if !valid(self.mass) {
            return Err(AnimationError::InvalidConfiguration(format!(
                "spring mass must be > 0, got {}",
                self.mass
            )));
        }
        Ok(())
    }

    /// Largest sub-step for which semi-implicit Euler stays contractive.
    fn stable_step(&self) -> f32 {
        let omega = (self.stiffness / self.mass).sqrt();
        let gamma = self.damping / self.mass;
        MAX_SUBSTEP_SECS.min(0.5 / omega).min(0.5 / gamma)
    }
}

/// Balanced default (300, 30)
impl Default for SpringConfig {
    fn default() -> Self {
        Self::with_stiffness_damping(300.0, 30.0)
    }
}

/// A spring-driven value
#[derive(Clone, Copy, Debug)]
pub struct Spring {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    /// Create a spring resting at `initial`
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            position: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    /// Create a spring after validating its configuration
    pub fn try_new(config: SpringConfig, initial: f32) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config, initial))
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    pub fn value(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Inject velocity (units per second), e.g. on gesture hand-off
    pub fn set_velocity(&mut self, velocity: f32) {
        if velocity.is_finite() {
            self.velocity = velocity;
        }
    }

    /// Jump to `value` with zero velocity
    pub fn reset(&mut self, value: f32) {
        self.position = value;
        self.velocity = 0.0;
    }

    /// Snap onto the target and stop
    pub fn settle(&mut self) {
        self.position = self.target;
        self.velocity = 0.0;
    }

    /// Advance toward the current target by `dt` seconds.
    ///
    /// `dt <= 0` and non-finite `dt` are no-ops.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let max_step = self.config.stable_step();
        let mut steps = (dt / max_step).ceil() as u32;
        let mut h = dt / steps.max(1) as f32;
        if steps > MAX_SUBSTEPS {
            steps = MAX_SUBSTEPS;
            h = max_step;
        }

        let SpringConfig {
            stiffness,
            damping,
            mass,
        } = self.config;
        for _ in 0..steps.max(1) {
            let accel = (-stiffness * (self.position - self.target) - damping * self.velocity) / mass;
            self.velocity += accel * h;
            self.position += self.velocity * h;
        }
    }

    /// Set the target and advance by `dt` seconds, returning the new position
    pub fn update(&mut self, target: f32, dt: f32) -> f32 {
        self.target = target;
        self.step(dt);
        self.position
    }

    /// Rest test with a velocity tolerance derived from `pos_eps`
    pub fn is_at_rest(&self, target: f32, pos_eps: f32) -> bool {
        self.is_at_rest_within(target, pos_eps, pos_eps * VELOCITY_EPSILON_RATIO)
    }

    pub fn is_at_rest_within(&self, target: f32, pos_eps: f32, vel_eps: f32) -> bool {
        (self.position - target).abs() < pos_eps && self.velocity.abs() < vel_eps
    }

    /// At rest on its own target with the default tolerance
    pub fn is_settled(&self) -> bool {
        self.is_at_rest(self.target, DEFAULT_REST_EPSILON)
    }
}
