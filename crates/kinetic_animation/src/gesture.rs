//! Gesture tracking
//!
//! [`GestureController`] turns pointer samples into displacement, a windowed
//! velocity estimate and a 0..1 drag fraction. It never touches animations
//! directly: each ingestion call records a [`GestureCommand`] that the engine
//! applies to the connected animation or choreographer (and the bound spring)
//! at the start of the next tick.

use std::collections::VecDeque;

use kinetic_core::{Axis, GestureSample, PointerEvent, PointerPhase};
use smallvec::SmallVec;

use crate::engine::{AnimationId, ChoreographerId, SpringId};
use crate::error::{AnimationError, Result};

/// Scale for a pressed element
pub const PRESS_SCALE: f32 = 0.95;
/// Scale for a hovered element
pub const HOVER_SCALE: f32 = 1.05;
/// Scale at rest
pub const REST_SCALE: f32 = 1.0;

/// Which axis feeds the drag fraction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GestureAxis {
    /// Whichever axis has moved further since touch down
    #[default]
    Dominant,
    Horizontal,
    Vertical,
}

/// Tuning for a [`GestureController`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Displacement (units) that maps to fraction 1
    pub sensitivity: f32,
    /// Fraction at or above which a release commits
    pub completion_threshold: f32,
    /// Velocity (units/s) along the completing direction that commits regardless of fraction
    pub flick_velocity: f32,
    /// Velocity window (milliseconds)
    pub window_ms: f64,
    pub axis: GestureAxis,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            sensitivity: 500.0,
            completion_threshold: 0.5,
            flick_velocity: 500.0,
            window_ms: 100.0,
            axis: GestureAxis::Dominant,
        }
    }
}

impl GestureConfig {
    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn completion_threshold(mut self, threshold: f32) -> Self {
        self.completion_threshold = threshold;
        self
    }

    pub fn flick_velocity(mut self, velocity: f32) -> Self {
        self.flick_velocity = velocity;
        self
    }

    pub fn window_ms(mut self, window_ms: f64) -> Self {
        self.window_ms = window_ms;
        self
    }

    pub fn axis(mut self, axis: GestureAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(AnimationError::config(format!(
                "gesture sensitivity must be > 0, got {}",
                self.sensitivity
            )));
        }
        if !(0.0..=1.0).contains(&self.completion_threshold) {
            return Err(AnimationError::config(format!(
                "completion threshold must be in [0, 1], got {}",
                self.completion_threshold
            )));
        }
        if !self.flick_velocity.is_finite() || self.flick_velocity <= 0.0 {
            return Err(AnimationError::config("flick velocity must be > 0"));
        }
        if !self.window_ms.is_finite() || self.window_ms <= 0.0 {
            return Err(AnimationError::config("velocity window must be > 0"));
        }
        Ok(())
    }
}

/// What a gesture drives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureTarget {
    Animation(AnimationId),
    Choreographer(ChoreographerId),
}

/// Work recorded by the controller for the engine to apply
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureCommand {
    /// Touch down: take over the connected target
    Begin,
    /// Drag update
    Scrub { fraction: f32, displacement: f32 },
    /// Touch up with the commit decision
    Release {
        commit: bool,
        fraction: f32,
        displacement: f32,
        /// Units per second along the tracked axis
        velocity: f32,
    },
}

/// Outcome of lifting the pointer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureRelease {
    pub commit: bool,
    pub fraction: f32,
    /// Units per second along the tracked axis
    pub velocity: f32,
}

/// Velocity/displacement estimator for one drag interaction
#[derive(Debug, Clone)]
pub struct GestureController {
    config: GestureConfig,
    window: VecDeque<GestureSample>,
    first: Option<GestureSample>,
    tracking: bool,
    connection: Option<GestureTarget>,
    spring: Option<SpringId>,
    commands: SmallVec<[GestureCommand; 4]>,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            window: VecDeque::new(),
            first: None,
            tracking: false,
            connection: None,
            spring: None,
            commands: SmallVec::new(),
        })
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Drive an animation or choreographer from this gesture
    pub fn connect(&mut self, target: GestureTarget) {
        self.connection = Some(target);
    }

    pub fn disconnect(&mut self) {
        self.connection = None;
    }

    pub fn connection(&self) -> Option<GestureTarget> {
        self.connection
    }

    /// Spring that follows the drag and is released with the gesture velocity
    pub fn bind_spring(&mut self, spring: SpringId) {
        self.spring = Some(spring);
    }

    pub fn unbind_spring(&mut self) {
        self.spring = None;
    }

    pub fn bound_spring(&self) -> Option<SpringId> {
        self.spring
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    pub fn on_tap_down(&mut self, x: f32, y: f32, timestamp_ms: f64) {
        let sample = GestureSample::new(timestamp_ms, x, y);
        self.window.clear();
        self.window.push_back(sample);
        self.first = Some(sample);
        self.tracking = true;
        self.commands.clear();
        self.commands.push(GestureCommand::Begin);
    }

    pub fn on_tap_move(&mut self, x: f32, y: f32, timestamp_ms: f64) {
        if !self.tracking {
            return;
        }
        self.push_sample(x, y, timestamp_ms);

        let scrub = GestureCommand::Scrub {
            fraction: self.fraction(),
            displacement: self.axis_displacement(),
        };
        match self.commands.last_mut() {
            Some(last) if matches!(last, GestureCommand::Scrub { .. }) => *last = scrub,
            _ => self.commands.push(scrub),
        }
    }

    /// Lift the pointer; `None` if no gesture was being tracked
    pub fn on_tap_up(&mut self, x: f32, y: f32, timestamp_ms: f64) -> Option<GestureRelease> {
        if !self.tracking {
            return None;
        }
        self.push_sample(x, y, timestamp_ms);
        self.tracking = false;

        let fraction = self.fraction();
        let velocity = self.axis_velocity();
        let commit = fraction >= self.config.completion_threshold
            || velocity >= self.config.flick_velocity;

        tracing::trace!(
            "gesture released: fraction={:.3} velocity={:.1} commit={}",
            fraction,
            velocity,
            commit
        );

        if matches!(self.commands.last(), Some(GestureCommand::Scrub { .. })) {
            self.commands.pop();
        }
        self.commands.push(GestureCommand::Release {
            commit,
            fraction,
            displacement: self.axis_displacement(),
            velocity,
        });

        Some(GestureRelease {
            commit,
            fraction,
            velocity,
        })
    }

    /// Feed a phased pointer event
    pub fn handle(&mut self, event: PointerEvent) -> Option<GestureRelease> {
        let GestureSample { timestamp_ms, x, y } = event.sample;
        match event.phase {
            PointerPhase::Down => {
                self.on_tap_down(x, y, timestamp_ms);
                None
            }
            PointerPhase::Move => {
                self.on_tap_move(x, y, timestamp_ms);
                None
            }
            PointerPhase::Up => self.on_tap_up(x, y, timestamp_ms),
        }
    }

    /// Abandon the gesture and send the target back to its origin
    pub fn cancel(&mut self) {
        if !self.tracking {
            return;
        }
        self.tracking = false;
        self.commands.push(GestureCommand::Release {
            commit: false,
            fraction: self.fraction(),
            displacement: self.axis_displacement(),
            velocity: 0.0,
        });
    }

    fn push_sample(&mut self, x: f32, y: f32, timestamp_ms: f64) {
        // Keep the window monotonic even if the caller's clock stutters
        let last_t = self.window.back().map_or(timestamp_ms, |s| s.timestamp_ms);
        let sample = GestureSample::new(timestamp_ms.max(last_t), x, y);
        self.window.push_back(sample);

        let cutoff = sample.timestamp_ms - self.config.window_ms;
        while self.window.len() > 1 && self.window.front().is_some_and(|s| s.timestamp_ms < cutoff) {
            self.window.pop_front();
        }
    }

    pub(crate) fn take_commands(&mut self) -> SmallVec<[GestureCommand; 4]> {
        std::mem::take(&mut self.commands)
    }

    // ========================================================================
    // Derived quantities
    // ========================================================================

    /// Net movement since touch down (newest minus first sample)
    pub fn displacement(&self) -> (f32, f32) {
        match (self.first, self.window.back()) {
            (Some(first), Some(newest)) => newest.delta_from(&first),
            _ => (0.0, 0.0),
        }
    }

    /// Axis feeding the fraction
    pub fn tracked_axis(&self) -> Axis {
        match self.config.axis {
            GestureAxis::Horizontal => Axis::Horizontal,
            GestureAxis::Vertical => Axis::Vertical,
            GestureAxis::Dominant => {
                let (dx, dy) = self.displacement();
                if dx.abs() >= dy.abs() {
                    Axis::Horizontal
                } else {
                    Axis::Vertical
                }
            }
        }
    }

    pub fn axis_displacement(&self) -> f32 {
        let (dx, dy) = self.displacement();
        match self.tracked_axis() {
            Axis::Horizontal => dx,
            Axis::Vertical => dy,
        }
    }

    /// Windowed velocity in units per second
    pub fn velocity(&self) -> (f32, f32) {
        let (Some(oldest), Some(newest)) = (self.window.front(), self.window.back()) else {
            return (0.0, 0.0);
        };
        let dt = newest.elapsed_since(oldest);
        if self.window.len() < 2 || dt <= 0.0 {
            return (0.0, 0.0);
        }
        let (dx, dy) = newest.delta_from(oldest);
        let per_sec = (1000.0 / dt) as f32;
        (dx * per_sec, dy * per_sec)
    }

    pub fn axis_velocity(&self) -> f32 {
        let (vx, vy) = self.velocity();
        match self.tracked_axis() {
            Axis::Horizontal => vx,
            Axis::Vertical => vy,
        }
    }

    /// Drag progress in [0, 1]; positive axis direction completes
    pub fn fraction(&self) -> f32 {
        (self.axis_displacement() / self.config.sensitivity).clamp(0.0, 1.0)
    }

    // ========================================================================
    // Affordances
    // ========================================================================

    pub fn on_press(pressed: bool) -> f32 {
        if pressed {
            PRESS_SCALE
        } else {
            REST_SCALE
        }
    }

    pub fn on_hover(hovered: bool) -> f32 {
        if hovered {
            HOVER_SCALE
        } else {
            REST_SCALE
        }
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self {
            config: GestureConfig::default(),
            window: VecDeque::new(),
            first: None,
            tracking: false,
            connection: None,
            spring: None,
            commands: SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_axis_fraction() {
        let mut gesture = GestureController::default();
        gesture.on_tap_down(10.0, 10.0, 0.0);
        gesture.on_tap_move(150.0, 30.0, 16.0);
        gesture.on_tap_move(260.0, 40.0, 32.0);

        assert_eq!(gesture.tracked_axis(), Axis::Horizontal);
        assert_eq!(gesture.displacement(), (250.0, 30.0));
        assert_eq!(gesture.fraction(), 0.5);
    }

    #[test]
    fn test_fraction_clamped() {
        let mut gesture = GestureController::default();
        gesture.on_tap_down(0.0, 0.0, 0.0);
        gesture.on_tap_move(0.0, -900.0, 10.0);
        assert_eq!(gesture.tracked_axis(), Axis::Vertical);
        assert_eq!(gesture.fraction(), 0.0);

        gesture.on_tap_move(0.0, 2000.0, 20.0);
        assert_eq!(gesture.fraction(), 1.0);
    }

    #[test]
    fn test_velocity_uses_window_only() {
        let mut gesture = GestureController::default();
        gesture.on_tap_down(0.0, 0.0, 0.0);
        // Slow start, then a fast flick
        gesture.on_tap_move(10.0, 0.0, 200.0);
        gesture.on_tap_move(20.0, 0.0, 400.0);
        gesture.on_tap_move(70.0, 0.0, 450.0);
        gesture.on_tap_move(120.0, 0.0, 500.0);

        // Window holds 400..500: 100 units in 100ms
        let (vx, vy) = gesture.velocity();
        assert!((vx - 1000.0).abs() < 1e-3);
        assert_eq!(vy, 0.0);
        // Displacement still covers the whole gesture
        assert_eq!(gesture.displacement().0, 120.0);
    }

    #[test]
    fn test_release_commits_past_threshold() {
        let mut gesture = GestureController::default();
        gesture.on_tap_down(0.0, 0.0, 0.0);
        gesture.on_tap_move(200.0, 0.0, 500.0);
        let release = gesture.on_tap_up(300.0, 0.0, 1000.0).unwrap();
        assert!(release.commit);
        assert!(!gesture.is_tracking());
    }

    #[test]
    fn test_flick_commits_below_threshold() {
        let mut gesture = GestureController::default();
        gesture.on_tap_down(0.0, 0.0, 0.0);
        gesture.on_tap_move(40.0, 0.0, 20.0);
        let release = gesture.on_tap_up(80.0, 0.0, 40.0).unwrap();
        assert!(release.fraction < 0.5);
        assert!(release.velocity > 500.0);
        assert!(release.commit);
    }

    #[test]
    fn test_slow_short_drag_cancels() {
        let mut gesture = GestureController::default();
        gesture.on_tap_down(0.0, 0.0, 0.0);
        gesture.on_tap_move(50.0, 0.0, 400.0);
        let release = gesture.on_tap_up(60.0, 0.0, 800.0).unwrap();
        assert!(!release.commit);
        // Flicking backwards never commits
        gesture.on_tap_down(0.0, 0.0, 1000.0);
        gesture.on_tap_move(-100.0, 0.0, 1020.0);
        assert!(!gesture.on_tap_up(-200.0, 0.0, 1040.0).unwrap().commit);
    }

    #[test]
    fn test_commands_coalesce_scrubs() {
        let mut gesture = GestureController::default();
        gesture.on_tap_down(0.0, 0.0, 0.0);
        gesture.on_tap_move(100.0, 0.0, 10.0);
        gesture.on_tap_move(200.0, 0.0, 20.0);

        let commands = gesture.take_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], GestureCommand::Begin);
        assert_eq!(
            commands[1],
            GestureCommand::Scrub {
                fraction: 0.4,
                displacement: 200.0
            }
        );

        gesture.on_tap_up(200.0, 0.0, 30.0);
        let commands = gesture.take_commands();
        assert!(matches!(commands.as_slice(), [GestureCommand::Release { .. }]));
    }

    #[test]
    fn test_moves_without_down_are_ignored() {
        let mut gesture = GestureController::default();
        gesture.on_tap_move(100.0, 0.0, 10.0);
        assert_eq!(gesture.fraction(), 0.0);
        assert!(gesture.on_tap_up(100.0, 0.0, 20.0).is_none());
        assert!(gesture.take_commands().is_empty());
    }

    #[test]
    fn test_affordance_constants() {
        assert_eq!(GestureController::on_press(true), 0.95);
        assert_eq!(GestureController::on_press(false), 1.0);
        assert_eq!(GestureController::on_hover(true), 1.05);
        assert_eq!(GestureController::on_hover(false), 1.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(GestureController::new(GestureConfig::default().sensitivity(0.0)).is_err());
        assert!(GestureController::new(GestureConfig::default().completion_threshold(1.5)).is_err());
        assert!(GestureController::new(GestureConfig::default().window_ms(0.0)).is_err());
        assert!(GestureController::new(GestureConfig::default().axis(GestureAxis::Vertical)).is_ok());
    }
}
