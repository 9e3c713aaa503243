//! Animation specifications
//!
//! [`AnimationSpec`] is an immutable description assembled through
//! [`AnimationBuilder`]. The engine snapshots it into a runtime instance on
//! start; the spec itself is never mutated afterwards.

use smallvec::SmallVec;

use crate::easing::TimingCurve;
use crate::error::{AnimationError, Result};
use crate::keyframe::{self, Keyframe};
use crate::property::{AnimatableProperty, ColorChannel, ColorProperty, PropertyDelta, Rgba, TargetId};
use crate::spring::SpringConfig;

/// `repeat_count` value for endless repetition
pub const REPEAT_FOREVER: i32 = -1;

/// Duration used when none is set (milliseconds)
pub const DEFAULT_DURATION_MS: f32 = 400.0;

/// What an animation moves
#[derive(Clone, Debug, PartialEq)]
pub enum Motion {
    /// Per-property start/end pairs
    Properties(SmallVec<[PropertyDelta; 4]>),
    /// Values placed at normalized times
    Keyframes(Vec<Keyframe>),
}

/// Validated, immutable animation configuration
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSpec {
    target: TargetId,
    motion: Motion,
    curve: TimingCurve,
    duration_ms: f32,
    delay_ms: f32,
    repeat_count: i32,
    auto_reverse: bool,
    additive: bool,
    initial_velocity: f32,
}

impl AnimationSpec {
    pub fn builder(target: TargetId) -> AnimationBuilder {
        AnimationBuilder::new(target)
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn curve(&self) -> &TimingCurve {
        &self.curve
    }

    /// Nominal duration; pure spring runs finish when the spring rests
    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn delay_ms(&self) -> f32 {
        self.delay_ms
    }

    /// Total passes, or [`REPEAT_FOREVER`]
    pub fn repeat_count(&self) -> i32 {
        self.repeat_count
    }

    pub fn auto_reverse(&self) -> bool {
        self.auto_reverse
    }

    pub fn is_additive(&self) -> bool {
        self.additive
    }

    /// Initial normalized velocity for spring-timed runs (per second)
    pub fn initial_velocity(&self) -> f32 {
        self.initial_velocity
    }

    /// Properties this animation writes
    pub fn properties(&self) -> SmallVec<[AnimatableProperty; 4]> {
        match &self.motion {
            Motion::Properties(deltas) => deltas.iter().map(|d| d.property).collect(),
            Motion::Keyframes(kfs) => keyframe::properties(kfs),
        }
    }
}

/// Fluent builder for [`AnimationSpec`]
#[derive(Clone, Debug)]
pub struct AnimationBuilder {
    target: TargetId,
    deltas: SmallVec<[PropertyDelta; 4]>,
    keyframes: Vec<Keyframe>,
    curve: TimingCurve,
    duration_ms: f32,
    delay_ms: f32,
    repeat_count: i32,
    auto_reverse: bool,
    additive: bool,
    initial_velocity: f32,
}

impl AnimationBuilder {
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            deltas: SmallVec::new(),
            keyframes: Vec::new(),
            curve: TimingCurve::default(),
            duration_ms: DEFAULT_DURATION_MS,
            delay_ms: 0.0,
            repeat_count: 1,
            auto_reverse: false,
            additive: false,
            initial_velocity: 0.0,
        }
    }

    /// Animate from the rendered value to `to`
    pub fn animate(mut self, property: AnimatableProperty, to: f32) -> Self {
        self.deltas.push(PropertyDelta::to(property, to));
        self
    }

    pub fn animate_from(mut self, property: AnimatableProperty, from: f32, to: f32) -> Self {
        self.deltas.push(PropertyDelta::from_to(property, from, to));
        self
    }

    /// Animate all four channels of a color from the rendered color to `to`
    pub fn animate_color(mut self, property: ColorProperty, to: Rgba) -> Self {
        for channel in ColorChannel::ALL {
            self.deltas.push(PropertyDelta::to(
                AnimatableProperty::Color(property, channel),
                to.channel(channel),
            ));
        }
        self
    }

    pub fn animate_color_from(mut self, property: ColorProperty, from: Rgba, to: Rgba) -> Self {
        for channel in ColorChannel::ALL {
            self.deltas.push(PropertyDelta::from_to(
                AnimatableProperty::Color(property, channel),
                from.channel(channel),
                to.channel(channel),
            ));
        }
        self
    }

    pub fn keyframe(mut self, keyframe: Keyframe) -> Self {
        self.keyframes.push(keyframe);
        self
    }

    pub fn keyframes(mut self, keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        self.keyframes.extend(keyframes);
        self
    }

    pub fn curve(mut self, curve: TimingCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn smooth(self) -> Self {
        self.curve(TimingCurve::smooth())
    }

    pub fn snappy(self) -> Self {
        self.curve(TimingCurve::snappy())
    }

    pub fn bounce(self) -> Self {
        self.curve(TimingCurve::bounce())
    }

    pub fn ease_in(self) -> Self {
        self.curve(TimingCurve::ease_in())
    }

    pub fn ease_out(self) -> Self {
        self.curve(TimingCurve::ease_out())
    }

    pub fn ease_in_out(self) -> Self {
        self.curve(TimingCurve::ease_in_out())
    }

    pub fn linear(self) -> Self {
        self.curve(TimingCurve::Linear)
    }

    pub fn cubic(self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.curve(TimingCurve::cubic(x1, y1, x2, y2))
    }

    /// Spring timing; the run ends when the spring comes to rest
    pub fn spring(self, config: SpringConfig) -> Self {
        self.curve(TimingCurve::Spring(config))
    }

    pub fn duration(mut self, ms: f32) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn delay(mut self, ms: f32) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Total number of passes (1 = play once)
    pub fn repeat(mut self, count: i32) -> Self {
        self.repeat_count = count;
        self
    }

    pub fn repeat_forever(self) -> Self {
        self.repeat(REPEAT_FOREVER)
    }

    /// Alternate direction between passes
    pub fn auto_reverse(mut self, enabled: bool) -> Self {
        self.auto_reverse = enabled;
        self
    }

    /// Sum onto the rendered value instead of replacing it
    pub fn additive(mut self, enabled: bool) -> Self {
        self.additive = enabled;
        self
    }

    pub fn initial_velocity(mut self, velocity: f32) -> Self {
        self.initial_velocity = velocity;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<AnimationSpec> {
        let motion = match (self.deltas.is_empty(), self.keyframes.is_empty()) {
            (true, true) => return Err(AnimationError::config("animation has no properties")),
            (false, false) => {
                return Err(AnimationError::config(
                    "property deltas and keyframes cannot be mixed",
                ))
            }
            (false, true) => {
                for (i, delta) in self.deltas.iter().enumerate() {
                    if self.deltas[..i].iter().any(|d| d.property == delta.property) {
                        return Err(AnimationError::config(format!(
                            "property {} animated twice",
                            delta.property.name()
                        )));
                    }
                    if !delta.to.is_finite() || delta.from.is_some_and(|v| !v.is_finite()) {
                        return Err(AnimationError::config(format!(
                            "property {} has a non-finite value",
                            delta.property.name()
                        )));
                    }
                }
                Motion::Properties(self.deltas)
            }
            (true, false) => {
                keyframe::validate(&self.keyframes)?;
                Motion::Keyframes(self.keyframes)
            }
        };

        self.curve.validate()?;

        if !self.duration_ms.is_finite() || self.duration_ms <= 0.0 {
            return Err(AnimationError::config(format!(
                "duration must be > 0, got {}",
                self.duration_ms
            )));
        }
        if !self.delay_ms.is_finite() || self.delay_ms < 0.0 {
            return Err(AnimationError::config(format!(
                "delay must be >= 0, got {}",
                self.delay_ms
            )));
        }
        if self.repeat_count == 0 || self.repeat_count < REPEAT_FOREVER {
            return Err(AnimationError::config(format!(
                "repeat count must be >= 1 or -1, got {}",
                self.repeat_count
            )));
        }
        if !self.initial_velocity.is_finite() {
            return Err(AnimationError::config("initial velocity must be finite"));
        }

        Ok(AnimationSpec {
            target: self.target,
            motion,
            curve: self.curve,
            duration_ms: self.duration_ms,
            delay_ms: self.delay_ms,
            repeat_count: self.repeat_count,
            auto_reverse: self.auto_reverse,
            additive: self.additive,
            initial_velocity: self.initial_velocity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnimatableProperty::*;

    const T: TargetId = TargetId(1);

    #[test]
    fn test_defaults() {
        let spec = AnimationSpec::builder(T).animate(X, 10.0).build().unwrap();
        assert_eq!(spec.duration_ms(), DEFAULT_DURATION_MS);
        assert_eq!(spec.repeat_count(), 1);
        assert_eq!(*spec.curve(), TimingCurve::smooth());
        assert!(!spec.is_additive());
        assert_eq!(spec.properties().as_slice(), &[X]);
    }

    #[test]
    fn test_rejects_empty_and_mixed_motion() {
        assert!(AnimationSpec::builder(T).build().is_err());
        let mixed = AnimationSpec::builder(T)
            .animate(X, 1.0)
            .keyframe(Keyframe::at(0.0).with_opacity(0.0))
            .build();
        assert!(mixed.is_err());
    }

    #[test]
    fn test_rejects_bad_timing() {
        assert!(AnimationSpec::builder(T).animate(X, 1.0).duration(0.0).build().is_err());
        assert!(AnimationSpec::builder(T).animate(X, 1.0).duration(-5.0).build().is_err());
        assert!(AnimationSpec::builder(T).animate(X, 1.0).delay(-1.0).build().is_err());
        assert!(AnimationSpec::builder(T).animate(X, 1.0).repeat(0).build().is_err());
        assert!(AnimationSpec::builder(T).animate(X, 1.0).repeat(-2).build().is_err());
        assert!(AnimationSpec::builder(T)
            .animate(X, 1.0)
            .spring(SpringConfig::with_stiffness_damping(100.0, 0.0))
            .build()
            .is_err());
    }

    #[test]
    fn test_rejects_duplicate_property() {
        let err = AnimationSpec::builder(T)
            .animate(X, 1.0)
            .animate_from(X, 0.0, 2.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_color_expands_to_channel_deltas() {
        let spec = AnimationSpec::builder(T)
            .animate_color(ColorProperty::Background, Rgba::rgb(1.0, 0.5, 0.0))
            .build()
            .unwrap();
        assert_eq!(
            spec.properties().as_slice(),
            &ColorProperty::Background.channels()
        );
        let Motion::Properties(deltas) = spec.motion() else {
            panic!("expected property deltas");
        };
        assert_eq!(deltas[1].to, 0.5);
        assert_eq!(deltas[3].to, 1.0);

        let twice = AnimationSpec::builder(T)
            .animate_color(ColorProperty::Border, Rgba::BLACK)
            .animate_color_from(ColorProperty::Border, Rgba::WHITE, Rgba::BLACK)
            .build();
        assert!(twice.is_err());
        let bad = AnimationSpec::builder(T)
            .animate_color(ColorProperty::Text, Rgba::new(f32::NAN, 0.0, 0.0, 1.0))
            .build();
        assert!(bad.is_err());
    }

    #[test]
    fn test_keyframe_spec() {
        let spec = AnimationSpec::builder(T)
            .keyframes([
                Keyframe::at(0.0).with_opacity(0.0),
                Keyframe::at(1.0).with_opacity(1.0).with_scale(1.0),
            ])
            .ease_out()
            .duration(250.0)
            .repeat_forever()
            .auto_reverse(true)
            .build()
            .unwrap();
        assert_eq!(spec.repeat_count(), REPEAT_FOREVER);
        assert_eq!(spec.properties().as_slice(), &[Opacity, Scale]);

        let bad = AnimationSpec::builder(T)
            .keyframes([Keyframe::at(0.5).with_opacity(0.0), Keyframe::at(0.2).with_opacity(1.0)])
            .build();
        assert!(bad.is_err());
    }
}
