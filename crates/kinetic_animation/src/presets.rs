//! Animation presets for common entry/exit animations
//!
//! Each preset returns an [`AnimationBuilder`] so callers can still adjust
//! timing (delay, repeat, curve) before building.

use crate::animation::AnimationBuilder;
use crate::keyframe::Keyframe;
use crate::property::{AnimatableProperty, TargetId};

/// Edge a slide starts from or leaves toward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    /// Offset from the resting position, `distance` pixels toward this edge
    fn offset(self, distance: f32) -> (f32, f32) {
        match self {
            Edge::Left => (-distance, 0.0),
            Edge::Right => (distance, 0.0),
            Edge::Top => (0.0, -distance),
            Edge::Bottom => (0.0, distance),
        }
    }
}

/// Pre-built animation presets for common patterns
pub struct AnimationPreset;

impl AnimationPreset {
    // ========================================================================
    // Fade animations
    // ========================================================================

    /// Fade in from transparent to opaque
    pub fn fade_in(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .animate_from(AnimatableProperty::Opacity, 0.0, 1.0)
            .ease_out()
            .duration(duration_ms)
    }

    /// Fade out from whatever opacity the target has
    pub fn fade_out(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .animate(AnimatableProperty::Opacity, 0.0)
            .ease_in()
            .duration(duration_ms)
    }

    // ========================================================================
    // Scale animations
    // ========================================================================

    /// Scale in from nothing with fade
    pub fn scale_in(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_scale(0.0).with_opacity(0.0),
                Keyframe::at(1.0).with_scale(1.0).with_opacity(1.0),
            ])
            .smooth()
            .duration(duration_ms)
    }

    /// Scale out to nothing with fade
    pub fn scale_out(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_scale(1.0).with_opacity(1.0),
                Keyframe::at(1.0).with_scale(0.0).with_opacity(0.0),
            ])
            .ease_in()
            .duration(duration_ms)
    }

    /// Pop in with slight overshoot
    pub fn pop_in(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_scale(0.0).with_opacity(0.0),
                Keyframe::at(0.7).with_scale(1.1).with_opacity(1.0),
                Keyframe::at(1.0).with_scale(1.0).with_opacity(1.0),
            ])
            .ease_out()
            .duration(duration_ms)
    }

    /// Overshoot then settle, squashing once on the way
    pub fn bounce_in(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_scale(0.0).with_opacity(0.0),
                Keyframe::at(0.5).with_scale(1.15).with_opacity(1.0),
                Keyframe::at(0.75).with_scale(0.95).with_opacity(1.0),
                Keyframe::at(1.0).with_scale(1.0).with_opacity(1.0),
            ])
            .ease_in_out()
            .duration(duration_ms)
    }

    // ========================================================================
    // Slide animations
    // ========================================================================

    /// Slide in from `edge`, `distance` pixels away
    pub fn slide_in(target: TargetId, edge: Edge, distance: f32, duration_ms: f32) -> AnimationBuilder {
        let (dx, dy) = edge.offset(distance);
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_translate(dx, dy).with_opacity(0.0),
                Keyframe::at(1.0).with_translate(0.0, 0.0).with_opacity(1.0),
            ])
            .smooth()
            .duration(duration_ms)
    }

    /// Slide out toward `edge`
    pub fn slide_out(target: TargetId, edge: Edge, distance: f32, duration_ms: f32) -> AnimationBuilder {
        let (dx, dy) = edge.offset(distance);
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_translate(0.0, 0.0).with_opacity(1.0),
                Keyframe::at(1.0).with_translate(dx, dy).with_opacity(0.0),
            ])
            .ease_in()
            .duration(duration_ms)
    }

    /// Drop in from above with a small bounce
    pub fn drop_in(target: TargetId, drop_distance: f32, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_translate(0.0, -drop_distance).with_opacity(0.0),
                Keyframe::at(0.6).with_translate(0.0, 10.0).with_opacity(1.0),
                Keyframe::at(0.8).with_translate(0.0, -5.0).with_opacity(1.0),
                Keyframe::at(1.0).with_translate(0.0, 0.0).with_opacity(1.0),
            ])
            .ease_in_out()
            .duration(duration_ms)
    }

    // ========================================================================
    // Special effect animations
    // ========================================================================

    /// Horizontal shake for error feedback. Additive, so it layers over
    /// whatever owns the target's X.
    pub fn shake(target: TargetId, intensity: f32, duration_ms: f32) -> AnimationBuilder {
        let x = AnimatableProperty::X;
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with(x, 0.0),
                Keyframe::at(0.1).with(x, -intensity),
                Keyframe::at(0.3).with(x, intensity),
                Keyframe::at(0.5).with(x, -intensity * 0.8),
                Keyframe::at(0.7).with(x, intensity * 0.6),
                Keyframe::at(0.9).with(x, -intensity * 0.3),
                Keyframe::at(1.0).with(x, 0.0),
            ])
            .ease_in_out()
            .duration(duration_ms)
            .additive(true)
    }

    /// Scale up and back down
    pub fn pulse(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .keyframes([
                Keyframe::at(0.0).with_scale(1.0),
                Keyframe::at(0.5).with_scale(1.1),
                Keyframe::at(1.0).with_scale(1.0),
            ])
            .ease_in_out()
            .duration(duration_ms)
    }

    /// Full turn, looping
    pub fn spin(target: TargetId, duration_ms: f32) -> AnimationBuilder {
        AnimationBuilder::new(target)
            .animate_from(AnimatableProperty::Rotate, 0.0, 360.0)
            .linear()
            .duration(duration_ms)
            .repeat_forever()
    }
}
