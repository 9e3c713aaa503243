//! Keyframes
//!
//! A keyframe list places property values at normalized times. Sampling
//! brackets the progress per property (a property may be missing from some
//! keyframes) and eases the local sub-interval with the animation's curve.

use smallvec::SmallVec;

use crate::easing::TimingCurve;
use crate::error::{AnimationError, Result};
use crate::property::{lerp, AnimatableProperty, ColorChannel, ColorProperty, Rgba};

/// Property values at one normalized time
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    /// Time position (0.0 to 1.0)
    pub time: f32,
    pub values: SmallVec<[(AnimatableProperty, f32); 4]>,
}

impl Keyframe {
    pub fn at(time: f32) -> Self {
        Self {
            time,
            values: SmallVec::new(),
        }
    }

    /// Builder: set a property value, replacing any earlier one
    pub fn with(mut self, property: AnimatableProperty, value: f32) -> Self {
        match self.values.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => self.values.push((property, value)),
        }
        self
    }

    pub fn with_opacity(self, value: f32) -> Self {
        self.with(AnimatableProperty::Opacity, value)
    }

    pub fn with_scale(self, value: f32) -> Self {
        self.with(AnimatableProperty::Scale, value)
    }

    pub fn with_translate(self, x: f32, y: f32) -> Self {
        self.with(AnimatableProperty::X, x)
            .with(AnimatableProperty::Y, y)
    }

    pub fn with_rotate(self, degrees: f32) -> Self {
        self.with(AnimatableProperty::Rotate, degrees)
    }

    /// Builder: set all four channels of a color
    pub fn with_color(self, property: ColorProperty, color: Rgba) -> Self {
        ColorChannel::ALL.into_iter().fold(self, |kf, channel| {
            kf.with(AnimatableProperty::Color(property, channel), color.channel(channel))
        })
    }

    pub fn value(&self, property: AnimatableProperty) -> Option<f32> {
        self.values
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| *v)
    }
}

/// Reject empty lists, out-of-range or non-increasing times and non-finite values
pub(crate) fn validate(keyframes: &[Keyframe]) -> Result<()> {
    if keyframes.is_empty() {
        return Err(AnimationError::config("keyframe list is empty"));
    }

    let mut last: Option<f32> = None;
    for kf in keyframes {
        if !kf.time.is_finite() || !(0.0..=1.0).contains(&kf.time) {
            return Err(AnimationError::config(format!(
                "keyframe time {} outside [0, 1]",
                kf.time
            )));
        }
        if let Some(prev) = last {
            if kf.time <= prev {
                return Err(AnimationError::config(format!(
                    "keyframe times must be strictly increasing ({} after {})",
                    kf.time, prev
                )));
            }
        }
        if kf.values.iter().any(|(_, v)| !v.is_finite()) {
            return Err(AnimationError::config(format!(
                "keyframe at {} has a non-finite value",
                kf.time
            )));
        }
        last = Some(kf.time);
    }

    if keyframes.iter().all(|kf| kf.values.is_empty()) {
        return Err(AnimationError::config("keyframes animate no properties"));
    }
    Ok(())
}

/// Every property mentioned by any keyframe, in first-seen order
pub(crate) fn properties(keyframes: &[Keyframe]) -> SmallVec<[AnimatableProperty; 4]> {
    let mut out: SmallVec<[AnimatableProperty; 4]> = SmallVec::new();
    for kf in keyframes {
        for (property, _) in &kf.values {
            if !out.contains(property) {
                out.push(*property);
            }
        }
    }
    out
}

/// Value of `property` at overall `progress`
pub(crate) fn sample(
    keyframes: &[Keyframe],
    property: AnimatableProperty,
    progress: f32,
    curve: &TimingCurve,
) -> Option<f32> {
    let progress = progress.clamp(0.0, 1.0);

    let mut prev: Option<(f32, f32)> = None;
    let mut next: Option<(f32, f32)> = None;
    for kf in keyframes {
        let Some(value) = kf.value(property) else {
            continue;
        };
        if kf.time <= progress {
            prev = Some((kf.time, value));
        }
        if kf.time >= progress {
            next = Some((kf.time, value));
            break;
        }
    }

    match (prev, next) {
        (Some((t0, v0)), Some((t1, v1))) if t1 > t0 => {
            let local = (progress - t0) / (t1 - t0);
            Some(lerp(v0, v1, curve.ease(local)))
        }
        (Some((_, v)), _) | (None, Some((_, v))) => Some(v),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnimatableProperty::*;

    fn fade_and_slide() -> Vec<Keyframe> {
        vec![
            Keyframe::at(0.0).with_opacity(0.0).with(X, 0.0),
            Keyframe::at(0.5).with_opacity(1.0),
            Keyframe::at(1.0).with(X, 100.0),
        ]
    }

    #[test]
    fn test_validation_rejects_bad_times() {
        assert!(validate(&[]).is_err());
        assert!(validate(&[Keyframe::at(1.5).with_opacity(1.0)]).is_err());
        assert!(validate(&[Keyframe::at(-0.1).with_opacity(1.0)]).is_err());
        assert!(validate(&[
            Keyframe::at(0.5).with_opacity(1.0),
            Keyframe::at(0.5).with_opacity(0.0),
        ])
        .is_err());
        assert!(validate(&[
            Keyframe::at(0.6).with_opacity(1.0),
            Keyframe::at(0.2).with_opacity(0.0),
        ])
        .is_err());
        assert!(validate(&[Keyframe::at(0.0), Keyframe::at(1.0)]).is_err());
        assert!(validate(&fade_and_slide()).is_ok());
    }

    #[test]
    fn test_sample_brackets_per_property() {
        let kfs = fade_and_slide();
        let linear = TimingCurve::Linear;

        assert_eq!(sample(&kfs, Opacity, 0.25, &linear), Some(0.5));
        // Opacity holds its last keyframe after 0.5
        assert_eq!(sample(&kfs, Opacity, 0.9, &linear), Some(1.0));
        // X skips the middle keyframe
        assert_eq!(sample(&kfs, X, 0.5, &linear), Some(50.0));
        assert_eq!(sample(&kfs, Rotate, 0.5, &linear), None);
    }

    #[test]
    fn test_sample_applies_curve_locally() {
        let kfs = vec![
            Keyframe::at(0.0).with(X, 0.0),
            Keyframe::at(0.5).with(X, 10.0),
            Keyframe::at(1.0).with(X, 20.0),
        ];
        let curve = TimingCurve::ease_in();
        let local = TimingCurve::ease_in().ease(0.5);
        let v = sample(&kfs, X, 0.75, &curve).unwrap_or_default();
        assert!((v - (10.0 + 10.0 * local)).abs() < 1e-4);
        // Exactly on a keyframe
        assert_eq!(sample(&kfs, X, 0.5, &curve), Some(10.0));
    }

    #[test]
    fn test_properties_union() {
        let props = properties(&fade_and_slide());
        assert_eq!(props.as_slice(), &[Opacity, X]);
    }

    #[test]
    fn test_color_keyframes_interpolate_per_channel() {
        let red = Rgba::rgb(1.0, 0.0, 0.0);
        let blue = Rgba::new(0.0, 0.0, 1.0, 0.5);
        let kfs = vec![
            Keyframe::at(0.0).with_color(ColorProperty::Background, red),
            Keyframe::at(1.0).with_color(ColorProperty::Background, blue),
        ];
        assert!(validate(&kfs).is_ok());
        assert_eq!(properties(&kfs).as_slice(), &ColorProperty::Background.channels());

        let mut mid = Rgba::TRANSPARENT;
        for channel in ColorChannel::ALL {
            let key = Color(ColorProperty::Background, channel);
            let v = sample(&kfs, key, 0.5, &TimingCurve::Linear).unwrap_or(f32::NAN);
            mid.set_channel(channel, v);
        }
        assert_eq!(mid, red.lerp(blue, 0.5));
        assert_eq!(mid, Rgba::new(0.5, 0.0, 0.5, 0.75));
    }

    #[test]
    fn test_with_replaces_value() {
        let kf = Keyframe::at(0.0).with_scale(0.5).with_scale(0.8);
        assert_eq!(kf.values.len(), 1);
        assert_eq!(kf.value(Scale), Some(0.8));
    }
}
