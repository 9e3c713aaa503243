//! Timing curves
//!
//! A [`TimingCurve`] maps linear time progress onto eased progress. Bezier and
//! linear curves are pure functions of time; spring curves are driven by a
//! [`Spring`](crate::spring::Spring) and finish when it comes to rest.

use crate::error::{AnimationError, Result};
use crate::spring::SpringConfig;

/// CSS-style cubic bezier with fixed endpoints (0,0) and (1,1)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Control point x values must lie in [0, 1] so the curve is a function of time
    pub fn validate(&self) -> Result<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(AnimationError::config("bezier control points must be finite"));
        }
        if !(0.0..=1.0).contains(&self.x1) || !(0.0..=1.0).contains(&self.x2) {
            return Err(AnimationError::config(format!(
                "bezier x control points must be in [0, 1], got ({}, {})",
                self.x1, self.x2
            )));
        }
        Ok(())
    }

    pub fn ease(&self, t: f32) -> f32 {
        cubic_bezier_ease(t, self.x1, self.y1, self.x2, self.y2)
    }
}

/// Timing curve of an animation; fixed once the animation starts
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimingCurve {
    Bezier(CubicBezier),
    Spring(SpringConfig),
    Linear,
}

impl TimingCurve {
    pub const SMOOTH: CubicBezier = CubicBezier::new(0.4, 0.0, 0.2, 1.0);
    pub const SNAPPY: CubicBezier = CubicBezier::new(0.33, 0.66, 0.66, 1.0);
    pub const BOUNCE: CubicBezier = CubicBezier::new(0.68, -0.55, 0.265, 1.55);
    pub const EASE_IN: CubicBezier = CubicBezier::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: CubicBezier = CubicBezier::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: CubicBezier = CubicBezier::new(0.42, 0.0, 0.58, 1.0);

    pub fn smooth() -> Self {
        Self::Bezier(Self::SMOOTH)
    }

    pub fn snappy() -> Self {
        Self::Bezier(Self::SNAPPY)
    }

    /// Overshoots both ends
    pub fn bounce() -> Self {
        Self::Bezier(Self::BOUNCE)
    }

    pub fn ease_in() -> Self {
        Self::Bezier(Self::EASE_IN)
    }

    pub fn ease_out() -> Self {
        Self::Bezier(Self::EASE_OUT)
    }

    pub fn ease_in_out() -> Self {
        Self::Bezier(Self::EASE_IN_OUT)
    }

    pub fn linear() -> Self {
        Self::Linear
    }

    pub fn cubic(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::Bezier(CubicBezier::new(x1, y1, x2, y2))
    }

    pub fn spring(config: SpringConfig) -> Self {
        Self::Spring(config)
    }

    pub fn is_spring(&self) -> bool {
        matches!(self, Self::Spring(_))
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Bezier(bezier) => bezier.validate(),
            Self::Spring(config) => config.validate(),
            Self::Linear => Ok(()),
        }
    }

    /// Eased progress for time progress `t`.
    ///
    /// Spring curves have no closed form over time; they ease linearly here and
    /// the engine substitutes the spring position.
    pub fn ease(&self, t: f32) -> f32 {
        match self {
            Self::Bezier(bezier) => bezier.ease(t),
            Self::Spring(_) | Self::Linear => t.clamp(0.0, 1.0),
        }
    }
}

impl Default for TimingCurve {
    fn default() -> Self {
        Self::smooth()
    }
}

/// Cubic bezier easing (CSS semantics).
///
/// Newton-Raphson with a bisection fallback, in f64 to keep high refresh rates
/// free of f32 jitter.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t as f64;
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    p = x;
    for _ in 0..24 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³ in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_exact() {
        for curve in [
            TimingCurve::smooth(),
            TimingCurve::snappy(),
            TimingCurve::bounce(),
            TimingCurve::ease_in(),
            TimingCurve::ease_out(),
            TimingCurve::ease_in_out(),
            TimingCurve::linear(),
        ] {
            assert_eq!(curve.ease(0.0), 0.0);
            assert_eq!(curve.ease(1.0), 1.0);
        }
    }

    #[test]
    fn test_ease_in_out_symmetric() {
        let curve = TimingCurve::ease_in_out();
        assert!((curve.ease(0.5) - 0.5).abs() < 1e-4);
        let a = curve.ease(0.2);
        let b = curve.ease(0.8);
        assert!((a + b - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_ease_in_starts_slow() {
        assert!(TimingCurve::ease_in().ease(0.25) < 0.25);
        assert!(TimingCurve::ease_out().ease(0.25) > 0.25);
    }

    #[test]
    fn test_bounce_overshoots() {
        let curve = TimingCurve::bounce();
        let samples: Vec<f32> = (1..100).map(|i| curve.ease(i as f32 / 100.0)).collect();
        assert!(samples.iter().any(|v| *v < 0.0));
        assert!(samples.iter().any(|v| *v > 1.0));
    }

    #[test]
    fn test_monotonic_for_standard_curves() {
        let curve = TimingCurve::smooth();
        let mut last = 0.0;
        for i in 1..=120 {
            let v = curve.ease(i as f32 / 120.0);
            assert!(v >= last - 1e-6);
            last = v;
        }
    }

    #[test]
    fn test_validation() {
        assert!(TimingCurve::cubic(1.2, 0.0, 0.5, 1.0).validate().is_err());
        assert!(TimingCurve::cubic(0.2, 0.0, f32::NAN, 1.0).validate().is_err());
        assert!(TimingCurve::cubic(0.2, -3.0, 0.5, 4.0).validate().is_ok());
        assert!(TimingCurve::spring(SpringConfig::new(0.0, 1.0, 1.0)).validate().is_err());
        assert!(TimingCurve::linear().validate().is_ok());
    }
}
