//! Pointer input samples
//!
//! Device-neutral position/timestamp samples fed into gesture tracking.
//! Touch vs. mouse normalization happens before samples reach this layer.

/// Phase of a pointer interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Axis of a 2D pointer position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A single pointer sample
///
/// Timestamps are milliseconds on a caller-chosen monotonic clock. Positions
/// are in caller units (usually logical pixels).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSample {
    pub timestamp_ms: f64,
    pub x: f32,
    pub y: f32,
}

impl GestureSample {
    pub fn new(timestamp_ms: f64, x: f32, y: f32) -> Self {
        Self { timestamp_ms, x, y }
    }

    /// Position component along an axis
    pub fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// Component-wise difference `self - earlier`
    pub fn delta_from(&self, earlier: &GestureSample) -> (f32, f32) {
        (self.x - earlier.x, self.y - earlier.y)
    }

    /// Elapsed milliseconds since an earlier sample (never negative)
    pub fn elapsed_since(&self, earlier: &GestureSample) -> f64 {
        (self.timestamp_ms - earlier.timestamp_ms).max(0.0)
    }
}

/// A pointer sample tagged with its phase
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub sample: GestureSample,
}

impl PointerEvent {
    pub fn down(timestamp_ms: f64, x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Down,
            sample: GestureSample::new(timestamp_ms, x, y),
        }
    }

    pub fn moved(timestamp_ms: f64, x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            sample: GestureSample::new(timestamp_ms, x, y),
        }
    }

    pub fn up(timestamp_ms: f64, x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Up,
            sample: GestureSample::new(timestamp_ms, x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_components() {
        let sample = GestureSample::new(16.0, 3.0, -4.0);
        assert_eq!(sample.along(Axis::Horizontal), 3.0);
        assert_eq!(sample.along(Axis::Vertical), -4.0);
    }

    #[test]
    fn test_deltas() {
        let a = GestureSample::new(10.0, 0.0, 0.0);
        let b = GestureSample::new(26.0, 12.0, -3.0);
        assert_eq!(b.delta_from(&a), (12.0, -3.0));
        assert_eq!(b.elapsed_since(&a), 16.0);
        // Out-of-order timestamps never produce negative spans
        assert_eq!(a.elapsed_since(&b), 0.0);
    }

    #[test]
    fn test_event_constructors() {
        assert_eq!(PointerEvent::down(0.0, 1.0, 2.0).phase, PointerPhase::Down);
        assert_eq!(PointerEvent::moved(1.0, 1.0, 2.0).phase, PointerPhase::Move);
        let up = PointerEvent::up(2.0, 5.0, 6.0);
        assert_eq!(up.phase, PointerPhase::Up);
        assert_eq!(up.sample, GestureSample::new(2.0, 5.0, 6.0));
    }
}
