//! Animatable properties and render targets

/// Opaque reference to a caller-owned render target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

/// A numeric property the engine can drive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatableProperty {
    /// Translation X in pixels
    X,
    /// Translation Y in pixels
    Y,
    /// Translation Z in pixels (positive = toward viewer)
    Z,
    /// Uniform scale factor
    Scale,
    ScaleX,
    ScaleY,
    /// Rotation in degrees (Z-axis)
    Rotate,
    /// Rotation in degrees (3D tilt)
    RotateX,
    /// Rotation in degrees (3D turn)
    RotateY,
    SkewX,
    SkewY,
    /// Opacity (0.0 to 1.0)
    Opacity,
    Width,
    Height,
    BorderRadius,
    BorderWidth,
    /// Blur radius in pixels
    Blur,
    StrokeWidth,
    StrokeDashOffset,
    /// One channel of a color, 0.0 to 1.0
    Color(ColorProperty, ColorChannel),
    /// Extension slot for properties the sink understands by number
    Custom(u32),
}

impl AnimatableProperty {
    /// Stable name handed to render sinks and used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Scale => "scale",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Rotate => "rotate",
            Self::RotateX => "rotateX",
            Self::RotateY => "rotateY",
            Self::SkewX => "skewX",
            Self::SkewY => "skewY",
            Self::Opacity => "opacity",
            Self::Width => "width",
            Self::Height => "height",
            Self::BorderRadius => "borderRadius",
            Self::BorderWidth => "borderWidth",
            Self::Blur => "blur",
            Self::StrokeWidth => "strokeWidth",
            Self::StrokeDashOffset => "strokeDashOffset",
            Self::Color(property, channel) => COLOR_NAMES[*property as usize][*channel as usize],
            Self::Custom(_) => "custom",
        }
    }

    /// Resting value of the property on a fresh target
    pub fn identity(&self) -> f32 {
        match self {
            Self::Scale | Self::ScaleX | Self::ScaleY | Self::Opacity => 1.0,
            Self::Color(_, ColorChannel::A) => 1.0,
            _ => 0.0,
        }
    }

    /// Color and channel, for sinks that reassemble colors
    pub fn as_color(&self) -> Option<(ColorProperty, ColorChannel)> {
        match self {
            Self::Color(property, channel) => Some((*property, *channel)),
            _ => None,
        }
    }
}

// ============================================================================
// Colors
// ============================================================================

/// A color-valued property, animated as four channel keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorProperty {
    Background,
    Border,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorChannel {
    R,
    G,
    B,
    A,
}

impl ColorChannel {
    pub const ALL: [ColorChannel; 4] = [Self::R, Self::G, Self::B, Self::A];
}

const COLOR_NAMES: [[&str; 4]; 3] = [
    [
        "backgroundColor.r",
        "backgroundColor.g",
        "backgroundColor.b",
        "backgroundColor.a",
    ],
    ["borderColor.r", "borderColor.g", "borderColor.b", "borderColor.a"],
    ["color.r", "color.g", "color.b", "color.a"],
];

impl ColorProperty {
    /// The four channel keys of this color
    pub fn channels(self) -> [AnimatableProperty; 4] {
        ColorChannel::ALL.map(|channel| AnimatableProperty::Color(self, channel))
    }
}

/// Straight (non-premultiplied) RGBA, each channel 0.0 to 1.0
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn channel(&self, channel: ColorChannel) -> f32 {
        match channel {
            ColorChannel::R => self.r,
            ColorChannel::G => self.g,
            ColorChannel::B => self.b,
            ColorChannel::A => self.a,
        }
    }

    pub fn set_channel(&mut self, channel: ColorChannel, value: f32) {
        match channel {
            ColorChannel::R => self.r = value,
            ColorChannel::G => self.g = value,
            ColorChannel::B => self.b = value,
            ColorChannel::A => self.a = value,
        }
    }

    /// Channel-wise interpolation
    pub fn lerp(self, to: Rgba, t: f32) -> Rgba {
        Rgba::new(
            lerp(self.r, to.r, t),
            lerp(self.g, to.g, t),
            lerp(self.b, to.b, t),
            lerp(self.a, to.a, t),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

/// One property's motion: optional explicit start, required end
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyDelta {
    pub property: AnimatableProperty,
    /// `None` captures the rendered value when the animation goes live
    pub from: Option<f32>,
    pub to: f32,
}

impl PropertyDelta {
    pub fn to(property: AnimatableProperty, to: f32) -> Self {
        Self {
            property,
            from: None,
            to,
        }
    }

    pub fn from_to(property: AnimatableProperty, from: f32, to: f32) -> Self {
        Self {
            property,
            from: Some(from),
            to,
        }
    }
}

/// Caller-owned render/apply sink
///
/// The engine reads current values to resolve implicit start values and
/// additive bases, and writes each animated property once per tick.
pub trait RenderSink {
    /// Currently rendered value, or `None` if the target is gone
    fn current_value(&self, target: TargetId, property: AnimatableProperty) -> Option<f32>;

    fn apply(&mut self, target: TargetId, property: AnimatableProperty, value: f32);

    /// Whether the target reference is still valid
    fn is_live(&self, _target: TargetId) -> bool {
        true
    }
}

#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
