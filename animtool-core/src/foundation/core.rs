use crate::foundation::error::{AnimError, AnimResult};

/// Pixel buffer flowing through the pipeline: straight (non-premultiplied) RGBA8, row-major.
pub type Picture = image::RgbaImage;

/// Integer position in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Point {
    /// Horizontal offset.
    pub x: i64,
    /// Vertical offset.
    pub y: i64,
}

impl Point {
    /// Create a point.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of an existing picture.
    pub fn of(picture: &Picture) -> Self {
        Self::new(picture.width(), picture.height())
    }

    /// `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rect {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle covering a whole surface of `size`.
    pub fn full(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Dimensions of the rectangle.
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.size().is_empty()
    }

    /// `true` when the rectangle lies fully inside a surface of `size`.
    pub fn fits_in(self, size: Size) -> bool {
        u64::from(self.left) + u64::from(self.width) <= u64::from(size.width)
            && u64::from(self.top) + u64::from(self.height) <= u64::from(size.height)
    }

    /// Intersection with a surface of `size`, possibly empty.
    pub fn clip_to(self, size: Size) -> Self {
        let left = self.left.min(size.width);
        let top = self.top.min(size.height);
        let right = self.left.saturating_add(self.width).min(size.width);
        let bottom = self.top.saturating_add(self.height).min(size.height);
        Self::new(left, top, right - left, bottom - top)
    }
}

/// Anchor used to place a relative crop inside the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Gravity {
    /// Center the crop on both axes.
    #[default]
    Center,
}

impl std::str::FromStr for Gravity {
    type Err = AnimError;

    fn from_str(s: &str) -> AnimResult<Self> {
        if s.trim().eq_ignore_ascii_case("center") {
            Ok(Self::Center)
        } else {
            Err(AnimError::input(format!("unknown gravity '{s}'")))
        }
    }
}

/// Round half away from zero and clamp into `u32`.
pub(crate) fn round_to_u32(v: f64) -> u32 {
    v.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Largest rectangle with the aspect ratio of `size` that fits into `constraint`, centered.
///
/// Integer arithmetic only; the free axis is centered with truncating division.
pub fn fit_to(constraint: Size, size: Size) -> Rect {
    if size.is_empty() || constraint.is_empty() {
        return Rect::default();
    }
    let (cw, ch) = (u64::from(constraint.width), u64::from(constraint.height));
    let (w, h) = (u64::from(size.width), u64::from(size.height));
    if cw * h < ch * w {
        let fitted_h = (cw * h / w) as u32;
        Rect::new(
            0,
            (constraint.height - fitted_h) / 2,
            constraint.width,
            fitted_h,
        )
    } else {
        let fitted_w = (ch * w / h) as u32;
        Rect::new(
            (constraint.width - fitted_w) / 2,
            0,
            fitted_w,
            constraint.height,
        )
    }
}

/// Straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    /// Create a color from its channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xAARRGGBB` value.
    pub fn from_argb(v: u32) -> Self {
        let [a, r, g, b] = v.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Pack into `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Unpack a `0xRRGGBBAA` value.
    pub fn from_rgba_u32(v: u32) -> Self {
        let [r, g, b, a] = v.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Pack into `0xRRGGBBAA`.
    pub fn to_rgba_u32(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Pixel value for an [`image::RgbaImage`].
    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    /// Color of an [`image::RgbaImage`] pixel.
    pub fn from_pixel(p: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = p.0;
        Self { r, g, b, a }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.to_rgba_u32())
    }
}

impl std::str::FromStr for Color {
    type Err = AnimError;

    /// `0xRRGGBBAA` (shorter hex is right-padded with `F`) or a decimal `RRGGBBAA` value.
    fn from_str(s: &str) -> AnimResult<Self> {
        let text = s.trim();
        let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => {
                if hex.is_empty() || hex.len() > 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(AnimError::input(format!("invalid hex color '{s}'")));
                }
                let padded = format!("{hex:F<8}");
                u32::from_str_radix(&padded, 16)
                    .map_err(|_| AnimError::input(format!("invalid hex color '{s}'")))?
            }
            None => text
                .parse::<u32>()
                .map_err(|_| AnimError::input(format!("invalid color '{s}'")))?,
        };
        Ok(Self::from_rgba_u32(value))
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Half-open time interval `[start, end)` in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: u64,
    /// Exclusive end.
    pub end: u64,
}

impl TimeRange {
    /// Create a validated interval.
    pub fn new(start: u64, end: u64) -> AnimResult<Self> {
        if start > end {
            return Err(AnimError::decode(format!(
                "time range start {start} must be <= end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Length of the interval in milliseconds.
    pub fn duration(self) -> u64 {
        self.end - self.start
    }

    /// `true` for zero-length intervals.
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
