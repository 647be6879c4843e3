//! Crop/resize rules: `SRC->DST;DST;...`.
//!
//! `SRC` is either `left:top:width:height` or a gravity form such as `center,16:9`.
//! Each `DST` is `width:height[@file_name][#format]`; every part may be omitted.

use std::path::PathBuf;
use std::str::FromStr;

use crate::encode::OutputFormat;
use crate::foundation::core::{Gravity, Rect, Size, round_to_u32};
use crate::foundation::error::{AnimError, AnimResult};

/// Region of the canvas a transform starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceRect {
    /// Explicit rectangle in canvas pixels. Zero width and height select the whole canvas.
    Absolute(Rect),
    /// Largest rectangle with aspect `ratio_x:ratio_y`, anchored by `gravity`.
    Relative {
        /// Horizontal aspect term.
        ratio_x: u32,
        /// Vertical aspect term.
        ratio_y: u32,
        /// Anchor.
        gravity: Gravity,
    },
}

impl Default for SourceRect {
    fn default() -> Self {
        Self::Absolute(Rect::default())
    }
}

impl SourceRect {
    /// Resolve to a concrete rectangle inside a canvas of `canvas` size.
    pub fn resolve(&self, canvas: Size) -> AnimResult<Rect> {
        self.validate()?;
        match *self {
            Self::Absolute(rect) => {
                if rect.is_empty() {
                    return Ok(Rect::full(canvas));
                }
                if !rect.fits_in(canvas) {
                    return Err(AnimError::config(format!(
                        "crop {}:{}:{}:{} exceeds the {}x{} canvas",
                        rect.left, rect.top, rect.width, rect.height, canvas.width, canvas.height
                    )));
                }
                Ok(rect)
            }
            Self::Relative {
                ratio_x,
                ratio_y,
                gravity: Gravity::Center,
            } => Ok(center_rect(canvas, ratio_x, ratio_y)),
        }
    }

    fn validate(&self) -> AnimResult<()> {
        match self {
            Self::Absolute(rect) if (rect.width == 0) != (rect.height == 0) => {
                Err(AnimError::config(format!(
                    "crop {}:{}:{}:{} must set both width and height",
                    rect.left, rect.top, rect.width, rect.height
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Centered rectangle with aspect `rx:ry` covering as much of `canvas` as possible.
pub(crate) fn center_rect(canvas: Size, rx: u32, ry: u32) -> Rect {
    if rx == 0 || ry == 0 || canvas.is_empty() {
        return Rect::full(canvas);
    }
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let (rx, ry) = (f64::from(rx), f64::from(ry));
    if rx * h < ry * w {
        let width = round_to_u32(h * rx / ry).min(canvas.width);
        let left = round_to_u32((w - f64::from(width)) / 2.0);
        Rect::new(left, 0, width, canvas.height)
    } else {
        let height = round_to_u32(w * ry / rx).min(canvas.height);
        let top = round_to_u32((h - f64::from(height)) / 2.0);
        Rect::new(0, top, canvas.width, height)
    }
}

/// One output of a transform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Destination {
    /// Target width; 0 derives it from `height` and the crop aspect.
    pub width: u32,
    /// Target height; 0 derives it from `width` and the crop aspect.
    pub height: u32,
    /// Explicit output file name.
    pub file_name: Option<PathBuf>,
    /// Output container; WebP when unset.
    pub format: Option<OutputFormat>,
}

impl Destination {
    /// Final frame size for a crop of size `crop`.
    pub fn resolve_size(&self, crop: Size) -> AnimResult<Size> {
        let size = match (self.width, self.height) {
            (0, 0) => crop,
            (w, 0) => Size::new(
                w,
                round_to_u32(f64::from(crop.height) * f64::from(w) / f64::from(crop.width.max(1))),
            ),
            (0, h) => Size::new(
                round_to_u32(f64::from(crop.width) * f64::from(h) / f64::from(crop.height.max(1))),
                h,
            ),
            (w, h) => Size::new(w, h),
        };
        if size.is_empty() {
            return Err(AnimError::config(format!(
                "destination {}:{} resolves to {}x{} for a {}x{} crop",
                self.width, self.height, size.width, size.height, crop.width, crop.height
            )));
        }
        Ok(size)
    }

    /// Container for this destination.
    pub fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

impl FromStr for Destination {
    type Err = AnimError;

    fn from_str(s: &str) -> AnimResult<Self> {
        let (rest, format) = match s.split_once('#') {
            Some((rest, tag)) if !tag.is_empty() => (rest, Some(tag.parse::<OutputFormat>()?)),
            Some((rest, _)) => (rest, None),
            None => (s, None),
        };
        let (size, file_name) = match rest.split_once('@') {
            Some((size, name)) if !name.is_empty() => (size, Some(PathBuf::from(name))),
            Some((size, _)) => (size, None),
            None => (rest, None),
        };
        let [width, height] = parse_ints::<2>(size, s)?;
        Ok(Self {
            width,
            height,
            file_name,
            format,
        })
    }
}

/// A source region and the outputs derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameTransform {
    /// Region cropped from every frame.
    pub source: SourceRect,
    /// Outputs, in order.
    pub destinations: Vec<Destination>,
}

impl Default for FrameTransform {
    /// Whole canvas to one output at the source size.
    fn default() -> Self {
        Self {
            source: SourceRect::default(),
            destinations: vec![Destination::default()],
        }
    }
}

impl FrameTransform {
    /// Check what can be checked before the canvas size is known.
    pub fn validate(&self) -> AnimResult<()> {
        if self.destinations.is_empty() {
            return Err(AnimError::config("transform has no destination"));
        }
        self.source.validate()
    }
}

impl FromStr for FrameTransform {
    type Err = AnimError;

    fn from_str(s: &str) -> AnimResult<Self> {
        let (src, dsts) = s
            .split_once("->")
            .ok_or_else(|| AnimError::input(format!("transform '{s}' is missing '->'")))?;
        let source = parse_source(src.trim(), s)?;
        let destinations = dsts
            .split(';')
            .map(|d| d.trim().parse::<Destination>())
            .collect::<AnimResult<Vec<_>>>()
            .map_err(|e| match e {
                AnimError::Input(msg) => AnimError::input(format!("transform '{s}': {msg}")),
                other => other,
            })?;
        Ok(Self {
            source,
            destinations,
        })
    }
}

fn parse_source(src: &str, whole: &str) -> AnimResult<SourceRect> {
    if !src.starts_with(|c: char| c.is_ascii_alphabetic()) {
        let [left, top, width, height] = parse_ints::<4>(src, whole)?;
        return Ok(SourceRect::Absolute(Rect::new(left, top, width, height)));
    }

    let split_at = src
        .find([',', ':'])
        .ok_or_else(|| AnimError::input(format!("transform '{whole}': gravity needs a ratio")))?;
    let (gravities, ratio) = (&src[..split_at], &src[split_at + 1..]);
    let mut gravity = Gravity::default();
    for g in gravities.split('|') {
        gravity = g
            .parse()
            .map_err(|_| AnimError::input(format!("transform '{whole}': unknown gravity '{g}'")))?;
    }
    let mut parts = ratio.split(':');
    let (Some(rx), Some(ry), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AnimError::input(format!(
            "transform '{whole}': ratio must be 'x:y', got '{ratio}'"
        )));
    };
    Ok(SourceRect::Relative {
        ratio_x: parse_int(rx, whole)?,
        ratio_y: parse_int(ry, whole)?,
        gravity,
    })
}

/// Up to `N` colon-separated integers; missing or empty parts are 0.
fn parse_ints<const N: usize>(s: &str, whole: &str) -> AnimResult<[u32; N]> {
    let mut out = [0u32; N];
    if s.trim().is_empty() {
        return Ok(out);
    }
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > N {
        return Err(AnimError::input(format!(
            "'{whole}': expected at most {N} values in '{s}'"
        )));
    }
    for (slot, part) in out.iter_mut().zip(parts) {
        if !part.trim().is_empty() {
            *slot = parse_int(part, whole)?;
        }
    }
    Ok(out)
}

fn parse_int(s: &str, whole: &str) -> AnimResult<u32> {
    s.trim()
        .parse::<u32>()
        .map_err(|_| AnimError::input(format!("'{whole}': '{s}' is not a non-negative integer")))
}

#[cfg(test)]
#[path = "../../tests/unit/dropframes/transform.rs"]
mod tests;
