//! Pixel counting with a small per-channel predicate language.
//!
//! A predicate is a colon-separated list of channel terms such as `15<red<=100:alpha=0`. Each term
//! names one of `red`, `green`, `blue` or `alpha` with an optional lower bound (`lo<` or `lo<=`),
//! an optional upper bound (`<hi` or `<=hi`) and an optional exact value (`=v`).

use std::ops::Bound;
use std::path::Path;
use std::str::FromStr;

use crate::foundation::core::{Rect, Size, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};
use crate::source::{Canvas, DecodeOptions, DecodeSink, Flow, Frame, decode_file};

/// Bounds on one channel value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelPredicate {
    /// Lower bound.
    pub lower: Bound<u16>,
    /// Upper bound.
    pub upper: Bound<u16>,
    /// Exact value.
    pub equal: Option<u16>,
}

impl Default for ChannelPredicate {
    fn default() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            equal: None,
        }
    }
}

impl ChannelPredicate {
    /// `true` when `value` satisfies every bound.
    pub fn matches(&self, value: u8) -> bool {
        let v = u16::from(value);
        let above = match self.lower {
            Bound::Included(lo) => v >= lo,
            Bound::Excluded(lo) => v > lo,
            Bound::Unbounded => true,
        };
        let below = match self.upper {
            Bound::Included(hi) => v <= hi,
            Bound::Excluded(hi) => v < hi,
            Bound::Unbounded => true,
        };
        above && below && self.equal.is_none_or(|e| v == e)
    }
}

/// Conjunction of channel predicates over an RGBA pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelPredicate {
    /// Red channel.
    pub red: ChannelPredicate,
    /// Green channel.
    pub green: ChannelPredicate,
    /// Blue channel.
    pub blue: ChannelPredicate,
    /// Alpha channel.
    pub alpha: ChannelPredicate,
}

impl PixelPredicate {
    /// `true` when every channel of `rgba` matches.
    pub fn matches(&self, rgba: [u8; 4]) -> bool {
        self.red.matches(rgba[0])
            && self.green.matches(rgba[1])
            && self.blue.matches(rgba[2])
            && self.alpha.matches(rgba[3])
    }
}

impl FromStr for PixelPredicate {
    type Err = AnimError;

    fn from_str(s: &str) -> AnimResult<Self> {
        let mut out = Self::default();
        for term in s.split(':').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, predicate) = parse_term(term)?;
            let slot = match name {
                "red" => &mut out.red,
                "green" => &mut out.green,
                "blue" => &mut out.blue,
                "alpha" => &mut out.alpha,
                other => {
                    return Err(AnimError::input(format!(
                        "unknown channel '{other}' in predicate '{s}'"
                    )));
                }
            };
            *slot = predicate;
        }
        Ok(out)
    }
}

fn parse_term(term: &str) -> AnimResult<(&str, ChannelPredicate)> {
    let name_start = term
        .find(|c: char| c.is_ascii_lowercase())
        .ok_or_else(|| AnimError::input(format!("predicate term '{term}' names no channel")))?;
    let name_end = term[name_start..]
        .find(|c: char| !c.is_ascii_lowercase())
        .map_or(term.len(), |i| name_start + i);
    let (prefix, name, suffix) = (
        &term[..name_start],
        &term[name_start..name_end],
        &term[name_end..],
    );

    let mut predicate = ChannelPredicate::default();
    if !prefix.is_empty() {
        predicate.lower = if let Some(v) = prefix.strip_suffix("<=") {
            Bound::Included(parse_value(v, term)?)
        } else if let Some(v) = prefix.strip_suffix('<') {
            Bound::Excluded(parse_value(v, term)?)
        } else {
            return Err(AnimError::input(format!(
                "predicate term '{term}': expected 'lo<' or 'lo<=' before '{name}'"
            )));
        };
    }
    if !suffix.is_empty() {
        if let Some(v) = suffix.strip_prefix("<=") {
            predicate.upper = Bound::Included(parse_value(v, term)?);
        } else if let Some(v) = suffix.strip_prefix('<') {
            predicate.upper = Bound::Excluded(parse_value(v, term)?);
        } else if let Some(v) = suffix.strip_prefix('=') {
            predicate.equal = Some(parse_value(v, term)?);
        } else {
            return Err(AnimError::input(format!(
                "predicate term '{term}': expected '<hi', '<=hi' or '=v' after '{name}'"
            )));
        }
    }
    Ok((name, predicate))
}

fn parse_value(s: &str, term: &str) -> AnimResult<u16> {
    s.trim()
        .parse::<u16>()
        .map_err(|_| AnimError::input(format!("predicate term '{term}': '{s}' is not a number")))
}

/// Area of a frame to count in; missing extents reach the picture edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, or `None` for the rest of the row.
    pub width: Option<u32>,
    /// Height, or `None` for the rest of the column.
    pub height: Option<u32>,
}

impl Region {
    /// Concrete rectangle inside a picture of `size`; may be empty.
    pub fn clamp_to(self, size: Size) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.width.unwrap_or(u32::MAX),
            self.height.unwrap_or(u32::MAX),
        )
        .clip_to(size)
    }
}

struct CountSink<'p> {
    frame_index: usize,
    region: Region,
    predicate: &'p PixelPredicate,
    seen: usize,
    count: Option<u64>,
}

impl DecodeSink for CountSink<'_> {
    fn on_start(&mut self, _canvas: &Canvas) -> AnimResult<Flow> {
        Ok(Flow::Continue)
    }

    fn on_frame(&mut self, frame: &Frame<'_>, _span: TimeRange) -> AnimResult<Flow> {
        if self.seen != self.frame_index {
            self.seen += 1;
            return Ok(Flow::Continue);
        }
        let area = self.region.clamp_to(Size::of(frame.picture));
        let mut count = 0u64;
        for y in area.top..area.top + area.height {
            for x in area.left..area.left + area.width {
                if self.predicate.matches(frame.picture.get_pixel(x, y).0) {
                    count += 1;
                }
            }
        }
        self.count = Some(count);
        Ok(Flow::Stop)
    }

    fn on_end(&mut self, _canvas: &Canvas) -> AnimResult<()> {
        Ok(())
    }
}

/// Count pixels of frame `frame_index` inside `region` that satisfy `predicate`.
#[tracing::instrument(skip(region, predicate), fields(path = %path.display()))]
pub fn count_pixels(
    path: &Path,
    frame_index: usize,
    region: Region,
    predicate: &PixelPredicate,
) -> AnimResult<u64> {
    let mut sink = CountSink {
        frame_index,
        region,
        predicate,
        seen: 0,
        count: None,
    };
    decode_file(path, &DecodeOptions::default(), &mut sink)?;
    let count = sink.count.ok_or_else(|| {
        AnimError::input(format!(
            "frame {frame_index} is out of range; '{}' has {} frame(s)",
            path.display(),
            sink.seen
        ))
    })?;
    tracing::debug!(count, "pixels counted");
    Ok(count)
}

#[cfg(test)]
#[path = "../../tests/unit/inspect/count.rs"]
mod tests;
