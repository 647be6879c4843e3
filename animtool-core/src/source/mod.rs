//! Canonical frame source contract.
//!
//! Every supported input (animated WebP, GIF, still images) is turned into the same push-driven
//! event stream: one [`DecodeSink::on_start`], then one [`DecodeSink::on_frame`] per composited
//! frame in contiguous time order, then exactly one [`DecodeSink::on_end`].

pub(crate) mod gif;
pub(crate) mod still;
pub(crate) mod webp;

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Color, Picture, Rect, Size, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};

/// Container format detected from the leading bytes of an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum SourceFormat {
    /// RIFF/WebP container, animated or still.
    WebP,
    /// GIF87a/GIF89a stream.
    Gif,
    /// Any still format the `image` crate can read.
    Still,
}

/// Raw logical-screen details of a GIF source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GifScreenInfo {
    /// Background color index of the logical screen.
    pub background_index: Option<usize>,
    /// Number of entries in the global color table (0 if absent).
    pub global_palette_len: usize,
}

/// Canvas-level description of a source, delivered at start and end of a run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Canvas {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Background color advertised by the source.
    pub background: Color,
    /// Loop count when the source declares one (`Some(0)` means infinite).
    pub loop_count: Option<u16>,
    /// Detected container.
    pub format: SourceFormat,
    /// Raw GIF screen info, GIF sources only.
    pub gif: Option<GifScreenInfo>,
}

impl Canvas {
    /// Canvas dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Disposal method of a GIF frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Disposal {
    /// No disposal specified; treated as keep.
    Unspecified,
    /// Leave the frame in place.
    Keep,
    /// Clear the frame rectangle to transparent.
    Background,
    /// Restore the frame rectangle to the canvas before this frame.
    Previous,
}

/// Raw per-frame record of a GIF source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GifFrameInfo {
    /// Sub-rectangle after header corrections.
    pub rect: Rect,
    /// Interlaced row order in the bitstream.
    pub interlaced: bool,
    /// Transparency index from the graphic control extension.
    pub transparent: Option<u8>,
    /// Entries in the local color table, if the frame carries one.
    pub local_palette_len: Option<usize>,
    /// Disposal applied after this frame is shown.
    pub disposal: Disposal,
    /// Delay in hundredths of a second.
    pub delay_cs: u16,
}

/// One composited frame. Only valid for the duration of the callback that receives it.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    /// Full-canvas pixels.
    pub picture: &'a Picture,
    /// Raw GIF record, GIF sources only.
    pub gif: Option<GifFrameInfo>,
}

/// Cooperative early-termination signal returned from sink callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep decoding.
    Continue,
    /// Stop decoding; `on_end` is still delivered.
    Stop,
}

/// Consumer of the canonical decode event stream.
///
/// Ordering contract: `on_start` is called once before any frame, frame intervals are contiguous
/// starting at 0, and `on_end` is called exactly once unless a callback returned an error.
pub trait DecodeSink {
    /// Canvas is known; no frame has been delivered yet.
    fn on_start(&mut self, canvas: &Canvas) -> AnimResult<Flow>;
    /// A composited frame covering `span`.
    fn on_frame(&mut self, frame: &Frame<'_>, span: TimeRange) -> AnimResult<Flow>;
    /// Decoding finished; `canvas` carries the final loop count.
    fn on_end(&mut self, canvas: &Canvas) -> AnimResult<()>;
}

/// Loop-count interpretation for GIF sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GifLoopMode {
    /// Report a loop count only for explicit nonzero NETSCAPE counts.
    #[default]
    Compatible,
    /// Translate to WebP semantics: missing block plays once, explicit repeats gain one play.
    WebP,
}

/// Decoder knobs shared by all adapters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// GIF loop-count interpretation.
    pub gif_loop_mode: GifLoopMode,
}

/// Identify the container from its leading bytes.
pub fn sniff(bytes: &[u8]) -> SourceFormat {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        SourceFormat::WebP
    } else if bytes.starts_with(b"GIF") {
        SourceFormat::Gif
    } else {
        SourceFormat::Still
    }
}

/// Decode `bytes` into `sink`.
pub fn decode_bytes(
    bytes: &[u8],
    opts: &DecodeOptions,
    sink: &mut dyn DecodeSink,
) -> AnimResult<()> {
    match sniff(bytes) {
        SourceFormat::WebP => webp::run(bytes, sink),
        SourceFormat::Gif => gif::run(bytes, opts.gif_loop_mode, sink),
        SourceFormat::Still => still::run(bytes, sink),
    }
}

/// Read `path` and decode it into `sink`.
#[tracing::instrument(skip(opts, sink), fields(path = %path.display()))]
pub fn decode_file(path: &Path, opts: &DecodeOptions, sink: &mut dyn DecodeSink) -> AnimResult<()> {
    let bytes = std::fs::read(path).with_context(|| format!("read input '{}'", path.display()))?;
    if sniff(&bytes) == SourceFormat::Still && image::guess_format(&bytes).is_err() {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(AnimError::input(format!(
            "unsupported file type '{ext}' for '{}'",
            path.display()
        )));
    }
    decode_bytes(&bytes, opts, sink)
}

/// In-memory sink for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct InMemorySink {
    pub(crate) start: Option<Canvas>,
    pub(crate) end: Option<Canvas>,
    /// Frames in timeline order.
    pub(crate) frames: Vec<(Picture, TimeRange, Option<GifFrameInfo>)>,
    pub(crate) end_calls: usize,
    pub(crate) stop_after: Option<usize>,
}

#[cfg(test)]
impl DecodeSink for InMemorySink {
    fn on_start(&mut self, canvas: &Canvas) -> AnimResult<Flow> {
        self.start = Some(canvas.clone());
        Ok(match self.stop_after {
            Some(0) => Flow::Stop,
            _ => Flow::Continue,
        })
    }

    fn on_frame(&mut self, frame: &Frame<'_>, span: TimeRange) -> AnimResult<Flow> {
        self.frames.push((frame.picture.clone(), span, frame.gif));
        Ok(match self.stop_after {
            Some(n) if self.frames.len() >= n => Flow::Stop,
            _ => Flow::Continue,
        })
    }

    fn on_end(&mut self, canvas: &Canvas) -> AnimResult<()> {
        self.end = Some(canvas.clone());
        self.end_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/mod.rs"]
mod tests;
