use std::fmt;
use std::path::Path;

use crate::foundation::core::{Color, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};
use crate::source::{
    Canvas, DecodeOptions, DecodeSink, Disposal, Flow, Frame, GifFrameInfo, GifScreenInfo,
    SourceFormat, decode_file,
};

/// Metadata of one animation, as printed by `animtool info`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct InfoReport {
    /// Source container.
    pub format: SourceFormat,
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Canvas background.
    pub background: Color,
    /// Loop count when the source declares one.
    pub loop_count: Option<u16>,
    /// GIF logical screen details.
    pub gif: Option<GifScreenInfo>,
    /// Per-frame details; only collected on request.
    pub frames: Option<Vec<FrameReport>>,
    /// Sum of all frame durations; only collected with `frames`.
    pub total_duration: Option<u64>,
}

/// One decoded frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FrameReport {
    /// Position in the stream.
    pub index: usize,
    /// Display interval in milliseconds.
    pub span: TimeRange,
    /// Raw GIF record fields.
    pub gif: Option<GifFrameInfo>,
}

#[derive(Default)]
struct InfoSink {
    detail: bool,
    start: Option<Canvas>,
    end: Option<Canvas>,
    frames: Vec<FrameReport>,
}

impl DecodeSink for InfoSink {
    fn on_start(&mut self, canvas: &Canvas) -> AnimResult<Flow> {
        self.start = Some(canvas.clone());
        Ok(if self.detail { Flow::Continue } else { Flow::Stop })
    }

    fn on_frame(&mut self, frame: &Frame<'_>, span: TimeRange) -> AnimResult<Flow> {
        self.frames.push(FrameReport {
            index: self.frames.len(),
            span,
            gif: frame.gif,
        });
        Ok(Flow::Continue)
    }

    fn on_end(&mut self, canvas: &Canvas) -> AnimResult<()> {
        self.end = Some(canvas.clone());
        Ok(())
    }
}

/// Describe the animation at `path`. Frames are only decoded when `detail` is set.
#[tracing::instrument(skip(opts), fields(path = %path.display()))]
pub fn inspect(path: &Path, detail: bool, opts: &DecodeOptions) -> AnimResult<InfoReport> {
    let mut sink = InfoSink {
        detail,
        ..InfoSink::default()
    };
    decode_file(path, opts, &mut sink)?;

    let canvas = sink
        .end
        .or(sink.start)
        .ok_or_else(|| AnimError::decode("decoder produced no canvas"))?;
    let total_duration = detail.then(|| sink.frames.last().map_or(0, |f| f.span.end));
    Ok(InfoReport {
        format: canvas.format,
        width: canvas.width,
        height: canvas.height,
        background: canvas.background,
        loop_count: canvas.loop_count,
        gif: canvas.gif,
        frames: detail.then_some(sink.frames),
        total_duration,
    })
}

fn disposal_name(disposal: Disposal) -> &'static str {
    match disposal {
        Disposal::Unspecified => "?(0)",
        Disposal::Keep => "DONOT(1)",
        Disposal::Background => "BG(2)",
        Disposal::Previous => "PREV(3)",
    }
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Canvas size {}x{}", self.width, self.height)?;
        writeln!(f, "Background color {}", self.background)?;
        if let Some(n) = self.loop_count {
            writeln!(f, "Loop count {n}")?;
        }
        if let Some(gif) = &self.gif {
            writeln!(f, "[GIF]")?;
            if let Some(index) = gif.background_index {
                writeln!(f, "    bg index {index}")?;
            }
            if gif.global_palette_len > 0 {
                writeln!(f, "    cmap({})", gif.global_palette_len)?;
            }
        }
        for frame in self.frames.iter().flatten() {
            write!(f, "image#{} duration={}", frame.index, frame.span.duration())?;
            if let Some(g) = &frame.gif {
                write!(f, " [GIF]")?;
                if g.interlaced {
                    write!(f, " interlaced")?;
                }
                if let Some(t) = g.transparent {
                    write!(f, " trans={t}")?;
                }
                if let Some(n) = g.local_palette_len {
                    write!(f, " cmap({n})")?;
                }
                write!(
                    f,
                    " [{}:{}:{}:{}] disp={}",
                    g.rect.left,
                    g.rect.top,
                    g.rect.width,
                    g.rect.height,
                    disposal_name(g.disposal)
                )?;
            }
            writeln!(f)?;
        }
        if let Some(total) = self.total_duration {
            writeln!(f, "Total duration {total}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/inspect/info.rs"]
mod tests;
