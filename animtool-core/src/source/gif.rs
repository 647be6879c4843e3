//! GIF adapter: indexed frame records composited onto a disposal-tracked canvas.

use std::io::Cursor;

use crate::foundation::core::{Color, Picture, Rect, Size, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};
use crate::source::{
    Canvas, DecodeSink, Disposal, Flow, Frame, GifFrameInfo, GifLoopMode, GifScreenInfo,
    SourceFormat,
};

pub(crate) fn run(
    bytes: &[u8],
    loop_mode: GifLoopMode,
    sink: &mut dyn DecodeSink,
) -> AnimResult<()> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| AnimError::decode(format!("read GIF header: {e}")))?;

    let global_palette = decoder.global_palette().map(<[u8]>::to_vec);
    let background_index = decoder.bg_color();
    let mut screen = Size::new(u32::from(decoder.width()), u32::from(decoder.height()));

    let mut canvas: Option<Canvas> = None;
    let mut compositor: Option<Compositor> = None;
    let mut elapsed = 0u64;
    let mut frame_count = 0usize;

    loop {
        let Some(record) = decoder
            .read_next_frame()
            .map_err(|e| AnimError::decode(format!("read GIF frame {frame_count}: {e}")))?
        else {
            break;
        };

        let mut rect = Rect::new(
            u32::from(record.left),
            u32::from(record.top),
            u32::from(record.width),
            u32::from(record.height),
        );

        if canvas.is_none() {
            if screen.is_empty() {
                tracing::warn!(
                    width = rect.width,
                    height = rect.height,
                    "GIF logical screen is 0x0, using the first frame size"
                );
                screen = rect.size();
                rect.left = 0;
                rect.top = 0;
            }
            let started = Canvas {
                width: screen.width,
                height: screen.height,
                background: background_color(
                    global_palette.as_deref(),
                    background_index,
                    record.transparent,
                ),
                loop_count: None,
                format: SourceFormat::Gif,
                gif: Some(GifScreenInfo {
                    background_index,
                    global_palette_len: global_palette.as_ref().map_or(0, |p| p.len() / 3),
                }),
            };
            compositor = Some(Compositor::new(screen));
            let flow = sink.on_start(&started)?;
            canvas = Some(started);
            if flow == Flow::Stop {
                break;
            }
        }
        let Some(comp) = compositor.as_mut() else {
            break;
        };

        let disposal = match record.dispose {
            gif::DisposalMethod::Any => Disposal::Unspecified,
            gif::DisposalMethod::Keep => Disposal::Keep,
            gif::DisposalMethod::Background => Disposal::Background,
            gif::DisposalMethod::Previous => Disposal::Previous,
        };
        let palette = record
            .palette
            .as_deref()
            .or(global_palette.as_deref())
            .ok_or_else(|| {
                AnimError::decode(format!("GIF frame {frame_count} has no color table"))
            })?;

        let info = GifFrameInfo {
            rect,
            interlaced: record.interlaced,
            transparent: record.transparent,
            local_palette_len: record.palette.as_ref().map(|p| p.len() / 3),
            disposal,
            delay_cs: record.delay,
        };
        comp.begin_frame(disposal);
        comp.paint(rect, &record.buffer, palette, record.transparent)
            .map_err(|e| AnimError::decode(format!("GIF frame {frame_count}: {e}")))?;

        let span = TimeRange::new(elapsed, elapsed + u64::from(record.delay) * 10)?;
        elapsed = span.end;
        frame_count += 1;

        let frame = Frame {
            picture: comp.canvas(),
            gif: Some(info),
        };
        let flow = sink.on_frame(&frame, span)?;
        comp.dispose(rect, disposal);
        if flow == Flow::Stop {
            break;
        }
    }

    let mut finished = match canvas {
        Some(c) => c,
        None => {
            // Zero-frame stream: still honour the contract with the header canvas.
            if screen.is_empty() {
                return Err(AnimError::decode(
                    "GIF has no frames and an empty logical screen",
                ));
            }
            let empty = Canvas {
                width: screen.width,
                height: screen.height,
                background: background_color(global_palette.as_deref(), background_index, None),
                loop_count: None,
                format: SourceFormat::Gif,
                gif: Some(GifScreenInfo {
                    background_index,
                    global_palette_len: global_palette.as_ref().map_or(0, |p| p.len() / 3),
                }),
            };
            sink.on_start(&empty)?;
            empty
        }
    };

    let raw = match decoder.repeat() {
        gif::Repeat::Infinite => Some(0),
        gif::Repeat::Finite(0) => None,
        gif::Repeat::Finite(n) => Some(n),
    };
    finished.loop_count = resolve_loop_count(loop_mode, raw, frame_count);
    tracing::debug!(
        frames = frame_count,
        duration_ms = elapsed,
        loop_count = ?finished.loop_count,
        "GIF decoded"
    );
    sink.on_end(&finished)
}

/// Background of the logical screen.
///
/// Transparent when the background index is also the first frame's transparency index, white
/// when the index has no color table entry.
pub(crate) fn background_color(
    palette: Option<&[u8]>,
    background_index: Option<usize>,
    transparent: Option<u8>,
) -> Color {
    let Some(index) = background_index else {
        return Color::WHITE;
    };
    if transparent.map(usize::from) == Some(index) {
        return Color::TRANSPARENT;
    }
    match palette.and_then(|p| p.get(index * 3..index * 3 + 3)) {
        Some(rgb) => Color::rgba(rgb[0], rgb[1], rgb[2], 255),
        None => Color::WHITE,
    }
}

/// Map the decoded NETSCAPE count (`Some(0)` = infinite, `None` = no block) to the reported one.
pub(crate) fn resolve_loop_count(
    mode: GifLoopMode,
    raw: Option<u16>,
    frame_count: usize,
) -> Option<u16> {
    match mode {
        GifLoopMode::Compatible => raw.filter(|&n| n != 0),
        GifLoopMode::WebP => match raw {
            None if frame_count > 1 => Some(1),
            None => None,
            Some(0) => Some(0),
            Some(n) if n < u16::MAX => Some(n + 1),
            Some(n) => Some(n),
        },
    }
}

/// Running canvas plus the snapshot needed by restore-previous disposal.
#[derive(Debug)]
pub(crate) struct Compositor {
    current: Picture,
    previous: Picture,
}

impl Compositor {
    pub(crate) fn new(size: Size) -> Self {
        Self {
            current: Picture::new(size.width, size.height),
            previous: Picture::new(size.width, size.height),
        }
    }

    pub(crate) fn canvas(&self) -> &Picture {
        &self.current
    }

    fn size(&self) -> Size {
        Size::of(&self.current)
    }

    /// Snapshot the canvas when the coming frame will need restoring.
    pub(crate) fn begin_frame(&mut self, disposal: Disposal) {
        if disposal == Disposal::Previous {
            self.previous.copy_from_slice(&self.current);
        }
    }

    /// Composite an indexed sub-rectangle, skipping the transparency index.
    pub(crate) fn paint(
        &mut self,
        rect: Rect,
        indices: &[u8],
        palette: &[u8],
        transparent: Option<u8>,
    ) -> AnimResult<()> {
        let stride = rect.width as usize;
        if indices.len() < stride * rect.height as usize {
            return Err(AnimError::decode(format!(
                "{} indices for a {}x{} rectangle",
                indices.len(),
                rect.width,
                rect.height
            )));
        }
        let visible = rect.clip_to(self.size());
        for y in visible.top..visible.top + visible.height {
            let row = (y - rect.top) as usize * stride;
            for x in visible.left..visible.left + visible.width {
                let index = indices[row + (x - rect.left) as usize];
                if Some(index) == transparent {
                    continue;
                }
                let i = usize::from(index) * 3;
                let color = match palette.get(i..i + 3) {
                    Some(rgb) => Color::rgba(rgb[0], rgb[1], rgb[2], 255),
                    None => Color::BLACK,
                };
                self.current.put_pixel(x, y, color.to_pixel());
            }
        }
        Ok(())
    }

    /// Prepare the canvas for the next frame.
    ///
    /// Zero-sized rectangles dispose the whole screen.
    pub(crate) fn dispose(&mut self, rect: Rect, disposal: Disposal) {
        let area = if rect.is_empty() {
            Rect::full(self.size())
        } else {
            rect.clip_to(self.size())
        };
        match disposal {
            Disposal::Unspecified | Disposal::Keep => {}
            Disposal::Background => {
                for y in area.top..area.top + area.height {
                    for x in area.left..area.left + area.width {
                        self.current.put_pixel(x, y, Color::TRANSPARENT.to_pixel());
                    }
                }
            }
            Disposal::Previous => {
                for y in area.top..area.top + area.height {
                    for x in area.left..area.left + area.width {
                        let saved = *self.previous.get_pixel(x, y);
                        self.current.put_pixel(x, y, saved);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/gif.rs"]
mod tests;
