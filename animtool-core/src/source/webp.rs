//! WebP adapter: container metadata from `image-webp`, animation frames from libwebp.

use std::io::Cursor;

use crate::foundation::core::{Color, Picture, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};
use crate::source::{Canvas, DecodeSink, Flow, Frame, SourceFormat};

pub(crate) fn run(bytes: &[u8], sink: &mut dyn DecodeSink) -> AnimResult<()> {
    let mut decoder = image_webp::WebPDecoder::new(Cursor::new(bytes))
        .map_err(|e| AnimError::decode(format!("read WebP header: {e}")))?;

    let (width, height) = decoder.dimensions();
    let loop_count = match decoder.loop_count() {
        image_webp::LoopCount::Forever => 0,
        image_webp::LoopCount::Times(n) => n.get(),
    };
    let background = decoder
        .background_color_hint()
        .map_or(Color::WHITE, |[r, g, b, a]| Color::rgba(r, g, b, a));
    let canvas = Canvas {
        width,
        height,
        background,
        loop_count: Some(loop_count),
        format: SourceFormat::WebP,
        gif: None,
    };

    if sink.on_start(&canvas)? == Flow::Continue {
        if decoder.is_animated() {
            animate(bytes, width, height, decoder.num_frames(), sink)?;
        } else {
            let has_alpha = decoder.has_alpha();
            let len = decoder.output_buffer_size().ok_or_else(|| {
                AnimError::decode(format!("WebP canvas {width}x{height} is too large"))
            })?;
            let mut buf = vec![0u8; len];
            decoder
                .read_image(&mut buf)
                .map_err(|e| AnimError::decode(format!("read WebP image: {e}")))?;
            let picture = to_picture(width, height, &buf, has_alpha)?;
            let frame = Frame {
                picture: &picture,
                gif: None,
            };
            sink.on_frame(&frame, TimeRange::default())?;
        }
    }

    sink.on_end(&canvas)
}

/// Composite animation frames with libwebp, which leaves opaque pixels untouched.
///
/// The decoder reports each frame's end timestamp.
fn animate(
    bytes: &[u8],
    width: u32,
    height: u32,
    expected: u32,
    sink: &mut dyn DecodeSink,
) -> AnimResult<()> {
    let decoder = webp_animation::Decoder::new(bytes)
        .map_err(|e| AnimError::decode(format!("open WebP animation: {e}")))?;
    let mut elapsed = 0u64;
    let mut decoded = 0u32;
    for raw in decoder {
        let end = u64::try_from(raw.timestamp()).map_err(|_| {
            AnimError::decode(format!(
                "WebP frame {decoded} has a negative timestamp {}",
                raw.timestamp()
            ))
        })?;
        let span = TimeRange::new(elapsed, end.max(elapsed))?;
        elapsed = span.end;
        decoded += 1;
        let picture = to_picture(width, height, raw.data(), true)?;
        let frame = Frame {
            picture: &picture,
            gif: None,
        };
        if sink.on_frame(&frame, span)? == Flow::Stop {
            return Ok(());
        }
    }
    if decoded < expected {
        return Err(AnimError::decode(format!(
            "WebP animation ended after {decoded} of {expected} frames"
        )));
    }
    Ok(())
}

fn to_picture(width: u32, height: u32, buf: &[u8], has_alpha: bool) -> AnimResult<Picture> {
    let rgba = if has_alpha {
        buf.to_vec()
    } else {
        let mut out = Vec::with_capacity(buf.len() / 3 * 4);
        for px in buf.chunks_exact(3) {
            out.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        out
    };
    Picture::from_raw(width, height, rgba)
        .ok_or_else(|| AnimError::decode(format!("WebP buffer does not match {width}x{height}")))
}

#[cfg(test)]
#[path = "../../tests/unit/source/webp.rs"]
mod tests;
