use crate::encode::quantize::{IndexMapper, Palette, TRANSPARENT_INDEX};
use crate::encode::{AnimEncoder, FrameOptions};
use crate::foundation::core::{Picture, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};

const NETSCAPE_ID: &[u8] = b"NETSCAPE2.0";

/// GIF89a encoder writing full-canvas frames with a per-frame palette.
///
/// Index 0 of every local palette is the transparency slot; frames dispose to background so
/// each one fully replaces the previous.
pub(crate) struct GifAnimEncoder {
    encoder: gif::Encoder<Vec<u8>>,
    width: u16,
    height: u16,
    elapsed_cs: u64,
}

impl GifAnimEncoder {
    pub(crate) fn new(width: u32, height: u32) -> AnimResult<Self> {
        let w = u16::try_from(width)
            .map_err(|_| AnimError::config(format!("GIF width {width} exceeds 65535")))?;
        let h = u16::try_from(height)
            .map_err(|_| AnimError::config(format!("GIF height {height} exceeds 65535")))?;
        let mut encoder = gif::Encoder::new(Vec::new(), w, h, &[])
            .map_err(|e| AnimError::encode(format!("create GIF encoder: {e}")))?;
        // Written up-front; the real count is patched in at finish.
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(|e| AnimError::encode(format!("write GIF loop block: {e}")))?;
        Ok(Self {
            encoder,
            width: w,
            height: h,
            elapsed_cs: 0,
        })
    }
}

impl AnimEncoder for GifAnimEncoder {
    fn add_frame(
        &mut self,
        picture: &Picture,
        span: TimeRange,
        _opts: &FrameOptions,
    ) -> AnimResult<()> {
        if picture.dimensions() != (u32::from(self.width), u32::from(self.height)) {
            return Err(AnimError::encode(format!(
                "frame is {}x{}, encoder expects {}x{}",
                picture.width(),
                picture.height(),
                self.width,
                self.height
            )));
        }

        let end_cs = centiseconds(span.end);
        let delay = end_cs.saturating_sub(self.elapsed_cs);
        self.elapsed_cs = self.elapsed_cs.max(end_cs);

        let palette = Palette::for_picture(picture);
        let indices = IndexMapper::new(&palette).map_picture(picture);
        tracing::trace!(colors = palette.colors().len(), delay_cs = delay, "GIF frame");

        let mut frame = gif::Frame::from_palette_pixels(
            self.width,
            self.height,
            indices,
            palette.to_color_table(),
            Some(TRANSPARENT_INDEX),
        );
        frame.delay = u16::try_from(delay).unwrap_or_else(|_| {
            tracing::warn!(
                delay_cs = delay,
                start = span.start,
                "GIF frame delay capped at 65535 cs"
            );
            u16::MAX
        });
        frame.dispose = gif::DisposalMethod::Background;
        self.encoder
            .write_frame(&frame)
            .map_err(|e| AnimError::encode(format!("write GIF frame at {} ms: {e}", span.start)))
    }

    fn finish(self: Box<Self>, _final_ts: u64, loop_count: u16) -> AnimResult<Vec<u8>> {
        let mut bytes = self
            .encoder
            .into_inner()
            .map_err(|e| AnimError::encode(format!("finish GIF stream: {e}")))?;
        patch_loop_count(&mut bytes, loop_count);
        Ok(bytes)
    }

    fn file_extension(&self) -> &'static str {
        "gif"
    }
}

/// Cumulative centiseconds, rounded half away from zero.
pub(crate) fn centiseconds(ms: u64) -> u64 {
    (ms as f64 / 10.0).round() as u64
}

/// Translate a play count into the NETSCAPE block.
///
/// 0 stays infinite, 1 removes the block (play once), `n` becomes `n - 1` repeats.
pub(crate) fn patch_loop_count(bytes: &mut Vec<u8>, loop_count: u16) {
    let Some(id_at) = bytes
        .windows(NETSCAPE_ID.len())
        .position(|w| w == NETSCAPE_ID)
    else {
        return;
    };
    // 0x21 0xFF 0x0B "NETSCAPE2.0" 0x03 0x01 <lo> <hi> 0x00
    let Some(block_start) = id_at.checked_sub(3) else {
        return;
    };
    let count_at = id_at + NETSCAPE_ID.len() + 2;
    if count_at + 3 > bytes.len() {
        return;
    }
    match loop_count {
        0 => bytes[count_at..count_at + 2].copy_from_slice(&0u16.to_le_bytes()),
        1 => {
            bytes.drain(block_start..count_at + 3);
        }
        n => bytes[count_at..count_at + 2].copy_from_slice(&(n - 1).to_le_bytes()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
