use webp_animation::{
    EncoderOptions as WebPOptions, EncodingConfig, EncodingType, LossyEncodingConfig,
};

use crate::encode::{AnimEncoder, EncoderOptions, FrameOptions};
use crate::foundation::core::{Color, Picture, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};

/// Animated WebP encoder backed by libwebp's animation encoder.
///
/// The underlying encoder requires strictly increasing timestamps, so the most recent frame is
/// held back: a frame starting at the same time as the held one replaces it.
///
/// Compression settings are installed as the encoder default and re-installed only when the
/// frame options change.
pub(crate) struct WebPAnimEncoder {
    inner: webp_animation::Encoder,
    width: u32,
    height: u32,
    background: Color,
    applied: Option<FrameOptions>,
    pending: Option<PendingFrame>,
}

struct PendingFrame {
    rgba: Vec<u8>,
    start: u64,
    opts: FrameOptions,
}

impl WebPAnimEncoder {
    pub(crate) fn new(width: u32, height: u32, opts: &EncoderOptions) -> AnimResult<Self> {
        let options = WebPOptions {
            minimize_size: opts.minimize_size,
            ..Default::default()
        };
        let inner = webp_animation::Encoder::new_with_options((width, height), options)
            .map_err(|e| AnimError::encode(format!("create WebP encoder: {e}")))?;
        Ok(Self {
            inner,
            width,
            height,
            background: opts.background,
            applied: None,
            pending: None,
        })
    }

    fn flush(&mut self) -> AnimResult<()> {
        let Some(frame) = self.pending.take() else {
            return Ok(());
        };
        if self.applied != Some(frame.opts) {
            self.inner
                .set_default_encoding_config(encoding_config(&frame.opts))
                .map_err(|e| AnimError::encode(format!("configure WebP encoder: {e}")))?;
            self.applied = Some(frame.opts);
        }
        self.inner
            .add_frame(&frame.rgba, timestamp(frame.start)?)
            .map_err(|e| {
                AnimError::encode(format!("add WebP frame at {} ms: {e}", frame.start))
            })?;
        Ok(())
    }
}

impl AnimEncoder for WebPAnimEncoder {
    fn add_frame(
        &mut self,
        picture: &Picture,
        span: TimeRange,
        opts: &FrameOptions,
    ) -> AnimResult<()> {
        if picture.dimensions() != (self.width, self.height) {
            return Err(AnimError::encode(format!(
                "frame is {}x{}, encoder expects {}x{}",
                picture.width(),
                picture.height(),
                self.width,
                self.height
            )));
        }
        match self.pending.as_ref().map(|held| held.start) {
            Some(start) if start == span.start => {}
            Some(start) if start > span.start => {
                return Err(AnimError::encode(format!(
                    "frame starts at {} ms, before the previous frame at {start} ms",
                    span.start
                )));
            }
            _ => self.flush()?,
        }
        self.pending = Some(PendingFrame {
            rgba: picture.as_raw().clone(),
            start: span.start,
            opts: *opts,
        });
        Ok(())
    }

    fn finish(mut self: Box<Self>, final_ts: u64, loop_count: u16) -> AnimResult<Vec<u8>> {
        self.flush()?;
        let this = *self;
        let data = this
            .inner
            .finalize(timestamp(final_ts)?)
            .map_err(|e| AnimError::encode(format!("finalize WebP at {final_ts} ms: {e}")))?;
        let mut bytes = data.to_vec();
        if !patch_anim_chunk(&mut bytes, this.background, loop_count) {
            tracing::debug!("WebP output is a still image; no ANIM chunk to patch");
        }
        Ok(bytes)
    }

    fn file_extension(&self) -> &'static str {
        "webp"
    }
}

fn timestamp(ms: u64) -> AnimResult<i32> {
    i32::try_from(ms).map_err(|_| AnimError::encode(format!("timestamp {ms} ms is out of range")))
}

fn encoding_config(opts: &FrameOptions) -> EncodingConfig {
    EncodingConfig {
        encoding_type: if opts.lossless {
            EncodingType::Lossless
        } else {
            EncodingType::Lossy(LossyEncodingConfig::default())
        },
        quality: opts.quality,
        method: usize::from(opts.method),
    }
}

/// Rewrite background color and loop count in the `ANIM` chunk of a RIFF/WebP file.
///
/// Returns `false` when the file has no `ANIM` chunk.
pub(crate) fn patch_anim_chunk(bytes: &mut [u8], background: Color, loop_count: u16) -> bool {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WEBP" {
        return false;
    }
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let size = u32::from_le_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        let payload = pos + 8;
        if &bytes[pos..pos + 4] == b"ANIM" {
            if size < 6 || payload + 6 > bytes.len() {
                return false;
            }
            // Background is stored in [blue, green, red, alpha] order.
            bytes[payload..payload + 4].copy_from_slice(&background.to_argb().to_le_bytes());
            bytes[payload + 4..payload + 6].copy_from_slice(&loop_count.to_le_bytes());
            return true;
        }
        pos = payload + size + (size & 1);
    }
    false
}

#[cfg(test)]
#[path = "../../tests/unit/encode/webp.rs"]
mod tests;
