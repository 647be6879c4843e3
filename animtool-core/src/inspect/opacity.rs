//! Average opacity over the frames of an animation.

use std::path::Path;

use crate::foundation::core::{Picture, TimeRange};
use crate::foundation::error::AnimResult;
use crate::source::{Canvas, DecodeOptions, DecodeSink, Flow, Frame, decode_file};

/// Mean alpha of `picture` in `[0, 1]`; 0 for an empty picture.
pub fn frame_opacity(picture: &Picture) -> f32 {
    let pixels = u64::from(picture.width()) * u64::from(picture.height());
    if pixels == 0 {
        return 0.0;
    }
    let sum: u64 = picture.pixels().map(|p| u64::from(p.0[3])).sum();
    (sum as f64 / (pixels as f64 * 255.0)) as f32
}

struct OpacitySink {
    sample_divider: u32,
    frames: u64,
    samples: u64,
    total: f64,
}

impl DecodeSink for OpacitySink {
    fn on_start(&mut self, _canvas: &Canvas) -> AnimResult<Flow> {
        Ok(Flow::Continue)
    }

    fn on_frame(&mut self, frame: &Frame<'_>, _span: TimeRange) -> AnimResult<Flow> {
        if self.sample_divider == 0 || self.frames % u64::from(self.sample_divider) == 0 {
            self.total += f64::from(frame_opacity(frame.picture));
            self.samples += 1;
        }
        self.frames += 1;
        Ok(Flow::Continue)
    }

    fn on_end(&mut self, _canvas: &Canvas) -> AnimResult<()> {
        Ok(())
    }
}

/// Average [`frame_opacity`] of every `sample_divider`-th frame (0 samples every frame).
///
/// An animation without frames has opacity 0.
#[tracing::instrument(skip(opts), fields(path = %path.display()))]
pub fn average_opacity(path: &Path, sample_divider: u32, opts: &DecodeOptions) -> AnimResult<f32> {
    let mut sink = OpacitySink {
        sample_divider,
        frames: 0,
        samples: 0,
        total: 0.0,
    };
    decode_file(path, opts, &mut sink)?;
    tracing::debug!(frames = sink.frames, samples = sink.samples, "opacity sampled");
    if sink.samples == 0 {
        return Ok(0.0);
    }
    Ok((sink.total / sink.samples as f64) as f32)
}

#[cfg(test)]
#[path = "../../tests/unit/inspect/opacity.rs"]
mod tests;
