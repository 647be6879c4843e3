//! Frame dropping, duration capping and crop/resize fan-out.
//!
//! [`DropFrames`] is a [`DecodeSink`]: it resamples the decoded timeline, crops every kept frame
//! once per transform, resizes it once per destination and feeds one encoder per destination.

pub(crate) mod paths;
pub(crate) mod resample;
pub(crate) mod transform;

use std::path::PathBuf;

use crate::dropframes::paths::OutputTarget;
use crate::dropframes::resample::Resampler;
use crate::dropframes::transform::FrameTransform;
use crate::encode::{AnimEncoder, EncoderOptions, FrameOptions, OutputFormat, create_encoder};
use crate::foundation::core::{Rect, Size, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};
use crate::picture::cow::CowPicture;
use crate::source::{Canvas, DecodeOptions, DecodeSink, Flow, Frame, decode_file};

/// Options for [`drop_frames`].
#[derive(Clone, Debug, Default)]
pub struct DropFramesOptions {
    /// Source animation or still image.
    pub input: PathBuf,
    /// Output file for the first destination; siblings derive their names from it.
    pub output: Option<PathBuf>,
    /// Directory receiving every output; takes precedence over `output`.
    pub output_dir: Option<PathBuf>,
    /// Target frames per second; 0 keeps every frame.
    pub frame_rate: u32,
    /// Cap on the output duration in milliseconds; 0 keeps the full length.
    pub total_duration: u64,
    /// Forced loop count (0 = infinite); `None` respects the source.
    pub loop_count: Option<u16>,
    /// Container-level encoder options.
    pub encoder: EncoderOptions,
    /// Per-frame compression options.
    pub frame: FrameOptions,
    /// Crop/resize rules; each produces one output per destination.
    pub transforms: Vec<FrameTransform>,
    /// Source decoding options.
    pub decode: DecodeOptions,
}

/// Summary of a finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropFramesReport {
    /// Frames decoded from the source.
    pub frames_in: u64,
    /// Frames forwarded to the encoders.
    pub frames_out: u64,
    /// Files written, in transform/destination order.
    pub written: Vec<PathBuf>,
}

type EncoderFactory =
    Box<dyn FnMut(OutputFormat, Size, &EncoderOptions) -> AnimResult<Box<dyn AnimEncoder>>>;

struct Output {
    size: Size,
    encoder: Option<Box<dyn AnimEncoder>>,
}

struct TransformGroup {
    crop: Rect,
    outputs: Vec<Output>,
}

/// Resampling and fan-out engine for one run.
pub struct DropFrames {
    options: DropFramesOptions,
    factory: EncoderFactory,
    resampler: Resampler,
    groups: Vec<TransformGroup>,
    failures: Vec<String>,
    written: Vec<PathBuf>,
}

impl DropFrames {
    /// Validate `options` and build an engine that has not seen any frame yet.
    pub fn new(options: DropFramesOptions) -> AnimResult<Self> {
        if options.transforms.is_empty() {
            return Err(AnimError::config("at least one transform is required"));
        }
        for (i, t) in options.transforms.iter().enumerate() {
            t.validate()
                .map_err(|e| AnimError::config(format!("transform {i}: {e}")))?;
        }
        options.frame.validate()?;
        tracing::debug!(
            frame_rate = options.frame_rate,
            total_duration = options.total_duration,
            loop_count = ?options.loop_count,
            transforms = options.transforms.len(),
            "dropframes options"
        );

        Ok(Self {
            resampler: Resampler::new(options.frame_rate, options.total_duration),
            options,
            factory: Box::new(|format: OutputFormat, size: Size, opts: &EncoderOptions| {
                create_encoder(format, size.width, size.height, opts)
            }),
            groups: Vec::new(),
            failures: Vec::new(),
            written: Vec::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_encoder_factory(
        mut self,
        factory: impl FnMut(OutputFormat, Size, &EncoderOptions) -> AnimResult<Box<dyn AnimEncoder>>
        + 'static,
    ) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Counters and written files so far.
    pub fn report(&self) -> DropFramesReport {
        DropFramesReport {
            frames_in: self.resampler.frames_in(),
            frames_out: self.resampler.frames_out(),
            written: self.written.clone(),
        }
    }

    fn loop_count(&self, canvas: &Canvas) -> u16 {
        self.options
            .loop_count
            .unwrap_or_else(|| canvas.loop_count.filter(|&n| n > 0).unwrap_or(0))
    }

    fn all_failed(&self) -> bool {
        self.groups
            .iter()
            .flat_map(|g| &g.outputs)
            .all(|o| o.encoder.is_none())
    }
}

impl DecodeSink for DropFrames {
    fn on_start(&mut self, canvas: &Canvas) -> AnimResult<Flow> {
        let canvas_size = canvas.size();
        tracing::debug!(
            width = canvas.width,
            height = canvas.height,
            format = ?canvas.format,
            "source canvas"
        );

        let mut groups = Vec::with_capacity(self.options.transforms.len());
        for (i, t) in self.options.transforms.iter().enumerate() {
            let crop = t.source.resolve(canvas_size)?;
            tracing::debug!(
                transform = i,
                left = crop.left,
                top = crop.top,
                width = crop.width,
                height = crop.height,
                "normalized crop"
            );
            let mut outputs = Vec::with_capacity(t.destinations.len());
            for (j, dest) in t.destinations.iter().enumerate() {
                let size = dest.resolve_size(crop.size())?;
                let encoder = (self.factory)(dest.output_format(), size, &self.options.encoder)?;
                tracing::debug!(
                    transform = i,
                    destination = j,
                    width = size.width,
                    height = size.height,
                    format = encoder.file_extension(),
                    "encoder created"
                );
                outputs.push(Output {
                    size,
                    encoder: Some(encoder),
                });
            }
            groups.push(TransformGroup { crop, outputs });
        }
        self.groups = groups;
        Ok(Flow::Continue)
    }

    fn on_frame(&mut self, frame: &Frame<'_>, span: TimeRange) -> AnimResult<Flow> {
        let step = self.resampler.step(span)?;
        match step.emit {
            Some(out) => {
                tracing::debug!(
                    start = span.start,
                    end = span.end,
                    out_start = out.start,
                    out_end = out.end,
                    "frame kept"
                );
                for (i, group) in self.groups.iter_mut().enumerate() {
                    if group.outputs.iter().all(|o| o.encoder.is_none()) {
                        continue;
                    }
                    let mut cropped = CowPicture::borrowed(frame.picture);
                    cropped.crop(group.crop)?;
                    for (j, output) in group.outputs.iter_mut().enumerate() {
                        let Some(encoder) = output.encoder.as_mut() else {
                            continue;
                        };
                        let mut scaled = CowPicture::borrowed(cropped.picture());
                        let added = scaled.rescale(output.size).and_then(|()| {
                            encoder.add_frame(scaled.picture(), out, &self.options.frame)
                        });
                        if let Err(e) = added {
                            tracing::error!(
                                transform = i,
                                destination = j,
                                error = %e,
                                "destination failed"
                            );
                            output.encoder = None;
                            self.failures.push(format!("t{i}d{j}: {e}"));
                        }
                    }
                }
            }
            None => tracing::debug!(start = span.start, end = span.end, "frame dropped"),
        }

        if step.stop {
            tracing::debug!(cap = self.options.total_duration, "total duration reached");
            return Ok(Flow::Stop);
        }
        if self.all_failed() {
            return Ok(Flow::Stop);
        }
        Ok(Flow::Continue)
    }

    fn on_end(&mut self, canvas: &Canvas) -> AnimResult<()> {
        let final_ts = self.resampler.final_timestamp();
        let loop_count = self.loop_count(canvas);
        let target = OutputTarget {
            input: &self.options.input,
            output: self.options.output.as_deref(),
            output_dir: self.options.output_dir.as_deref(),
        };

        for (i, group) in self.groups.iter_mut().enumerate() {
            for (j, output) in group.outputs.iter_mut().enumerate() {
                let Some(encoder) = output.encoder.take() else {
                    continue;
                };
                let file_name = self.options.transforms[i].destinations[j].file_name.as_deref();
                let path = target.path_for(i, j, file_name, encoder.file_extension());
                tracing::debug!(final_ts, loop_count, path = %path.display(), "exporting");
                match encoder.export(final_ts, loop_count, &path) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "created");
                        self.written.push(path);
                    }
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "export failed");
                        self.failures.push(format!("t{i}d{j} ({}): {e}", path.display()));
                    }
                }
            }
        }

        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(AnimError::encode(format!(
                "{} destination(s) failed: {}",
                self.failures.len(),
                self.failures.join("; ")
            )))
        }
    }
}

/// Decode `options.input` and write every transform destination.
#[tracing::instrument(skip(options), fields(input = %options.input.display()))]
pub fn drop_frames(options: &DropFramesOptions) -> AnimResult<DropFramesReport> {
    let mut engine = DropFrames::new(options.clone())?;
    decode_file(&options.input, &options.decode, &mut engine)?;
    let report = engine.report();
    tracing::info!(
        frames_in = report.frames_in,
        frames_out = report.frames_out,
        files = report.written.len(),
        "dropframes finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/dropframes/mod.rs"]
mod tests;
