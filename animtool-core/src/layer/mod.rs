//! Draw a still image over or under every frame of an animation.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::{AnimEncoder, EncoderOptions, FrameOptions, OutputFormat, create_encoder};
use crate::foundation::core::{Color, Picture, Point, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};
use crate::picture::{LayerMode, draw, draw_fit, tint};
use crate::source::{Canvas, DecodeOptions, DecodeSink, Flow, Frame, decode_file};

/// Where the layer goes on each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Top-left corner at a canvas offset; may be negative.
    At(Point),
    /// Centered at its own size.
    Center,
    /// Rescaled into the centered aspect-fit rectangle of the canvas.
    Fit,
}

impl Default for Placement {
    fn default() -> Self {
        Self::At(Point::default())
    }
}

/// Options for [`add_layer`].
#[derive(Clone, Debug)]
pub struct LayerOptions {
    /// Source animation.
    pub input: PathBuf,
    /// Still image drawn on every frame.
    pub layer: PathBuf,
    /// Output file.
    pub output: PathBuf,
    /// Draw over or under the frames.
    pub mode: LayerMode,
    /// Layer position.
    pub placement: Placement,
    /// Replaces the layer's color when its alpha is non-zero.
    pub tint: Color,
    /// Output container.
    pub format: OutputFormat,
    /// Container-level encoder options; the background is taken from the source.
    pub encoder: EncoderOptions,
    /// Per-frame compression options.
    pub frame: FrameOptions,
    /// Source decoding options.
    pub decode: DecodeOptions,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            layer: PathBuf::new(),
            output: PathBuf::new(),
            mode: LayerMode::Over,
            placement: Placement::default(),
            tint: Color::TRANSPARENT,
            format: OutputFormat::default(),
            encoder: EncoderOptions::default(),
            frame: FrameOptions::default(),
            decode: DecodeOptions::default(),
        }
    }
}

struct LayerSink<'o> {
    options: &'o LayerOptions,
    layer: Picture,
    offset: Point,
    encoder: Option<Box<dyn AnimEncoder>>,
    last_end: u64,
    frames: u64,
}

impl DecodeSink for LayerSink<'_> {
    fn on_start(&mut self, canvas: &Canvas) -> AnimResult<Flow> {
        let opts = EncoderOptions {
            background: canvas.background,
            ..self.options.encoder
        };
        self.encoder = Some(create_encoder(
            self.options.format,
            canvas.width,
            canvas.height,
            &opts,
        )?);
        self.offset = match self.options.placement {
            Placement::At(p) => p,
            Placement::Center | Placement::Fit => Point::new(
                (i64::from(canvas.width) - i64::from(self.layer.width())) / 2,
                (i64::from(canvas.height) - i64::from(self.layer.height())) / 2,
            ),
        };
        tracing::debug!(
            x = self.offset.x,
            y = self.offset.y,
            placement = ?self.options.placement,
            "layer placed"
        );
        Ok(Flow::Continue)
    }

    fn on_frame(&mut self, frame: &Frame<'_>, span: TimeRange) -> AnimResult<Flow> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(AnimError::decode("frame delivered before the canvas"));
        };
        let mut out = frame.picture.clone();
        match self.options.placement {
            Placement::Fit => draw_fit(&mut out, &self.layer, self.options.mode)?,
            Placement::At(_) | Placement::Center => {
                draw(&mut out, &self.layer, self.offset, self.options.mode);
            }
        }
        encoder.add_frame(&out, span, &self.options.frame)?;
        self.last_end = span.end;
        self.frames += 1;
        Ok(Flow::Continue)
    }

    fn on_end(&mut self, canvas: &Canvas) -> AnimResult<()> {
        let Some(encoder) = self.encoder.take() else {
            return Ok(());
        };
        let loop_count = canvas.loop_count.unwrap_or(0);
        encoder.export(self.last_end, loop_count, &self.options.output)?;
        tracing::info!(path = %self.options.output.display(), frames = self.frames, "created");
        Ok(())
    }
}

fn load_layer(path: &Path, color: Color) -> AnimResult<Picture> {
    let bytes = std::fs::read(path).with_context(|| format!("read layer '{}'", path.display()))?;
    let mut layer = image::load_from_memory(&bytes)
        .map_err(|e| AnimError::input(format!("decode layer '{}': {e}", path.display())))?
        .to_rgba8();
    if color.a > 0 {
        tint(&mut layer, color);
    }
    Ok(layer)
}

/// Draw `options.layer` onto every frame of `options.input` and write `options.output`.
///
/// Frame timing is kept as decoded; the loop count is the source's, or infinite when absent.
#[tracing::instrument(
    skip(options),
    fields(input = %options.input.display(), mode = ?options.mode)
)]
pub fn add_layer(options: &LayerOptions) -> AnimResult<()> {
    options.frame.validate()?;
    let layer = load_layer(&options.layer, options.tint)?;
    let mut sink = LayerSink {
        options,
        layer,
        offset: Point::default(),
        encoder: None,
        last_end: 0,
        frames: 0,
    };
    decode_file(&options.input, &options.decode, &mut sink)
}

#[cfg(test)]
#[path = "../../tests/unit/layer/mod.rs"]
mod tests;
