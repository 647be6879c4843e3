//! Animated output encoders.
//!
//! Encoders receive full frames at their final size in timeline order, then are consumed by
//! [`AnimEncoder::finish`] / [`AnimEncoder::export`]. Dropping an encoder discards its output.

pub(crate) mod gif;
pub(crate) mod quantize;
pub(crate) mod webp;

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Color, Picture, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};

/// Output container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub enum OutputFormat {
    /// Animated WebP (lossy or lossless).
    #[default]
    WebP,
    /// Palette-indexed GIF89a.
    Gif,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = AnimError;

    /// Case-insensitive tag; the empty tag selects WebP.
    fn from_str(s: &str) -> AnimResult<Self> {
        let tag = s.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("webp") {
            Ok(Self::WebP)
        } else if tag.eq_ignore_ascii_case("gif") {
            Ok(Self::Gif)
        } else {
            Err(AnimError::config(format!(
                "unknown output format '{tag}' (expected webp or gif)"
            )))
        }
    }
}

/// Options fixed for the lifetime of one encoder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderOptions {
    /// Spend more time to produce smaller WebP files.
    pub minimize_size: bool,
    /// Background color written into the output container.
    pub background: Color,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            minimize_size: false,
            background: Color::TRANSPARENT,
        }
    }
}

/// Per-frame compression options (WebP only).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameOptions {
    /// Lossless compression.
    pub lossless: bool,
    /// Quality factor in `[0, 100]`.
    pub quality: f32,
    /// Speed/size trade-off in `[0, 6]`.
    pub method: u8,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            lossless: false,
            quality: 75.0,
            method: 0,
        }
    }
}

impl FrameOptions {
    /// Reject out-of-range values.
    pub fn validate(&self) -> AnimResult<()> {
        if !(0.0..=100.0).contains(&self.quality) {
            return Err(AnimError::config(format!(
                "quality must be within [0, 100], got {}",
                self.quality
            )));
        }
        if self.method > 6 {
            return Err(AnimError::config(format!(
                "method must be within [0, 6], got {}",
                self.method
            )));
        }
        Ok(())
    }
}

/// Animated-image encoder contract.
///
/// Frames arrive in non-decreasing start order and have the size given at construction.
pub trait AnimEncoder {
    /// Append one frame shown during `span`.
    fn add_frame(
        &mut self,
        picture: &Picture,
        span: TimeRange,
        opts: &FrameOptions,
    ) -> AnimResult<()>;

    /// Assemble the file. `loop_count` 0 means infinite.
    fn finish(self: Box<Self>, final_ts: u64, loop_count: u16) -> AnimResult<Vec<u8>>;

    /// File extension without the leading dot.
    fn file_extension(&self) -> &'static str;

    /// Assemble the file and write it to `path` atomically.
    fn export(self: Box<Self>, final_ts: u64, loop_count: u16, path: &Path) -> AnimResult<()> {
        let bytes = self.finish(final_ts, loop_count)?;
        write_atomic(path, &bytes)
    }
}

/// Create an encoder for `format` producing a `width`x`height` animation.
pub fn create_encoder(
    format: OutputFormat,
    width: u32,
    height: u32,
    opts: &EncoderOptions,
) -> AnimResult<Box<dyn AnimEncoder>> {
    if width == 0 || height == 0 {
        return Err(AnimError::config(format!(
            "encoder size must be non-zero, got {width}x{height}"
        )));
    }
    match format {
        OutputFormat::WebP => Ok(Box::new(webp::WebPAnimEncoder::new(width, height, opts)?)),
        OutputFormat::Gif => Ok(Box::new(gif::GifAnimEncoder::new(width, height)?)),
    }
}

/// Create the parent directory of `path` when missing.
pub fn ensure_parent_dir(path: &Path) -> AnimResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write through a sibling temp file and rename, so readers never see a partial file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> AnimResult<()> {
    ensure_parent_dir(path)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            AnimError::config(format!("output path '{}' has no file name", path.display()))
        })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp = path.with_file_name(tmp_name);

    let mut guard = TempFileGuard(Some(tmp.clone()));
    std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename '{}' to '{}'", tmp.display(), path.display()))?;
    guard.0 = None;
    Ok(())
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/mod.rs"]
mod tests;
