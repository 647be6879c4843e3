//! Still images become a one-frame animation of zero duration.

use crate::foundation::core::{Color, TimeRange};
use crate::foundation::error::{AnimError, AnimResult};
use crate::source::{Canvas, DecodeSink, Flow, Frame, SourceFormat};

pub(crate) fn run(bytes: &[u8], sink: &mut dyn DecodeSink) -> AnimResult<()> {
    let picture = image::load_from_memory(bytes)
        .map_err(|e| AnimError::input(format!("unsupported image data: {e}")))?
        .to_rgba8();

    let canvas = Canvas {
        width: picture.width(),
        height: picture.height(),
        background: Color::TRANSPARENT,
        loop_count: None,
        format: SourceFormat::Still,
        gif: None,
    };
    if sink.on_start(&canvas)? == Flow::Continue {
        let frame = Frame {
            picture: &picture,
            gif: None,
        };
        sink.on_frame(&frame, TimeRange::default())?;
    }
    sink.on_end(&canvas)
}
