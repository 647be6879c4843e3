//! Compositing primitives over [`Picture`] buffers.
//!
//! All pixels are straight-alpha RGBA8. Only [`rescale`] works in premultiplied space internally,
//! so transparent regions do not bleed their color into visible neighbours.

pub(crate) mod cow;

use crate::foundation::core::{Color, Picture, Point, Rect, Size, fit_to};
use crate::foundation::error::{AnimError, AnimResult};

/// How a layer is merged with the picture it is drawn onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum LayerMode {
    /// Source drawn on top of the destination.
    Over,
    /// Source drawn underneath the destination.
    Under,
}

/// Allocate a picture of `size` filled with `color`.
pub fn new_canvas(size: Size, color: Color) -> AnimResult<Picture> {
    if size.is_empty() {
        return Err(AnimError::config(format!(
            "canvas size must be non-zero, got {}x{}",
            size.width, size.height
        )));
    }
    Ok(Picture::from_pixel(size.width, size.height, color.to_pixel()))
}

/// Copy `rect` out of `picture`.
pub fn crop(picture: &Picture, rect: Rect) -> AnimResult<Picture> {
    if rect.is_empty() || !rect.fits_in(Size::of(picture)) {
        return Err(AnimError::config(format!(
            "crop {}:{}:{}:{} does not fit a {}x{} picture",
            rect.left,
            rect.top,
            rect.width,
            rect.height,
            picture.width(),
            picture.height()
        )));
    }
    Ok(image::imageops::crop_imm(picture, rect.left, rect.top, rect.width, rect.height).to_image())
}

/// Resample `picture` to `size` with a triangle filter.
pub fn rescale(picture: &Picture, size: Size) -> AnimResult<Picture> {
    if size.is_empty() {
        return Err(AnimError::config(format!(
            "rescale target must be non-zero, got {}x{}",
            size.width, size.height
        )));
    }
    if Size::of(picture) == size {
        return Ok(picture.clone());
    }

    let mut premul = picture.clone();
    premultiply_rgba8_in_place(&mut premul);
    let mut out = image::imageops::resize(
        &premul,
        size.width,
        size.height,
        image::imageops::FilterType::Triangle,
    );
    unpremultiply_rgba8_in_place(&mut out);
    Ok(out)
}

/// Straight-alpha "over" operator: `top` composited onto `bottom`.
pub fn blend(bottom: Color, top: Color) -> Color {
    let alpha_bottom = f32::from(bottom.a) / 255.0;
    let alpha_top = f32::from(top.a) / 255.0;
    let alpha = alpha_bottom + alpha_top - alpha_top * alpha_bottom;
    if alpha == 0.0 {
        return Color::TRANSPARENT;
    }

    let channel = |t: u8, b: u8| -> u8 {
        ((f32::from(t) * alpha_top + f32::from(b) * alpha_bottom * (1.0 - alpha_top)) / alpha) as u8
    };
    Color::rgba(
        channel(top.r, bottom.r),
        channel(top.g, bottom.g),
        channel(top.b, bottom.b),
        (alpha * 255.0) as u8,
    )
}

/// Draw `src` with its top-left corner at `at`, clipped to the overlap with `dst`.
pub fn draw(dst: &mut Picture, src: &Picture, at: Point, mode: LayerMode) {
    let x0 = at.x.max(0);
    let y0 = at.y.max(0);
    let x1 = (at.x + i64::from(src.width())).min(i64::from(dst.width()));
    let y1 = (at.y + i64::from(src.height())).min(i64::from(dst.height()));

    for y in y0..y1 {
        for x in x0..x1 {
            let s = Color::from_pixel(*src.get_pixel((x - at.x) as u32, (y - at.y) as u32));
            let d = dst.get_pixel_mut(x as u32, y as u32);
            let merged = match mode {
                LayerMode::Over => blend(Color::from_pixel(*d), s),
                LayerMode::Under => blend(s, Color::from_pixel(*d)),
            };
            *d = merged.to_pixel();
        }
    }
}

/// Rescale `src` into the centered aspect-fit rectangle of `dst`, then draw it.
pub fn draw_fit(dst: &mut Picture, src: &Picture, mode: LayerMode) -> AnimResult<()> {
    let fit = fit_to(Size::of(dst), Size::of(src));
    tracing::debug!(
        left = fit.left,
        top = fit.top,
        width = fit.width,
        height = fit.height,
        "fit layer"
    );
    let scaled = rescale(src, fit.size())?;
    draw(
        dst,
        &scaled,
        Point::new(i64::from(fit.left), i64::from(fit.top)),
        mode,
    );
    Ok(())
}

/// Replace every pixel's color with `color`, keeping its alpha.
pub fn tint(picture: &mut Picture, color: Color) {
    for px in picture.pixels_mut() {
        px.0 = [color.r, color.g, color.b, px.0[3]];
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/picture/mod.rs"]
mod tests;
