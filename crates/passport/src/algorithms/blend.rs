//! Raster primitives used by the compositor: scaled draws, destination-in
//! masking, source-over and multiply compositing, and border strokes.

use image::{
    Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use super::geometry::Placement;
use crate::types::Rgb;

const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Opaque canvas filled with one color.
pub fn solid_fill(width: u32, height: u32, color: Rgb) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color.to_rgba())
}

/// Draw `src` resampled to `placement` onto a fully transparent layer of the
/// given size. Anything outside the layer is clipped.
pub fn draw_scaled(width: u32, height: u32, src: &RgbaImage, placement: &Placement) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    let (x, y, w, h) = placement.pixel_rect();
    if x >= width as i64 || y >= height as i64 || x + w as i64 <= 0 || y + h as i64 <= 0 {
        return layer;
    }
    let scaled = if (w, h) == src.dimensions() {
        src.clone()
    } else {
        imageops::resize(src, w, h, RESAMPLE_FILTER)
    };
    imageops::replace(&mut layer, &scaled, x, y);
    layer
}

/// Keep `layer` only where `mask` is opaque ("destination-in"): each alpha
/// is multiplied by the mask's alpha drawn at `placement`. Pixels the mask
/// does not reach become transparent.
pub fn destination_in(layer: &mut RgbaImage, mask: &RgbaImage, placement: &Placement) {
    let stencil = draw_scaled(layer.width(), layer.height(), mask, placement);
    for (pixel, gate) in layer.pixels_mut().zip(stencil.pixels()) {
        let alpha = pixel[3] as u32 * gate[3] as u32;
        pixel[3] = ((alpha + 127) / 255) as u8;
    }
}

/// Standard alpha compositing of `src` over `dst`, same dimensions.
pub fn source_over(dst: &mut RgbaImage, src: &RgbaImage) {
    for (base, top) in dst.pixels_mut().zip(src.pixels()) {
        let sa = top[3] as u32;
        match sa {
            0 => continue,
            255 => *base = *top,
            _ => {
                let da = base[3] as u32 * (255 - sa);
                let out_a = sa * 255 + da;
                for c in 0..3 {
                    let value = top[c] as u32 * sa * 255 + base[c] as u32 * da;
                    base[c] = ((value + out_a / 2) / out_a) as u8;
                }
                base[3] = ((out_a + 127) / 255) as u8;
            }
        }
    }
}

/// Multiply-blend `src` over an opaque `dst`:
/// `out = (1 - a) * dst + a * dst * src / 255`.
pub fn multiply_over(dst: &mut RgbaImage, src: &RgbaImage) {
    for (base, top) in dst.pixels_mut().zip(src.pixels()) {
        let alpha = top[3] as u32;
        if alpha == 0 {
            continue;
        }
        for c in 0..3 {
            let cb = base[c] as u32;
            let cs = top[c] as u32;
            let value = cb * (255 - alpha) * 255 + alpha * cb * cs;
            base[c] = ((value + 32_512) / 65_025) as u8;
        }
    }
}

/// One-pixel outline just inside the given rectangle.
pub fn stroke_border(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgb) {
    if width == 0 || height == 0 {
        return;
    }
    let rect = Rect::at(x as i32, y as i32).of_size(width, height);
    draw_hollow_rect_mut(canvas, rect, color.to_rgba());
}

/// Paste an opaque cell onto the sheet canvas.
pub fn paste(canvas: &mut RgbaImage, cell: &RgbaImage, x: u32, y: u32) {
    imageops::replace(canvas, cell, x as i64, y as i64);
}

pub fn is_opaque(pixel: &Rgba<u8>) -> bool {
    pixel[3] == 255
}
