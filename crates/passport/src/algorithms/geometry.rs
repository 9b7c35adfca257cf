use crate::types::CropTransform;

/// A floating-point destination rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Integer origin and size used when rasterizing. Size is at least 1x1.
    pub fn pixel_rect(&self) -> (i64, i64, u32, u32) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }
}

/// Size of `src` scaled to cover `dst` without gaps, aspect preserved.
pub fn cover_size(src_w: u32, src_h: u32, dst_w: f64, dst_h: f64) -> (f64, f64) {
    let src_aspect = src_w.max(1) as f64 / src_h.max(1) as f64;
    let dst_aspect = dst_w / dst_h;
    if src_aspect > dst_aspect {
        (dst_h * src_aspect, dst_h)
    } else {
        (dst_w, dst_w / src_aspect)
    }
}

/// Where the photo lands inside a cell.
///
/// The photo is cover-fit and centered, scaled by the crop zoom, then moved
/// by the crop offset. The offset was captured on a preview `preview_width`
/// pixels wide and is rescaled to the cell's width.
pub fn place_photo(
    src: (u32, u32),
    cell: (u32, u32),
    crop: &CropTransform,
    preview_width: f32,
) -> Placement {
    let (cell_w, cell_h) = (cell.0 as f64, cell.1 as f64);
    let (cover_w, cover_h) = cover_size(src.0, src.1, cell_w, cell_h);
    let zoom = crop.zoom as f64;
    let scale_factor = cell_w / preview_width.max(1.0) as f64;

    let width = cover_w * zoom;
    let height = cover_h * zoom;
    Placement {
        x: (cell_w - width) / 2.0 + crop.offset.x as f64 * scale_factor,
        y: (cell_h - height) / 2.0 + crop.offset.y as f64 * scale_factor,
        width,
        height,
    }
}

/// Cover-fit `inner` into `outer`, centered. Used to align a mask with the
/// photo's drawn rectangle.
pub fn cover_within(inner: (u32, u32), outer: &Placement) -> Placement {
    let (width, height) = cover_size(inner.0, inner.1, outer.width, outer.height);
    Placement {
        x: outer.x + (outer.width - width) / 2.0,
        y: outer.y + (outer.height - height) / 2.0,
        width,
        height,
    }
}
