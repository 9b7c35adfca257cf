//! Multi-copy print sheet layout.

use image::RgbaImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    algorithms::{paste, solid_fill, stroke_border},
    compositor::{Compositor, RenderRequest},
    types::Rgb,
};

/// Geometry of the print sheet. Paper size is in inches; margin and gap are
/// in output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SheetLayout {
    pub width_in: u32,
    pub height_in: u32,
    pub margin: u32,
    pub gap: u32,
    /// Upper bound on attempted cells.
    pub max_cells: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            width_in: 6,
            height_in: 4,
            margin: 60,
            gap: 40,
            max_cells: 8,
        }
    }
}

impl SheetLayout {
    pub fn canvas_size(&self, dpi: u32) -> (u32, u32) {
        (self.width_in * dpi, self.height_in * dpi)
    }

    /// Top-left corners of the cells that fit, in row-major order.
    ///
    /// A cell that would cross the right margin starts a new row; the first
    /// cell that would cross the bottom margin ends the layout.
    pub fn slots(&self, canvas: (u32, u32), cell: (u32, u32)) -> Vec<(u32, u32)> {
        let (canvas_w, canvas_h) = canvas;
        let (cell_w, cell_h) = cell;
        let right = canvas_w.saturating_sub(self.margin);
        let bottom = canvas_h.saturating_sub(self.margin);

        let mut slots = Vec::new();
        if cell_w == 0 || cell_h == 0 || self.margin + cell_w > right {
            return slots;
        }

        let (mut x, mut y) = (self.margin, self.margin);
        for _ in 0..self.max_cells {
            if x + cell_w > right {
                x = self.margin;
                y += cell_h + self.gap;
            }
            if y + cell_h > bottom {
                break;
            }
            slots.push((x, y));
            x += cell_w + self.gap;
        }
        slots
    }

    /// Render the sheet, compositing one cell per slot.
    pub fn render(&self, compositor: &Compositor, request: &RenderRequest<'_>) -> RgbaImage {
        let settings = compositor.settings();
        let (width, height) = self.canvas_size(settings.dpi);
        let cell = compositor.cell_size(request.size);
        let mut canvas = solid_fill(width, height, Rgb::WHITE);

        let slots = self.slots((width, height), cell);
        debug!(cells = slots.len(), cell_w = cell.0, cell_h = cell.1, "Laying out print sheet");
        for (x, y) in slots {
            let photo = compositor.render_cell(request);
            paste(&mut canvas, &photo, x, y);
            if let Some(color) = settings.border_color {
                stroke_border(&mut canvas, x, y, cell.0, cell.1, color);
            }
        }
        canvas
    }
}
