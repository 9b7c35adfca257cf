//! Photo cell compositing.
//!
//! Every cell is rendered in a fixed order: background fill, cover-fit photo
//! placement with the crop transform, brightness/contrast, then either the
//! mask path (destination-in, composited over the fill) or the plain path
//! (drawn directly, multiply-blended against a replacement color).

use image::RgbaImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, info};

use crate::{
    algorithms::{
        SegmentationMask, ToneCurve, cover_within, destination_in, draw_scaled, multiply_over,
        place_photo, solid_fill, source_over, stroke_border,
    },
    catalog::PhotoSize,
    error::{PassportError, Result},
    settings::Settings,
    state::Snapshot,
    types::{Adjustments, CropTransform},
};

/// Output canvas shape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Layout {
    /// One photo at the format's exact resolution.
    Single,
    /// Multiple copies on the print sheet.
    Sheet,
}

/// Everything a cell render reads. Borrowed from a state snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub source: &'a RgbaImage,
    pub mask: Option<&'a SegmentationMask>,
    pub adjustments: Adjustments,
    pub crop: CropTransform,
    pub size: PhotoSize,
}

/// Stateless renderer; safe to share and to run concurrently.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    settings: Settings,
}

impl Compositor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cell_size(&self, size: PhotoSize) -> (u32, u32) {
        size.pixels(self.settings.dpi)
    }

    /// Render one photo cell without its border.
    pub fn render_cell(&self, request: &RenderRequest<'_>) -> RgbaImage {
        let (width, height) = self.cell_size(request.size);
        let background = request.adjustments.background;
        let mut cell = solid_fill(width, height, background.fill());

        let placement = place_photo(
            request.source.dimensions(),
            (width, height),
            &request.crop,
            self.settings.preview_width,
        );
        let mut photo = draw_scaled(width, height, request.source, &placement);
        ToneCurve::from_adjustments(&request.adjustments).apply(&mut photo);

        let matte = request.mask.and_then(SegmentationMask::alpha_raster);
        match matte {
            Some(matte) => {
                let mask_placement = cover_within(matte.dimensions(), &placement);
                destination_in(&mut photo, &matte, &mask_placement);
                source_over(&mut cell, &photo);
            }
            None if background.is_original() => source_over(&mut cell, &photo),
            None => multiply_over(&mut cell, &photo),
        }
        cell
    }

    /// Render a single photo with its border.
    pub fn render_single(&self, request: &RenderRequest<'_>) -> RgbaImage {
        let mut cell = self.render_cell(request);
        if let Some(color) = self.settings.border_color {
            let (width, height) = cell.dimensions();
            stroke_border(&mut cell, 0, 0, width, height, color);
        }
        cell
    }

    pub fn render_sheet(&self, request: &RenderRequest<'_>) -> RgbaImage {
        self.settings.sheet.render(self, request)
    }

    /// Render a snapshot of the editor state.
    ///
    /// Returns `Ok(None)` when no target format is selected or the format
    /// maps to an empty canvas.
    pub fn render(&self, snapshot: &Snapshot, layout: Layout) -> Result<Option<RgbaImage>> {
        let Some(target) = snapshot.target else {
            debug!(%layout, "No target format selected, nothing to render");
            return Ok(None);
        };
        let source = snapshot.source.as_ref().ok_or(PassportError::NoSourceImage)?;

        let (cell_w, cell_h) = self.cell_size(target.size);
        if cell_w == 0 || cell_h == 0 {
            debug!(%layout, country = %target.country, "Target format has no pixels at this density");
            return Ok(None);
        }

        let request = RenderRequest {
            source: source.pixels(),
            mask: snapshot.mask.as_ref(),
            adjustments: snapshot.adjustments,
            crop: snapshot.crop,
            size: target.size,
        };
        let image = match layout {
            Layout::Single => self.render_single(&request),
            Layout::Sheet => self.render_sheet(&request),
        };
        info!(
            %layout,
            country = %target.country,
            width = image.width(),
            height = image.height(),
            masked = request.mask.is_some(),
            "Rendered export"
        );
        Ok(Some(image))
    }
}
