use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{sheet::SheetLayout, types::Rgb};

/// Rendering settings shared by every export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Print density used to turn millimetres into pixels.
    pub dpi: u32,
    /// Width in pixels of the interactive preview the crop offset was
    /// captured on.
    pub preview_width: f32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Outline stroked around every cell. `None` disables it.
    pub border_color: Option<Rgb>,
    pub sheet: SheetLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dpi: 300,
            preview_width: 300.0,
            jpeg_quality: 95,
            border_color: Some(Rgb([0xee, 0xee, 0xee])),
            sheet: SheetLayout::default(),
        }
    }
}
