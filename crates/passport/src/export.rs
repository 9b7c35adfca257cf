use image::{RgbImage, RgbaImage, buffer::ConvertBuffer, codecs::jpeg::JpegEncoder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{
    catalog::Country,
    compositor::{Compositor, Layout},
    error::Result,
    state::Snapshot,
};

/// User-facing export actions on the Finish step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExportMode {
    Single,
    Sheet,
    Print,
}

impl ExportMode {
    /// Raster layout for download modes; printing uses the host's dialog.
    pub fn layout(self) -> Option<Layout> {
        match self {
            Self::Single => Some(Layout::Single),
            Self::Sheet => Some(Layout::Sheet),
            Self::Print => None,
        }
    }
}

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub mode: ExportMode,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// JPEG bytes.
    pub bytes: Vec<u8>,
}

/// `Passport_Single_<Country>.jpg` / `Passport_Sheet_<Country>.jpg`.
pub fn file_name(layout: Layout, country: Country) -> String {
    let kind = match layout {
        Layout::Single => "Single",
        Layout::Sheet => "Sheet",
    };
    format!("Passport_{kind}_{country}.jpg")
}

/// Encode an opaque canvas as baseline JPEG.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb: RgbImage = image.convert();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(bytes)
}

/// Render and encode one download. `Ok(None)` when the compositor declines
/// or the mode is not a download.
pub fn export(compositor: &Compositor, snapshot: &Snapshot, mode: ExportMode) -> Result<Option<ExportArtifact>> {
    let (Some(layout), Some(target)) = (mode.layout(), snapshot.target) else {
        return Ok(None);
    };
    let Some(image) = compositor.render(snapshot, layout)? else {
        return Ok(None);
    };
    let bytes = encode_jpeg(&image, compositor.settings().jpeg_quality)?;
    Ok(Some(ExportArtifact {
        mode,
        file_name: file_name(layout, target.country),
        width: image.width(),
        height: image.height(),
        bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_file_names_follow_mode_and_country() {
        assert_eq!(file_name(Layout::Single, Country::Taiwan), "Passport_Single_Taiwan.jpg");
        assert_eq!(
            file_name(Layout::Sheet, Country::UnitedKingdom),
            "Passport_Sheet_United Kingdom.jpg"
        );
    }

    #[test]
    fn test_jpeg_encoding_is_deterministic() {
        let image = RgbaImage::from_fn(64, 48, |x, y| Rgba([x as u8 * 3, y as u8 * 5, 90, 255]));
        let first = encode_jpeg(&image, 95).unwrap();
        let second = encode_jpeg(&image, 95).unwrap();
        assert_eq!(first, second);
        assert_eq!(image::guess_format(&first).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn test_print_is_not_a_download() {
        assert_eq!(ExportMode::Print.layout(), None);
        let result = export(&Compositor::default(), &Snapshot::default(), ExportMode::Print).unwrap();
        assert!(result.is_none());
    }
}
