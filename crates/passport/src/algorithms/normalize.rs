use std::{borrow::Cow, io::Cursor, sync::Arc};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::{error::Result, types::EncodedImage};

/// A segmentation mask as held by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationMask {
    /// White stencil whose alpha channel carries the subject coverage.
    Matte(Arc<RgbaImage>),
    /// Provider output that could not be decoded for normalization.
    Raw(EncodedImage),
}

impl SegmentationMask {
    pub fn is_matte(&self) -> bool {
        matches!(self, Self::Matte(_))
    }

    /// The raster whose alpha channel gates the photo. A raw mask is decoded
    /// as-is; if that fails too the mask is ignored.
    pub fn alpha_raster(&self) -> Option<Cow<'_, RgbaImage>> {
        match self {
            Self::Matte(matte) => Some(Cow::Borrowed(matte.as_ref())),
            Self::Raw(encoded) => match encoded.decode() {
                Ok(image) => Some(Cow::Owned(image.to_rgba8())),
                Err(err) => {
                    warn!(error = %err, mime_type = %encoded.mime_type, "Ignoring undecodable mask");
                    None
                }
            },
        }
    }

    /// Encode for storage or download. Mattes become PNG to keep the alpha.
    pub fn to_encoded(&self) -> Result<EncodedImage> {
        match self {
            Self::Matte(matte) => {
                let mut bytes = Vec::new();
                matte.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
                Ok(EncodedImage::new("image/png", bytes))
            }
            Self::Raw(encoded) => Ok(encoded.clone()),
        }
    }
}

/// Turn a black/white mask into an alpha matte: RGB forced to white, alpha
/// set to the pixel's mean luminance `(R + G + B) / 3`, rounded.
pub fn normalize_mask(mask: &DynamicImage) -> RgbaImage {
    let rgb = mask.to_rgb8();
    let mut matte = RgbaImage::new(rgb.width(), rgb.height());
    for (src, dst) in rgb.pixels().zip(matte.pixels_mut()) {
        let sum = src[0] as u16 + src[1] as u16 + src[2] as u16;
        *dst = Rgba([255, 255, 255, ((sum + 1) / 3) as u8]);
    }
    matte
}

/// Normalize an encoded provider mask, falling back to the raw input when it
/// cannot be decoded.
pub fn normalize_encoded(raw: EncodedImage) -> SegmentationMask {
    match raw.decode() {
        Ok(image) => {
            debug!(width = image.width(), height = image.height(), "Normalizing segmentation mask");
            SegmentationMask::Matte(Arc::new(normalize_mask(&image)))
        }
        Err(err) => {
            warn!(error = %err, "Mask could not be decoded, passing it through unnormalized");
            SegmentationMask::Raw(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_every_grey_level_maps_to_exact_alpha() {
        let mut mask = RgbImage::new(256, 1);
        for v in 0..=255u8 {
            mask.put_pixel(v as u32, 0, Rgb([v, v, v]));
        }
        let matte = normalize_mask(&DynamicImage::ImageRgb8(mask));
        for v in 0..=255u8 {
            assert_eq!(matte.get_pixel(v as u32, 0), &Rgba([255, 255, 255, v]));
        }
    }

    #[test]
    fn test_mixed_channels_round_to_nearest() {
        let mut mask = RgbImage::new(2, 1);
        mask.put_pixel(0, 0, Rgb([255, 0, 0])); // 85.0
        mask.put_pixel(1, 0, Rgb([255, 255, 0])); // 170.0
        let matte = normalize_mask(&DynamicImage::ImageRgb8(mask));
        assert_eq!(matte.get_pixel(0, 0)[3], 85);
        assert_eq!(matte.get_pixel(1, 0)[3], 170);

        let mut mask = RgbImage::new(2, 1);
        mask.put_pixel(0, 0, Rgb([1, 0, 0])); // 0.33
        mask.put_pixel(1, 0, Rgb([2, 0, 0])); // 0.67
        let matte = normalize_mask(&DynamicImage::ImageRgb8(mask));
        assert_eq!(matte.get_pixel(0, 0)[3], 0);
        assert_eq!(matte.get_pixel(1, 0)[3], 1);
    }

    #[test]
    fn test_dimensions_are_preserved() {
        let mask = DynamicImage::ImageRgb8(RgbImage::new(17, 9));
        let matte = normalize_mask(&mask);
        assert_eq!(matte.dimensions(), (17, 9));
    }

    #[test]
    fn test_undecodable_mask_passes_through() {
        let raw = EncodedImage::new("image/png", b"definitely not a png".to_vec());
        let normalized = normalize_encoded(raw.clone());
        assert_eq!(normalized, SegmentationMask::Raw(raw));
        assert!(normalized.alpha_raster().is_none());
    }

    #[test]
    fn test_encoded_mask_is_normalized() {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let normalized = normalize_encoded(EncodedImage::new("image/png", bytes));
        assert!(normalized.is_matte());
        let alpha = normalized.alpha_raster().unwrap();
        assert!(alpha.pixels().all(|p| p[3] == 255));
    }
}
