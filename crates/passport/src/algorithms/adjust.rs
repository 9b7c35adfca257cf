use image::RgbaImage;

use crate::types::{ADJUSTMENT_RANGE, Adjustments};

/// Brightness/contrast as a per-channel lookup table.
///
/// Follows the CSS `brightness(b%) contrast(c%)` filter chain on 8-bit
/// channels: brightness scales the channel, the result is clamped, then
/// contrast scales the distance from mid-grey:
///
/// `out = clamp(round((clamp(in * b) - 127.5) * c + 127.5))`
///
/// with `b = (100 + exposure) / 100` and `c = (100 + contrast) / 100`.
/// Alpha is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneCurve {
    lut: [u8; 256],
}

impl ToneCurve {
    pub fn new(exposure: i32, contrast: i32) -> Self {
        let clamp = |v: i32| v.clamp(*ADJUSTMENT_RANGE.start(), *ADJUSTMENT_RANGE.end());
        let brightness = (100 + clamp(exposure)) as f32 / 100.0;
        let contrast = (100 + clamp(contrast)) as f32 / 100.0;

        let mut lut = [0u8; 256];
        for (v, entry) in lut.iter_mut().enumerate() {
            let lit = (v as f32 * brightness).clamp(0.0, 255.0);
            let out = (lit - 127.5) * contrast + 127.5;
            *entry = out.round().clamp(0.0, 255.0) as u8;
        }
        Self { lut }
    }

    pub fn from_adjustments(adjustments: &Adjustments) -> Self {
        Self::new(adjustments.exposure, adjustments.contrast)
    }

    pub fn is_identity(&self) -> bool {
        self.lut.iter().enumerate().all(|(v, &out)| v as u8 == out)
    }

    pub fn map(&self, value: u8) -> u8 {
        self.lut[value as usize]
    }

    pub fn apply(&self, image: &mut RgbaImage) {
        if self.is_identity() {
            return;
        }
        for pixel in image.pixels_mut() {
            for channel in &mut pixel.0[..3] {
                *channel = self.lut[*channel as usize];
            }
        }
    }
}
