use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;

use crate::{
    algorithms::SegmentationMask,
    catalog::PassportConfig,
    error::Result,
    types::{ADJUSTMENT_RANGE, Adjustments, BackgroundColor, CropTransform, EncodedImage, Offset, Step, ZOOM_RANGE},
};

/// The imported photo: decoded pixels plus the encoded original, which is
/// what gets sent to the segmentation service.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    encoded: EncodedImage,
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn decode(encoded: EncodedImage) -> Result<Self> {
        let pixels = encoded.decode()?.to_rgba8();
        Ok(Self {
            encoded,
            pixels: Arc::new(pixels),
        })
    }

    pub fn encoded(&self) -> &EncodedImage {
        &self.encoded
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Owned, cheap-to-clone view of everything the compositor reads.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: Option<SourceImage>,
    pub mask: Option<SegmentationMask>,
    pub adjustments: Adjustments,
    pub crop: CropTransform,
    pub target: Option<PassportConfig>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            source: None,
            mask: None,
            adjustments: Adjustments::default(),
            crop: CropTransform::default(),
            target: Some(PassportConfig::default()),
        }
    }
}

/// Session state of the editor. Every mutation goes through a setter.
#[derive(Debug, Clone)]
pub struct InteractionState {
    step: Step,
    source: Option<SourceImage>,
    mask: Option<SegmentationMask>,
    adjustments: Adjustments,
    target: Option<PassportConfig>,
    crop: CropTransform,
    /// Bumped whenever the source image changes; async results captured
    /// against an older generation are stale.
    generation: u64,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            step: Step::Import,
            source: None,
            mask: None,
            adjustments: Adjustments::default(),
            target: Some(PassportConfig::default()),
            crop: CropTransform::default(),
            generation: 0,
        }
    }
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn mask(&self) -> Option<&SegmentationMask> {
        self.mask.as_ref()
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    pub fn target(&self) -> Option<&PassportConfig> {
        self.target.as_ref()
    }

    pub fn crop(&self) -> &CropTransform {
        &self.crop
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the photo. Any mask belonged to the previous photo and is
    /// dropped.
    pub fn set_source(&mut self, source: SourceImage) {
        let (width, height) = source.dimensions();
        debug!(width, height, "Source image set");
        self.source = Some(source);
        self.mask = None;
        self.generation += 1;
    }

    /// Remove the photo and its mask in one update.
    pub fn clear_source(&mut self) {
        debug!("Source image cleared");
        self.source = None;
        self.mask = None;
        self.generation += 1;
    }

    pub fn set_mask(&mut self, mask: Option<SegmentationMask>) {
        self.mask = mask;
    }

    pub fn set_exposure(&mut self, exposure: i32) {
        self.adjustments.exposure = exposure.clamp(*ADJUSTMENT_RANGE.start(), *ADJUSTMENT_RANGE.end());
    }

    pub fn set_contrast(&mut self, contrast: i32) {
        self.adjustments.contrast = contrast.clamp(*ADJUSTMENT_RANGE.start(), *ADJUSTMENT_RANGE.end());
    }

    pub fn set_background(&mut self, background: BackgroundColor) {
        self.adjustments.background = background;
    }

    /// Select a format. The pan offset is reset because the framing does not
    /// survive an aspect-ratio change; zoom is kept.
    pub fn set_target_format(&mut self, target: Option<PassportConfig>) {
        self.target = target;
        self.crop.offset = Offset::ZERO;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = if zoom.is_finite() { zoom } else { *ZOOM_RANGE.start() };
        self.crop.zoom = zoom.clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end());
    }

    pub fn set_offset(&mut self, offset: Offset) {
        if offset.x.is_finite() && offset.y.is_finite() {
            self.crop.offset = offset;
        }
    }

    /// Leaving Import requires a photo.
    pub fn can_go_next(&self) -> bool {
        !(self.step == Step::Import && self.source.is_none()) && self.step.next().is_some()
    }

    pub fn next_step(&mut self) -> bool {
        match self.step.next() {
            Some(next) if self.can_go_next() => {
                self.step = next;
                true
            }
            _ => false,
        }
    }

    pub fn prev_step(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            source: self.source.clone(),
            mask: self.mask.clone(),
            adjustments: self.adjustments,
            crop: self.crop,
            target: self.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Country;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn source(width: u32, height: u32) -> SourceImage {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([50, 60, 70, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        SourceImage::decode(EncodedImage::new("image/png", bytes)).unwrap()
    }

    fn matte() -> SegmentationMask {
        SegmentationMask::Matte(Arc::new(RgbaImage::new(2, 2)))
    }

    #[test]
    fn test_format_change_resets_offset_keeps_zoom() {
        let mut state = InteractionState::new();
        state.set_zoom(2.5);
        state.set_offset(Offset { x: 12.0, y: -4.0 });
        state.set_target_format(Some(*Country::Usa.config()));
        assert_eq!(state.crop().offset, Offset::ZERO);
        assert_eq!(state.crop().zoom, 2.5);
        assert_eq!(state.target().unwrap().country, Country::Usa);
    }

    #[test]
    fn test_clearing_source_clears_mask() {
        let mut state = InteractionState::new();
        state.set_source(source(4, 4));
        state.set_mask(Some(matte()));
        let before = state.generation();
        state.clear_source();
        assert!(state.source().is_none());
        assert!(state.mask().is_none());
        assert!(state.generation() > before);
    }

    #[test]
    fn test_new_source_drops_old_mask() {
        let mut state = InteractionState::new();
        state.set_source(source(4, 4));
        state.set_mask(Some(matte()));
        state.set_source(source(8, 8));
        assert!(state.mask().is_none());
        assert_eq!(state.source().unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn test_values_are_clamped() {
        let mut state = InteractionState::new();
        state.set_exposure(90);
        state.set_contrast(-90);
        state.set_zoom(0.2);
        assert_eq!(state.adjustments().exposure, 40);
        assert_eq!(state.adjustments().contrast, -40);
        assert_eq!(state.crop().zoom, 1.0);
        state.set_zoom(f32::NAN);
        assert_eq!(state.crop().zoom, 1.0);
        state.set_zoom(7.0);
        assert_eq!(state.crop().zoom, 3.0);
    }

    #[test]
    fn test_import_step_requires_source() {
        let mut state = InteractionState::new();
        assert!(!state.next_step());
        assert_eq!(state.step(), Step::Import);

        state.set_source(source(4, 4));
        assert!(state.next_step());
        assert!(state.next_step());
        assert!(state.next_step());
        assert_eq!(state.step(), Step::Finish);
        assert!(!state.next_step());

        assert!(state.prev_step());
        assert_eq!(state.step(), Step::Crop);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut state = InteractionState::new();
        state.set_source(source(4, 4));
        let snapshot = state.snapshot();
        state.clear_source();
        assert!(snapshot.source.is_some());
    }
}
