use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::{debug, info, warn};

use crate::{
    algorithms::SegmentationMask,
    catalog::Country,
    compositor::Compositor,
    error::{PassportError, Result},
    export::{self, ExportArtifact, ExportMode},
    settings::Settings,
    state::{InteractionState, Snapshot, SourceImage},
    types::{BackgroundColor, EncodedImage, Offset},
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EditorCommand {
    /// Import a photo from a `data:` URI
    ImportImage { data_uri: String },

    /// Remove the photo and its mask
    ClearImage,

    /// Brightness offset in percent
    SetExposure { value: i32 },

    /// Contrast offset in percent
    SetContrast { value: i32 },

    /// Background swatch, `#rrggbb` color or `transparent`
    SetBackground { color: BackgroundColor },

    /// Select the target passport format
    SelectFormat { country: Country },

    /// Crop zoom factor
    SetZoom {
        #[schemars(range(min = 1.0, max = 3.0))]
        zoom: f32,
    },

    /// Pan offset in preview pixels
    SetOffset { x: f32, y: f32 },

    /// Discard the current mask
    ClearMask,

    NextStep,

    PrevStep,
}

impl EditorCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EditorCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Get a description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Self::ImportImage { .. } => "Import a photo from a base64 data URI, replacing the current one",
            Self::ClearImage => "Remove the photo together with its segmentation mask",
            Self::SetExposure { .. } => "Set the brightness offset (-40 to 40 percent)",
            Self::SetContrast { .. } => "Set the contrast offset (-40 to 40 percent)",
            Self::SetBackground { .. } => "Choose a background swatch, a custom hex color, or transparent",
            Self::SelectFormat { .. } => "Select the target passport format; resets the pan offset",
            Self::SetZoom { .. } => "Set the crop zoom (1.0 to 3.0)",
            Self::SetOffset { .. } => "Set the pan offset in preview pixels",
            Self::ClearMask => "Discard the segmentation mask",
            Self::NextStep => "Advance to the next step of the flow",
            Self::PrevStep => "Go back to the previous step",
        }
    }
}

/// Proof that a segmentation call was started for a specific photo.
#[derive(Debug)]
pub struct SegmentationTicket {
    generation: u64,
    image: EncodedImage,
}

impl SegmentationTicket {
    pub fn image(&self) -> &EncodedImage {
        &self.image
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationOutcome {
    /// The mask was stored.
    Applied,
    /// The photo changed while the call was running; the result was dropped.
    Stale,
}

/// A download that has been cleared to render.
#[derive(Debug, Clone)]
pub struct ExportTicket {
    mode: ExportMode,
    snapshot: Snapshot,
    compositor: Compositor,
}

impl ExportTicket {
    pub fn mode(&self) -> ExportMode {
        self.mode
    }

    /// Pure with respect to the editor; may run on any thread.
    pub fn render(&self) -> Result<Option<ExportArtifact>> {
        export::export(&self.compositor, &self.snapshot, self.mode)
    }
}

#[derive(Debug)]
pub enum ExportStart {
    PurchaseRequired,
    PrintRequested,
    Render(ExportTicket),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Entitlement missing; the host should show the purchase prompt.
    PurchaseRequired,
    /// The host should open its native print dialog.
    PrintRequested,
    /// Nothing to render (no target format).
    Declined,
    Ready(ExportArtifact),
}

/// Top-level controller owning the interaction state and the flags that
/// guard the asynchronous actions.
#[derive(Debug, Default)]
pub struct Editor {
    state: InteractionState,
    compositor: Compositor,
    entitled: bool,
    segmenting: bool,
    generating: HashSet<ExportMode>,
}

impl Editor {
    pub fn new(settings: Settings) -> Self {
        Self {
            compositor: Compositor::new(settings),
            ..Self::default()
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn is_entitled(&self) -> bool {
        self.entitled
    }

    pub fn is_segmenting(&self) -> bool {
        self.segmenting
    }

    pub fn is_generating(&self, mode: ExportMode) -> bool {
        self.generating.contains(&mode)
    }

    /// Decode and install a photo. On failure the state is left unchanged.
    pub fn import_image(&mut self, encoded: EncodedImage) -> Result<()> {
        let source = SourceImage::decode(encoded).inspect_err(|err| {
            warn!(error = %err, "Rejected photo that could not be decoded");
        })?;
        self.state.set_source(source);
        Ok(())
    }

    /// Install a mask directly (e.g. one loaded from disk).
    pub fn set_mask(&mut self, mask: SegmentationMask) -> Result<()> {
        if self.state.source().is_none() {
            return Err(PassportError::NoSourceImage);
        }
        self.state.set_mask(Some(mask));
        Ok(())
    }

    pub fn execute(&mut self, command: EditorCommand) -> Result<()> {
        debug!(%command, "Executing editor command");
        match command {
            EditorCommand::ImportImage { data_uri } => {
                self.import_image(EncodedImage::from_data_uri(&data_uri)?)?;
            }
            EditorCommand::ClearImage => self.state.clear_source(),
            EditorCommand::SetExposure { value } => self.state.set_exposure(value),
            EditorCommand::SetContrast { value } => self.state.set_contrast(value),
            EditorCommand::SetBackground { color } => self.state.set_background(color),
            EditorCommand::SelectFormat { country } => {
                self.state.set_target_format(Some(*country.config()));
            }
            EditorCommand::SetZoom { zoom } => self.state.set_zoom(zoom),
            EditorCommand::SetOffset { x, y } => self.state.set_offset(Offset { x, y }),
            EditorCommand::ClearMask => self.state.set_mask(None),
            EditorCommand::NextStep => {
                if !self.state.next_step() {
                    debug!(step = %self.state.step(), "Cannot advance");
                }
            }
            EditorCommand::PrevStep => {
                self.state.prev_step();
            }
        }
        Ok(())
    }

    /// Deselect the format; renders decline until one is chosen again.
    pub fn clear_target_format(&mut self) {
        self.state.set_target_format(None);
    }

    /// Simulated purchase: the only way to unlock exports.
    pub fn grant_entitlement(&mut self) {
        info!("Export entitlement granted");
        self.entitled = true;
    }

    /// Start a segmentation call for the current photo. Rejected, not
    /// queued, while another call is running.
    pub fn begin_segmentation(&mut self) -> Result<SegmentationTicket> {
        if self.segmenting {
            return Err(PassportError::SegmentationInProgress);
        }
        let source = self.state.source().ok_or(PassportError::NoSourceImage)?;
        let ticket = SegmentationTicket {
            generation: self.state.generation(),
            image: source.encoded().clone(),
        };
        self.segmenting = true;
        debug!(generation = ticket.generation, "Segmentation started");
        Ok(ticket)
    }

    /// Finish a segmentation call. The mask is stored only if the photo is
    /// still the one the call started with; a failure leaves the current
    /// mask untouched.
    pub fn complete_segmentation(
        &mut self,
        ticket: SegmentationTicket,
        result: Result<SegmentationMask>,
    ) -> Result<SegmentationOutcome> {
        self.segmenting = false;
        if ticket.generation != self.state.generation() {
            info!(
                started = ticket.generation,
                current = self.state.generation(),
                "Discarding segmentation result for a replaced photo"
            );
            return Ok(SegmentationOutcome::Stale);
        }
        match result {
            Ok(mask) => {
                info!(matte = mask.is_matte(), "Segmentation mask applied");
                self.state.set_mask(Some(mask));
                Ok(SegmentationOutcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, "Segmentation failed, keeping previous mask");
                Err(err)
            }
        }
    }

    /// Check the purchase gate and claim the action's "generating" flag.
    pub fn begin_export(&mut self, mode: ExportMode) -> Result<ExportStart> {
        if !self.entitled {
            info!(%mode, "Export blocked until purchase");
            return Ok(ExportStart::PurchaseRequired);
        }
        if mode == ExportMode::Print {
            return Ok(ExportStart::PrintRequested);
        }
        if !self.generating.insert(mode) {
            return Err(PassportError::ExportInProgress(mode));
        }
        Ok(ExportStart::Render(ExportTicket {
            mode,
            snapshot: self.state.snapshot(),
            compositor: self.compositor.clone(),
        }))
    }

    pub fn finish_export(&mut self, mode: ExportMode) {
        self.generating.remove(&mode);
    }

    /// Run an export on the calling thread.
    pub fn export(&mut self, mode: ExportMode) -> Result<ExportOutcome> {
        let ticket = match self.begin_export(mode)? {
            ExportStart::PurchaseRequired => return Ok(ExportOutcome::PurchaseRequired),
            ExportStart::PrintRequested => return Ok(ExportOutcome::PrintRequested),
            ExportStart::Render(ticket) => ticket,
        };
        let result = ticket.render();
        self.finish_export(mode);
        Ok(result?.map_or(ExportOutcome::Declined, ExportOutcome::Ready))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Country, types::Step};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::{io::Cursor, sync::Arc};

    fn png(width: u32, height: u32) -> EncodedImage {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([120, 80, 40, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        EncodedImage::new("image/png", bytes)
    }

    fn matte() -> SegmentationMask {
        SegmentationMask::Matte(Arc::new(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]))))
    }

    fn editor_with_photo() -> Editor {
        let mut editor = Editor::default();
        editor.import_image(png(30, 40)).unwrap();
        editor
    }

    #[test]
    fn test_command_serialization() {
        let command = EditorCommand::SetBackground { color: BackgroundColor::BLUE };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r##"{"type":"set_background","params":{"color":"#b9d1ff"}}"##);
        let parsed: EditorCommand = serde_json::from_str(r#"{"type":"select_format","params":{"country":"United Kingdom"}}"#).unwrap();
        assert_eq!(parsed, EditorCommand::SelectFormat { country: Country::UnitedKingdom });
        assert!(EditorCommand::command_names().contains(&"set_zoom"));
    }

    #[test]
    fn test_commands_drive_state() {
        let mut editor = editor_with_photo();
        editor.execute(EditorCommand::SetExposure { value: 12 }).unwrap();
        editor.execute(EditorCommand::SetZoom { zoom: 1.5 }).unwrap();
        editor.execute(EditorCommand::SetOffset { x: 4.0, y: 2.0 }).unwrap();
        editor.execute(EditorCommand::SelectFormat { country: Country::China }).unwrap();
        editor.execute(EditorCommand::NextStep).unwrap();

        let state = editor.state();
        assert_eq!(state.adjustments().exposure, 12);
        assert_eq!(state.crop().zoom, 1.5);
        assert_eq!(state.crop().offset, Offset::ZERO);
        assert_eq!(state.target().unwrap().country, Country::China);
        assert_eq!(state.step(), Step::Adjust);
    }

    #[test]
    fn test_bad_import_keeps_previous_photo() {
        let mut editor = editor_with_photo();
        let garbage = EncodedImage::new("image/png", vec![0, 1, 2]);
        assert!(matches!(editor.import_image(garbage), Err(PassportError::ImageDecode(_))));
        assert_eq!(editor.state().source().unwrap().dimensions(), (30, 40));
    }

    #[test]
    fn test_segmentation_is_not_reentrant() {
        let mut editor = editor_with_photo();
        let ticket = editor.begin_segmentation().unwrap();
        assert!(matches!(editor.begin_segmentation(), Err(PassportError::SegmentationInProgress)));
        let outcome = editor.complete_segmentation(ticket, Ok(matte())).unwrap();
        assert_eq!(outcome, SegmentationOutcome::Applied);
        assert!(editor.state().mask().is_some());
        assert!(!editor.is_segmenting());
    }

    #[test]
    fn test_stale_segmentation_is_discarded() {
        let mut editor = editor_with_photo();
        let ticket = editor.begin_segmentation().unwrap();
        editor.execute(EditorCommand::ClearImage).unwrap();
        let outcome = editor.complete_segmentation(ticket, Ok(matte())).unwrap();
        assert_eq!(outcome, SegmentationOutcome::Stale);
        assert!(editor.state().mask().is_none());

        // a re-import during the call is also a different photo
        editor.import_image(png(30, 40)).unwrap();
        let ticket = editor.begin_segmentation().unwrap();
        editor.import_image(png(30, 40)).unwrap();
        assert_eq!(
            editor.complete_segmentation(ticket, Ok(matte())).unwrap(),
            SegmentationOutcome::Stale
        );
    }

    #[test]
    fn test_failed_segmentation_keeps_old_mask() {
        let mut editor = editor_with_photo();
        editor.set_mask(matte()).unwrap();
        let ticket = editor.begin_segmentation().unwrap();
        let result = editor.complete_segmentation(ticket, Err(PassportError::Provider("boom".into())));
        assert!(result.is_err());
        assert_eq!(editor.state().mask(), Some(&matte()));
        assert!(!editor.is_segmenting());
    }

    #[test]
    fn test_segmentation_needs_a_photo() {
        let mut editor = Editor::default();
        assert!(matches!(editor.begin_segmentation(), Err(PassportError::NoSourceImage)));
        assert!(!editor.is_segmenting());
    }

    #[test]
    fn test_exports_are_gated_by_entitlement() {
        let mut editor = editor_with_photo();
        assert_eq!(editor.export(ExportMode::Single).unwrap(), ExportOutcome::PurchaseRequired);
        assert_eq!(editor.export(ExportMode::Print).unwrap(), ExportOutcome::PurchaseRequired);

        editor.grant_entitlement();
        assert_eq!(editor.export(ExportMode::Print).unwrap(), ExportOutcome::PrintRequested);
        let ExportOutcome::Ready(artifact) = editor.export(ExportMode::Sheet).unwrap() else {
            panic!("expected a sheet");
        };
        assert_eq!((artifact.width, artifact.height), (1800, 1200));
        assert_eq!(artifact.file_name, "Passport_Sheet_Taiwan.jpg");
        assert!(!editor.is_generating(ExportMode::Sheet));
    }

    #[test]
    fn test_duplicate_export_is_rejected() {
        let mut editor = editor_with_photo();
        editor.grant_entitlement();
        let ExportStart::Render(ticket) = editor.begin_export(ExportMode::Single).unwrap() else {
            panic!("expected a render ticket");
        };
        assert!(matches!(
            editor.begin_export(ExportMode::Single),
            Err(PassportError::ExportInProgress(ExportMode::Single))
        ));
        // a different action is not blocked by the editor
        assert!(matches!(editor.begin_export(ExportMode::Sheet), Ok(ExportStart::Render(_))));
        editor.finish_export(ExportMode::Sheet);

        let artifact = ticket.render().unwrap().unwrap();
        editor.finish_export(ticket.mode());
        assert_eq!((artifact.width, artifact.height), (413, 531));
        assert!(!editor.is_generating(ExportMode::Single));
    }
}
