//! # Passport Photo Compositor
//!
//! Turns an ordinary portrait into print-ready passport and visa photos.
//! A photo moves through a four-step flow (import, adjust, crop, finish);
//! the compositor then renders either a single photo at the format's exact
//! 300 DPI resolution or a 6x4 inch sheet of copies.
//!
//! ## Core Features
//!
//! - **Format Catalog**: Eight country presets with physical sizes in millimetres
//! - **Background Replacement**: Mask-based compositing when a person mask is
//!   available, multiply blending against the chosen color otherwise
//! - **Crop Transform**: Cover-fit placement with zoom and pan
//! - **Async Segmentation**: Pluggable [`SegmentationProvider`] with stale-result protection
//! - **Gated Exports**: JPEG downloads unlocked by a purchase entitlement
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use passport::{Editor, EditorCommand, Country, ExportMode, ExportOutcome};
//!
//! let mut editor = Editor::default();
//! editor.import_image(passport::EncodedImage::from_bytes(std::fs::read("portrait.jpg")?))?;
//! editor.execute(EditorCommand::SelectFormat { country: Country::Usa })?;
//! editor.grant_entitlement();
//! if let ExportOutcome::Ready(artifact) = editor.export(ExportMode::Sheet)? {
//!     std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod catalog;
pub mod settings;
pub mod traits;
pub mod algorithms;
pub mod compositor;
pub mod sheet;
pub mod export;
pub mod state;
pub mod editor;
pub mod session;

// Re-exports for convenience
pub use error::{PassportError, Result};
pub use types::{Adjustments, BackgroundColor, CropTransform, EncodedImage, Offset, Rgb, Step};
pub use catalog::{Country, PASSPORT_CONFIGS, PassportConfig, PhotoSize};
pub use settings::Settings;
pub use traits::*;
pub use algorithms::{SegmentationMask, ToneCurve};
pub use compositor::{Compositor, Layout, RenderRequest};
pub use sheet::SheetLayout;
pub use export::{ExportArtifact, ExportMode};
pub use state::{InteractionState, Snapshot, SourceImage};
pub use editor::{Editor, EditorCommand, ExportOutcome, SegmentationOutcome};
pub use session::Session;
