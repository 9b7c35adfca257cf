//! Shared, async-facing handle around [`Editor`].
//!
//! The lock is never held across the network call or the render, so the
//! editor stays responsive while either is in flight.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::{
    algorithms::normalize_encoded,
    editor::{Editor, EditorCommand, ExportOutcome, ExportStart, SegmentationOutcome},
    error::{PassportError, Result},
    export::ExportMode,
    settings::Settings,
    traits::SegmentationProvider,
};

#[derive(Debug, Clone, Default)]
pub struct Session {
    editor: Arc<Mutex<Editor>>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self::from_editor(Editor::new(settings))
    }

    pub fn from_editor(editor: Editor) -> Self {
        Self {
            editor: Arc::new(Mutex::new(editor)),
        }
    }

    /// Run `f` against the locked editor.
    pub async fn with_editor<T>(&self, f: impl FnOnce(&mut Editor) -> T) -> T {
        let mut editor = self.editor.lock().await;
        f(&mut editor)
    }

    pub async fn execute(&self, command: EditorCommand) -> Result<()> {
        self.editor.lock().await.execute(command)
    }

    /// Ask `provider` for a mask of the current photo and store the
    /// normalized result, unless the photo changed in the meantime.
    pub async fn segment<P: SegmentationProvider>(&self, provider: &P) -> Result<SegmentationOutcome> {
        let ticket = self.editor.lock().await.begin_segmentation()?;

        let result = provider
            .segment(ticket.image())
            .await
            .map(normalize_encoded)
            .inspect_err(|err| error!(error = %err, "Segmentation provider failed"));

        self.editor.lock().await.complete_segmentation(ticket, result)
    }

    /// Render a download on the blocking pool.
    pub async fn export(&self, mode: ExportMode) -> Result<ExportOutcome> {
        let ticket = match self.editor.lock().await.begin_export(mode)? {
            ExportStart::PurchaseRequired => return Ok(ExportOutcome::PurchaseRequired),
            ExportStart::PrintRequested => return Ok(ExportOutcome::PrintRequested),
            ExportStart::Render(ticket) => ticket,
        };

        debug!(%mode, "Rendering export off the async runtime");
        let joined = tokio::task::spawn_blocking(move || ticket.render()).await;
        self.editor.lock().await.finish_export(mode);

        let artifact = joined.map_err(|err| PassportError::RenderTask(err.to_string()))??;
        Ok(artifact.map_or(ExportOutcome::Declined, ExportOutcome::Ready))
    }
}
