use thiserror::Error;

use crate::export::ExportMode;

#[derive(Error, Debug)]
pub enum PassportError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("No source image loaded")]
    NoSourceImage,

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Unknown passport format: {0}")]
    UnknownFormat(String),

    #[error("Segmentation provider failed: {0}")]
    Provider(String),

    #[error("A segmentation request is already in progress")]
    SegmentationInProgress,

    #[error("Export '{0}' is already being generated")]
    ExportInProgress(ExportMode),

    #[error("Render task failed: {0}")]
    RenderTask(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PassportError>;
