use passport::{
    Adjustments, Country, CropTransform, EditorCommand, Settings,
    export::ExportMode,
};
use schemars::JsonSchema;
use segmentation::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Job lists no export modes")]
    NoModes,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

fn default_modes() -> Vec<ExportMode> {
    vec![ExportMode::Single, ExportMode::Sheet]
}

/// A batch export: one photo, one format, one set of adjustments.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExportJob {
    /// Path of the portrait to process
    pub image: PathBuf,
    /// Pre-computed black/white person mask; takes precedence over `segment`
    #[serde(default)]
    pub mask: Option<PathBuf>,
    #[serde(default)]
    pub country: Country,
    #[serde(default)]
    pub adjustments: Adjustments,
    #[serde(default)]
    pub crop: CropTransform,
    pub output_dir: PathBuf,
    #[serde(default = "default_modes")]
    pub modes: Vec<ExportMode>,
    /// Ask the hosted model for a mask when none is given
    #[serde(default)]
    pub segment: bool,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl ExportJob {
    /// Load an ExportJob from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, JobError> {
        let job: ExportJob = toml::from_str(content)?;
        job.validate()
    }

    /// Load an ExportJob from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, JobError> {
        let job: ExportJob = serde_json::from_str(content)?;
        job.validate()
    }

    /// Auto-detect file format and load the job
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(JobError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String, JobError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    fn validate(self) -> Result<Self, JobError> {
        if self.modes.is_empty() {
            return Err(JobError::NoModes);
        }
        Ok(self)
    }

    /// Editor commands that reproduce the job's settings. The format comes
    /// first because selecting it resets the pan offset.
    pub fn commands(&self) -> Vec<EditorCommand> {
        vec![
            EditorCommand::SelectFormat { country: self.country },
            EditorCommand::SetExposure { value: self.adjustments.exposure },
            EditorCommand::SetContrast { value: self.adjustments.contrast },
            EditorCommand::SetBackground { color: self.adjustments.background },
            EditorCommand::SetZoom { zoom: self.crop.zoom },
            EditorCommand::SetOffset { x: self.crop.offset.x, y: self.crop.offset.y },
        ]
    }

    /// Where an export artifact with `file_name` is written.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
