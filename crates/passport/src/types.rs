use std::{fmt, ops::RangeInclusive, str::FromStr};

use base64::{Engine, engine::general_purpose::STANDARD};
use image::DynamicImage;
use schemars::{JsonSchema, r#gen::SchemaGenerator, schema::Schema};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{PassportError, Result};

/// Valid range for exposure and contrast offsets (percentage points).
pub const ADJUSTMENT_RANGE: RangeInclusive<i32> = -40..=40;

/// Valid range for the crop zoom factor.
pub const ZOOM_RANGE: RangeInclusive<f32> = 1.0..=3.0;

/// A self-describing encoded raster (PNG/JPEG bytes plus mime type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Wrap raw file bytes, sniffing the mime type from the magic number.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        Self::new(mime_type, bytes)
    }

    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self> {
        Ok(Self::new(mime_type, STANDARD.decode(data.trim())?))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PassportError::InvalidDataUri("missing 'data:' scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| PassportError::InvalidDataUri("missing ',' separator".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| PassportError::InvalidDataUri("only base64 payloads are supported".into()))?;
        if mime_type.is_empty() {
            return Err(PassportError::InvalidDataUri("empty mime type".into()));
        }
        Self::from_base64(mime_type, payload)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

/// An opaque 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([0xff, 0xff, 0xff]);

    pub fn to_rgba(self) -> image::Rgba<u8> {
        let [r, g, b] = self.0;
        image::Rgba([r, g, b, 255])
    }
}

impl FromStr for Rgb {
    type Err = PassportError;

    /// Accepts `#rrggbb` and `#rgb`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PassportError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Rgb([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?])),
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb([expand(0)?, expand(1)?, expand(2)?]))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Rgb {
    type Error = PassportError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Background treatment behind the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackgroundColor {
    /// Keep the photo's own background ("transparent" in the swatch list).
    Original,
    Color(Rgb),
}

impl BackgroundColor {
    pub const WHITE: BackgroundColor = BackgroundColor::Color(Rgb::WHITE);
    pub const BLUE: BackgroundColor = BackgroundColor::Color(Rgb([0xb9, 0xd1, 0xff]));

    /// The preset swatches offered next to the custom color picker.
    pub fn swatches() -> [(&'static str, BackgroundColor); 3] {
        [
            ("WHITE", Self::WHITE),
            ("BLUE", Self::BLUE),
            ("ORIGINAL", Self::Original),
        ]
    }

    pub fn is_original(&self) -> bool {
        matches!(self, Self::Original)
    }

    /// True for a color that is none of the preset swatches.
    pub fn is_custom(&self) -> bool {
        !Self::swatches().iter().any(|(_, swatch)| swatch == self)
    }

    /// Fill used for the cell. The original background is kept by covering a
    /// white base with the photo, so the sentinel fills white.
    pub fn fill(&self) -> Rgb {
        match self {
            Self::Original => Rgb::WHITE,
            Self::Color(rgb) => *rgb,
        }
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::Original
    }
}

impl FromStr for BackgroundColor {
    type Err = PassportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transparent" | "original" => Ok(Self::Original),
            "white" => Ok(Self::WHITE),
            "blue" => Ok(Self::BLUE),
            other => other.parse().map(Self::Color),
        }
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("transparent"),
            Self::Color(rgb) => rgb.fmt(f),
        }
    }
}

impl TryFrom<String> for BackgroundColor {
    type Error = PassportError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BackgroundColor> for String {
    fn from(value: BackgroundColor) -> Self {
        value.to_string()
    }
}

impl JsonSchema for Rgb {
    fn schema_name() -> String {
        "Rgb".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        String::json_schema(generator)
    }
}

impl JsonSchema for BackgroundColor {
    fn schema_name() -> String {
        "BackgroundColor".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        String::json_schema(generator)
    }
}

/// Lighting and background adjustments chosen in the Adjust step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Adjustments {
    pub exposure: i32,
    pub contrast: i32,
    pub background: BackgroundColor,
}

/// Pan offset in preview-pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CropTransform {
    #[schemars(range(min = 1.0, max = 3.0))]
    pub zoom: f32,
    pub offset: Offset,
}

impl Default for CropTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Offset::ZERO,
        }
    }
}

/// The four steps of the guided flow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum Step {
    #[default]
    Import,
    Adjust,
    Crop,
    Finish,
}

impl Step {
    pub fn next(self) -> Option<Step> {
        match self {
            Self::Import => Some(Self::Adjust),
            Self::Adjust => Some(Self::Crop),
            Self::Crop => Some(Self::Finish),
            Self::Finish => None,
        }
    }

    pub fn prev(self) -> Option<Step> {
        match self {
            Self::Import => None,
            Self::Adjust => Some(Self::Import),
            Self::Crop => Some(Self::Adjust),
            Self::Finish => Some(Self::Crop),
        }
    }
}
