//! Static catalog of supported passport and visa photo formats.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, IntoEnumIterator, VariantNames};

use crate::error::{PassportError, Result};

const MM_PER_INCH: f64 = 25.4;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Country {
    #[default]
    Taiwan,
    #[serde(rename = "USA")]
    #[strum(serialize = "USA")]
    Usa,
    #[serde(rename = "United Kingdom")]
    #[strum(serialize = "United Kingdom")]
    UnitedKingdom,
    China,
    Japan,
    Australia,
    #[serde(rename = "Schengen Area")]
    #[strum(serialize = "Schengen Area")]
    SchengenArea,
    India,
}

/// Physical print size of one photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PhotoSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PhotoSize {
    pub const fn new(width_mm: f64, height_mm: f64) -> Self {
        Self { width_mm, height_mm }
    }

    /// Pixel dimensions at the given print density, `round(mm / 25.4 * dpi)`.
    pub fn pixels(&self, dpi: u32) -> (u32, u32) {
        (mm_to_px(self.width_mm, dpi), mm_to_px(self.height_mm, dpi))
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width_mm / self.height_mm
    }
}

pub fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    (mm / MM_PER_INCH * dpi as f64).round().max(0.0) as u32
}

/// A selectable target format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct PassportConfig {
    pub country: Country,
    pub flag: &'static str,
    pub size: PhotoSize,
    pub description: &'static str,
}

pub const PASSPORT_CONFIGS: [PassportConfig; 8] = [
    PassportConfig { country: Country::Taiwan, flag: "🇹🇼", size: PhotoSize::new(35.0, 45.0), description: "Passport 35x45 mm" },
    PassportConfig { country: Country::Usa, flag: "🇺🇸", size: PhotoSize::new(51.0, 51.0), description: "Passport 2x2 inch" },
    PassportConfig { country: Country::UnitedKingdom, flag: "🇬🇧", size: PhotoSize::new(35.0, 45.0), description: "Passport 35x45 mm" },
    PassportConfig { country: Country::China, flag: "🇨🇳", size: PhotoSize::new(33.0, 48.0), description: "Passport 33x48 mm" },
    PassportConfig { country: Country::Japan, flag: "🇯🇵", size: PhotoSize::new(35.0, 45.0), description: "Passport 35x45 mm" },
    PassportConfig { country: Country::Australia, flag: "🇦🇺", size: PhotoSize::new(35.0, 45.0), description: "Passport 35x45 mm" },
    PassportConfig { country: Country::SchengenArea, flag: "🇪🇺", size: PhotoSize::new(35.0, 45.0), description: "Visa/Passport 35x45 mm" },
    PassportConfig { country: Country::India, flag: "🇮🇳", size: PhotoSize::new(51.0, 51.0), description: "Passport 2x2 inch" },
];

impl Country {
    pub fn config(self) -> &'static PassportConfig {
        PASSPORT_CONFIGS
            .iter()
            .find(|config| config.country == self)
            .unwrap_or(&PASSPORT_CONFIGS[0])
    }

    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }
}

impl PassportConfig {
    /// Look up a format by country name (case-insensitive).
    pub fn find(name: &str) -> Result<&'static PassportConfig> {
        let country: Country = name
            .trim()
            .parse()
            .map_err(|_| PassportError::UnknownFormat(name.to_string()))?;
        Ok(country.config())
    }

    pub fn all() -> impl Iterator<Item = &'static PassportConfig> {
        Country::iter().map(Country::config)
    }
}

impl Default for PassportConfig {
    fn default() -> Self {
        PASSPORT_CONFIGS[0]
    }
}
