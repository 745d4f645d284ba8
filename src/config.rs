use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::packer::Algorithm;
use crate::types::{Rect, default_true};

pub const DEFAULT_SHEET_WIDTH: f64 = 1220.0;
pub const DEFAULT_SHEET_LENGTH: f64 = 2440.0;
pub const DEFAULT_KERF: f64 = 3.0;

const SHEET_SIDE_RANGE: (f64, f64) = (100.0, 10000.0);
const KERF_RANGE: (f64, f64) = (0.0, 50.0);

/// Job settings, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackerConfig {
    #[serde(default = "default_sheet_width")]
    pub sheet_width: f64,
    #[serde(default = "default_sheet_length")]
    pub sheet_length: f64,
    #[serde(default = "default_kerf")]
    pub kerf: f64,
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default = "default_true")]
    pub allow_rotate: bool,
}

fn default_sheet_width() -> f64 {
    DEFAULT_SHEET_WIDTH
}

fn default_sheet_length() -> f64 {
    DEFAULT_SHEET_LENGTH
}

fn default_kerf() -> f64 {
    DEFAULT_KERF
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            sheet_width: DEFAULT_SHEET_WIDTH,
            sheet_length: DEFAULT_SHEET_LENGTH,
            kerf: DEFAULT_KERF,
            algorithm: Algorithm::default(),
            allow_rotate: true,
        }
    }
}

impl PackerConfig {
    /// Sheet dimensions as packed: width along x, length along y.
    pub fn stock(&self) -> Rect {
        Rect::new(self.sheet_width, self.sheet_length)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("sheet_width", self.sheet_width, SHEET_SIDE_RANGE)?;
        check_range("sheet_length", self.sheet_length, SHEET_SIDE_RANGE)?;
        check_range("kerf", self.kerf, KERF_RANGE)?;
        Ok(())
    }

    pub fn from_json(s: &str) -> Result<Self, String> {
        serde_json::from_str(s).map_err(|e| format!("invalid config: {e}"))
    }
}

fn check_range(name: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    // NaN fails both comparisons
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PackerConfig::default();
        assert_eq!(cfg.stock(), Rect::new(1220.0, 2440.0));
        assert_eq!(cfg.kerf, 3.0);
        assert_eq!(cfg.algorithm, Algorithm::MaxRects);
        assert!(cfg.allow_rotate);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = PackerConfig::from_json(r#"{"kerf": 0, "algorithm": "skyline"}"#).unwrap();
        assert_eq!(cfg.kerf, 0.0);
        assert_eq!(cfg.algorithm, Algorithm::Skyline);
        assert_eq!(cfg.sheet_width, DEFAULT_SHEET_WIDTH);
        assert_eq!(cfg.sheet_length, DEFAULT_SHEET_LENGTH);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        assert!(PackerConfig::from_json(r#"{"algorithm": "tetris"}"#).is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let cfg = PackerConfig {
            kerf: 51.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { name: "kerf", .. })
        ));

        let cfg = PackerConfig {
            sheet_width: 50.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                name: "sheet_width",
                ..
            })
        ));

        let cfg = PackerConfig {
            sheet_length: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
