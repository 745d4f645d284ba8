//! Error types for packers and their configuration.

use thiserror::Error;

/// Rejected packer or job settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Sheet sides must be finite and positive.
    #[error("invalid sheet size {width}x{height}: sides must be positive")]
    InvalidSheet { width: f64, height: f64 },

    /// Kerf must be finite and non-negative.
    #[error("invalid kerf {0}: must be zero or positive")]
    InvalidKerf(f64),

    /// A setting outside its accepted range.
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Unknown packing algorithm name.
    #[error("unknown algorithm '{0}', expected: guillotine, maxrects, or skyline")]
    UnknownAlgorithm(String),
}

/// Outcome of a `pack` call that placed nothing. The packer stays usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackError {
    /// Does not fit even on an empty sheet, in any allowed orientation.
    #[error("piece {width}x{height} does not fit on a {sheet_width}x{sheet_height} sheet")]
    Unplaceable {
        width: f64,
        height: f64,
        sheet_width: f64,
        sheet_height: f64,
    },

    /// Non-positive or non-finite piece dimensions.
    #[error("invalid piece size {width}x{height}: sides must be positive")]
    InvalidPiece { width: f64, height: f64 },
}
