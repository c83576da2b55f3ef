// ⚠️ Error taxonomy for the pricing pipeline
// Per-club and per-document failures are values, never panics.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    /// No CSV rows carry this club identity
    #[error("club '{club}' not found in pricing sheet")]
    ClubNotFound { club: String },

    /// A header anchor could not be located by any accepted variant
    #[error("column '{capability}' not found in header (accepted: {accepted:?})")]
    ColumnNotFound {
        capability: String,
        accepted: Vec<String>,
    },

    /// The document lacks the text region being spliced
    #[error("{region} region not found in document")]
    RegionNotFound { region: &'static str },

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PricingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PricingError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short category name used in warnings and the run summary
    pub fn kind(&self) -> &'static str {
        match self {
            PricingError::ClubNotFound { .. } => "ClubNotFound",
            PricingError::ColumnNotFound { .. } => "ColumnNotFound",
            PricingError::RegionNotFound { .. } => "RegionNotFound",
            PricingError::Io { .. } => "IOFailure",
            PricingError::Csv(_) => "CsvError",
            PricingError::Json(_) => "ConfigError",
            PricingError::Pattern(_) => "ConfigError",
            PricingError::Config(_) => "ConfigError",
        }
    }
}

pub type Result<T> = std::result::Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let err = PricingError::ClubNotFound {
            club: "rocklin east".to_string(),
        };
        assert_eq!(err.kind(), "ClubNotFound");
        assert!(err.to_string().contains("rocklin east"));

        let err = PricingError::io(
            "missing.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind(), "IOFailure");
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn test_region_message() {
        let err = PricingError::RegionNotFound { region: "pricing" };
        assert_eq!(err.to_string(), "pricing region not found in document");
    }
}
