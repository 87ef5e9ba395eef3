//! Core configuration and data model for mailsift.
//!
//! Defines the brand registry (the read-only catalog of merchant detection
//! rules loaded once per batch), the raw mail record consumed by the
//! classification pipeline, and the derived classification output shapes.

pub mod record;
pub mod registry;

use thiserror::Error;

pub use record::{Classification, ExtractedFields, Frequency, MailRecord, MailType};
pub use registry::{load_registry, BrandRegistry, BrandRule, ScoreWeights};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read registry at {path}: {source}")]
    RegistryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry: {0}")]
    RegistryParse(#[from] serde_yaml::Error),

    #[error("invalid registry: {0}")]
    Validation(String),
}
