//! Error handling module
//!
//! Errors surfaced by configuration loading, profile access and page I/O.
//! The fill pass itself reports failures through `FillResponse`, never
//! through this type.

use formfuse_core_types::FuseError;
use formfuse_profile::ProfileError;
use perceiver_form::PerceiverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormFuseError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Document(#[from] PerceiverError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormFuseError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<FormFuseError> for FuseError {
    fn from(err: FormFuseError) -> Self {
        FuseError::new(err.to_string())
    }
}
