use formfuse_core_types::FuseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Unable to read saved profile: {0}")]
    Unavailable(String),
    #[error("unknown profile path: {0}")]
    UnknownPath(String),
    #[error("profile is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("profile I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProfileError> for FuseError {
    fn from(err: ProfileError) -> Self {
        FuseError::new(err.to_string())
    }
}
