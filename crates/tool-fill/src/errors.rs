use formfuse_core_types::{FuseError, NodeId};
use perceiver_form::PerceiverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FillError {
    #[error("control {0} has no fill strategy")]
    Unsupported(NodeId),
    #[error("document rejected the change: {0}")]
    Document(#[from] PerceiverError),
}

impl From<FillError> for FuseError {
    fn from(err: FillError) -> Self {
        FuseError::new(err.to_string())
    }
}
