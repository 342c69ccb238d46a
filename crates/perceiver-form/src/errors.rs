use formfuse_core_types::{FuseError, NodeId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerceiverError {
    #[error("failed to load page: {0}")]
    HtmlLoad(String),
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0} cannot be modified: {1}")]
    Unsupported(NodeId, String),
}

impl From<PerceiverError> for FuseError {
    fn from(err: PerceiverError) -> Self {
        FuseError::new(err.to_string())
    }
}
