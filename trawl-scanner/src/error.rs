use crate::node::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid graph: {0}")]
    Graph(String),

    #[error("Invalid crawl configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

/// Failure of a single content fetch. Scoped to one branch of a crawl.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("not found: {node}")]
    NotFound { node: NodeId },

    #[error("unreachable: {node} ({reason})")]
    Unreachable { node: NodeId, reason: String },
}

impl FetchError {
    pub fn node(&self) -> &NodeId {
        match self {
            FetchError::NotFound { node } | FetchError::Unreachable { node, .. } => node,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
