use std::fmt;

use thiserror::Error;

/// The ceiling that stopped an operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Limit {
    /// The configured time limit expired.
    Time,
    /// The number of live nodes exceeded the configured ceiling.
    Nodes(usize),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Time => write!(f, "time limit expired"),
            Limit::Nodes(max) => write!(f, "more than {} live nodes", max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DdError {
    #[error("Out of memory: node table full with {nodes} nodes even after garbage collection")]
    OutOfMemory { nodes: usize },

    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(Limit),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operands belong to different managers")]
    CrossManager,

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Division by a zero leaf")]
    DivideByZero,

    #[error("Internal invariant violated: {0}")]
    Corrupted(String),
}

impl DdError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DdError::InvalidArgument(msg.into())
    }
}

pub type DdResult<T> = Result<T, DdError>;
