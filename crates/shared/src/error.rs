use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{NodeId, NodeKind},
    protocol::Property,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Conflict,
}

/// Addressing failures raised by tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("node {0} is not a group")]
    NotAGroup(NodeId),
    #[error("group {parent} has no {kind:?} child {child}")]
    ChildNotFound {
        parent: NodeId,
        child: NodeId,
        kind: NodeKind,
    },
    #[error("property {prop} does not apply to {kind:?} {id}")]
    UnsupportedProperty {
        prop: Property,
        kind: NodeKind,
        id: NodeId,
    },
    #[error("invalid value for {prop}: expected {expected}")]
    InvalidValue {
        prop: Property,
        expected: &'static str,
    },
    #[error("group {0} must be added without children")]
    GroupNotEmpty(NodeId),
    #[error("node id {0} already exists in the tree")]
    DuplicateId(NodeId),
    #[error("unknown property {0:?}")]
    UnknownProperty(String),
}

impl TreeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TreeError::NodeNotFound(_) | TreeError::ChildNotFound { .. } => ErrorCode::NotFound,
            TreeError::DuplicateId(_) => ErrorCode::Conflict,
            TreeError::NotAGroup(_)
            | TreeError::UnsupportedProperty { .. }
            | TreeError::InvalidValue { .. }
            | TreeError::GroupNotEmpty(_)
            | TreeError::UnknownProperty(_) => ErrorCode::Validation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&TreeError> for ErrorReport {
    fn from(value: &TreeError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}
