// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors for object validation and topology configuration

use crate::ids::{NodeId, ObjectId};
use thiserror::Error;

/// The reasons why an object record is considered malformed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0}: invalid IPv4 address '{1}'")]
    BadAddress(ObjectId, String),
    #[error("Node {0}: invalid IPv4 address '{1}'")]
    BadNodeAddress(NodeId, String),
    #[error("Node {0}: missing IP address")]
    MissingNodeAddress(NodeId),
    #[error("{0}: invalid protocol '{1}'")]
    BadProtocol(ObjectId, String),
    #[error("{0}: port '{1}' is zero")]
    ZeroPort(ObjectId, String),
    #[error("{0}: duplicate port name '{1}'")]
    DuplicatePortName(ObjectId, String),
    #[error("{0}: invalid traffic policy '{1}'")]
    BadTrafficPolicy(ObjectId, String),
    #[error("Invalid object key '{0}'")]
    BadKey(String),
}

/// Result-like type for object validation
pub type ModelResult<T> = Result<T, ModelError>;

/// The reasons why we may reject a topology configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing mandatory parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Interface name '{0}' is used more than once")]
    DuplicateInterface(String),
    #[error("Pod {0} has more than one interface")]
    DuplicatePodInterface(ObjectId),
    #[error("Failed to parse topology: {0}")]
    Parse(String),
}
