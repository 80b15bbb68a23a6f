// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors returned by the service processor

use crate::processor::ProcessorState;
use nat::{DumpError, SinkError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("Cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: ProcessorState,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("Inconsistent dataplane dump: {0}")]
    InconsistentDump(#[from] DumpError),
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;
