//! Cross-cutting error types for Capstone.
//!
//! Errors that can originate from entity-level validation in any crate.
//! Storage errors (`StoreError`) and workflow rule violations (`WorkflowError`)
//! are defined in their respective crates.

use thiserror::Error;

/// Errors raised by entity helpers and status machines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Random ID generation failed.
    #[error("ID generation failed: {0}")]
    IdGeneration(String),
}
