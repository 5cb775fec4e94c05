//! # cap-core
//!
//! Core types, ID generation, and error types for Capstone.
//!
//! This crate provides the foundational types shared across all Capstone crates:
//! - Entity structs for the group formation and supervision workflow
//! - Status enums with state machine transitions
//! - ID prefix constants and generation
//! - Cross-cutting error types
//! - Domain events emitted after committed mutations
//! - Audit detail sub-types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod events;
pub mod ids;
