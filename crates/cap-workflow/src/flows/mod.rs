//! Workflow operations, one module per subsystem.
//!
//! Each module is an `impl PortalService` block.

pub mod audit;
pub mod groups;
pub mod invitations;
pub mod proposals;
pub mod registry;
pub mod supervision;
