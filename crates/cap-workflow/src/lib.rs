//! # cap-workflow
//!
//! The single enforcement point for Capstone's business rules: group
//! formation, invitations, proposals, and supervision.
//!
//! [`PortalService`] wraps a [`RecordStore`](cap_store::RecordStore), a keyed
//! lock table, a domain event channel, and an optional JSONL event journal.
//! Every operation is implemented as an `impl PortalService` block in
//! [`flows`] and follows the same protocol:
//!
//! 1. Acquire the locks for every record the operation checks or writes
//! 2. Re-read those records and validate every invariant
//! 3. Build one [`WriteBatch`](cap_store::WriteBatch) holding the mutations
//!    and their audit entries
//! 4. Commit the batch atomically
//! 5. Publish domain events (broadcast + journal)
//!
//! The core never retries. [`retry::with_retry`] is the caller-side wrapper
//! for the retryable kinds (`StoreUnavailable`, `Busy`).

pub mod error;
pub mod flows;
pub mod journal;
pub mod locks;
pub mod retry;
pub mod service;

#[cfg(test)]
mod test_support;

pub use error::{ErrorKind, WorkflowError};
pub use flows::proposals::{ProposalUpdate, ProposalUpdateBuilder};
pub use journal::EventJournal;
pub use retry::with_retry;
pub use service::PortalService;
