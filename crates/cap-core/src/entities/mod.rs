//! Entity structs for all Capstone domain objects.
//!
//! Each entity is stored as one JSON record in the record store, keyed by its
//! [`EntityType`] and `id`. All structs derive `Serialize`, `Deserialize`, and
//! `JsonSchema` for JSON roundtrip and schema validation.

mod audit;
mod creation_request;
mod group;
mod invitation;
mod proposal;
mod student;
mod supervision;
mod teacher;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::enums::EntityType;

pub use audit::AuditEntry;
pub use creation_request::GroupCreationRequest;
pub use group::{Group, GroupMember};
pub use invitation::GroupInvitation;
pub use proposal::{Proposal, ProposalFields};
pub use student::Student;
pub use supervision::SupervisionRequest;
pub use teacher::Teacher;

/// A record type the store knows how to persist.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Record kind this entity is filed under.
    const KIND: EntityType;

    fn id(&self) -> &str;

    /// Key that must be unique among records of the same kind, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }
}
