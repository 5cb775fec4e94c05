use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::enums::{EntityType, SupervisionStatus};

/// A group's request for a named teacher to supervise its proposal.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SupervisionRequest {
    pub id: String,
    pub group_id: String,
    pub proposal_id: String,
    pub teacher_id: String,
    pub status: SupervisionStatus,
    /// Set once an admin has locked in the pairing.
    #[serde(default)]
    pub finalized: bool,
    pub finalized_by: Option<String>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for SupervisionRequest {
    const KIND: EntityType = EntityType::SupervisionRequest;

    fn id(&self) -> &str {
        &self.id
    }
}
