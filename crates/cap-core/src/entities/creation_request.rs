use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::enums::{CreationRequestStatus, EntityType};

/// A student's request to found a group, pending admin approval.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupCreationRequest {
    pub id: String,
    pub student_id: String,
    pub group_name: String,
    pub description: Option<String>,
    pub status: CreationRequestStatus,
    /// Group created on approval.
    pub group_id: Option<String>,
    /// Admin's reason on rejection.
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for GroupCreationRequest {
    const KIND: EntityType = EntityType::CreationRequest;

    fn id(&self) -> &str {
        &self.id
    }
}
