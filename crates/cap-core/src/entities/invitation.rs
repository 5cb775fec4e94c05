use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::enums::{EntityType, InvitationStatus};

/// A directed invitation from a group leader to a candidate student.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupInvitation {
    pub id: String,
    pub from_student_id: String,
    pub to_student_id: String,
    pub group_id: String,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for GroupInvitation {
    const KIND: EntityType = EntityType::Invitation;

    fn id(&self) -> &str {
        &self.id
    }
}
