use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::enums::EntityType;

/// A student account. Belongs to at most one group at a time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    /// True while the student leads their current group.
    pub is_group_admin: bool,
    /// Number of invitations ever accepted, bounded by `workflow.max_lifetime_accepts`.
    #[serde(default)]
    pub accepted_invitations: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    #[must_use]
    pub const fn in_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// Whether this student currently leads `group_id`.
    #[must_use]
    pub fn leads(&self, group_id: &str) -> bool {
        self.is_group_admin && self.group_id.as_deref() == Some(group_id)
    }

    /// Drop all group membership fields.
    pub fn leave_group(&mut self, now: DateTime<Utc>) {
        self.group_id = None;
        self.group_name = None;
        self.is_group_admin = false;
        self.updated_at = now;
    }
}

impl Entity for Student {
    const KIND: EntityType = EntityType::Student;

    fn id(&self) -> &str {
        &self.id
    }
}
