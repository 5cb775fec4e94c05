use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::enums::{EntityType, ProposalStatus};

/// A group's thesis/project proposal. One per group.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Proposal {
    pub id: String,
    pub group_id: String,
    pub author_student_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub summary: String,
    pub field: String,
    pub project_type: String,
    pub status: ProposalStatus,
    /// Admin's reason on rejection.
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Proposal {
    const KIND: EntityType = EntityType::Proposal;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.group_id.clone())
    }
}

/// Author-supplied proposal content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProposalFields {
    pub title: String,
    #[serde(rename = "abstract")]
    pub summary: String,
    pub field: String,
    pub project_type: String,
}
