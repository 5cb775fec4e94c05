use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::enums::EntityType;

/// A teacher who can supervise up to `max_students` groups.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    pub max_students: u32,
    /// Number of accepted supervision requests held by this teacher.
    pub current_students_count: u32,
    #[serde(default)]
    pub accepted_topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Teacher {
    #[must_use]
    pub const fn has_capacity(&self) -> bool {
        self.current_students_count < self.max_students
    }

    #[must_use]
    pub const fn open_slots(&self) -> u32 {
        self.max_students.saturating_sub(self.current_students_count)
    }
}

impl Entity for Teacher {
    const KIND: EntityType = EntityType::Teacher;

    fn id(&self) -> &str {
        &self.id
    }
}
