use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::enums::{EntityType, GroupStatus, MemberRole};
use crate::errors::CoreError;

/// One seat in a group.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GroupMember {
    pub student_id: String,
    pub role: MemberRole,
}

/// A student group led by exactly one leader.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub leader_student_id: String,
    /// Ordered by join time; the leader is always first.
    pub members: Vec<GroupMember>,
    pub status: GroupStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_member(&self, student_id: &str) -> bool {
        self.members.iter().any(|m| m.student_id == student_id)
    }

    #[must_use]
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.student_id.clone()).collect()
    }

    /// Append a plain member.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the student is already a member or the
    /// group would exceed `max_size`.
    pub fn add_member(&mut self, student_id: &str, max_size: usize) -> Result<(), CoreError> {
        if self.is_member(student_id) {
            return Err(CoreError::Validation(format!(
                "student {student_id} is already a member of group {}",
                self.id
            )));
        }
        if self.size() >= max_size {
            return Err(CoreError::Validation(format!(
                "group {} already has {max_size} members",
                self.id
            )));
        }
        self.members.push(GroupMember {
            student_id: student_id.to_string(),
            role: MemberRole::Member,
        });
        Ok(())
    }

    /// Check the structural invariants: one leader, listed with role `leader`,
    /// and no more than `max_size` members.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first violated invariant.
    pub fn validate(&self, max_size: usize) -> Result<(), CoreError> {
        if self.members.is_empty() || self.size() > max_size {
            return Err(CoreError::Validation(format!(
                "group {} has {} members, expected 1..={max_size}",
                self.id,
                self.size()
            )));
        }
        let leaders: Vec<_> = self
            .members
            .iter()
            .filter(|m| m.role == MemberRole::Leader)
            .collect();
        match leaders.as_slice() {
            [leader] if leader.student_id == self.leader_student_id => Ok(()),
            _ => Err(CoreError::Validation(format!(
                "group {} must list exactly its leader {} with role leader",
                self.id, self.leader_student_id
            ))),
        }
    }
}

impl Entity for Group {
    const KIND: EntityType = EntityType::Group;

    fn id(&self) -> &str {
        &self.id
    }
}
