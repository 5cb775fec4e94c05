//! Domain events emitted after a workflow mutation has been committed.
//!
//! Notification and chat systems subscribe to these; the transport is theirs.
//! Events are never emitted for a mutation that failed to commit.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Something that happened in the group/supervision workflow.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    GroupFormed {
        group_id: String,
        leader_student_id: String,
    },
    GroupActivated {
        group_id: String,
        member_ids: Vec<String>,
    },
    GroupDissolved {
        group_id: String,
        released_student_ids: Vec<String>,
    },
    InvitationSent {
        invitation_id: String,
        group_id: String,
        to_student_id: String,
    },
    InvitationAccepted {
        invitation_id: String,
        group_id: String,
        student_id: String,
    },
    SupervisionRequested {
        request_id: String,
        group_id: String,
        teacher_id: String,
    },
    SupervisionAccepted {
        request_id: String,
        group_id: String,
        teacher_id: String,
        superseded_request_ids: Vec<String>,
    },
    SupervisionFinalized {
        request_id: String,
        group_id: String,
        proposal_id: String,
    },
}

impl DomainEvent {
    /// Stable event name, matching the serde tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GroupFormed { .. } => "group_formed",
            Self::GroupActivated { .. } => "group_activated",
            Self::GroupDissolved { .. } => "group_dissolved",
            Self::InvitationSent { .. } => "invitation_sent",
            Self::InvitationAccepted { .. } => "invitation_accepted",
            Self::SupervisionRequested { .. } => "supervision_requested",
            Self::SupervisionAccepted { .. } => "supervision_accepted",
            Self::SupervisionFinalized { .. } => "supervision_finalized",
        }
    }

    /// Group the event concerns. Every event is scoped to one group.
    #[must_use]
    pub fn group_id(&self) -> &str {
        match self {
            Self::GroupFormed { group_id, .. }
            | Self::GroupActivated { group_id, .. }
            | Self::GroupDissolved { group_id, .. }
            | Self::InvitationSent { group_id, .. }
            | Self::InvitationAccepted { group_id, .. }
            | Self::SupervisionRequested { group_id, .. }
            | Self::SupervisionAccepted { group_id, .. }
            | Self::SupervisionFinalized { group_id, .. } => group_id,
        }
    }
}

/// Journal envelope: an event plus the time it was committed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EventRecord {
    /// Envelope version.
    pub v: u32,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DomainEvent,
}
