//! Workflow error types.
//!
//! Every externally visible failure is a named kind so callers can render
//! specific guidance. Domain kinds are final: repeating the call with the same
//! input reproduces them. Only `StoreUnavailable` and `Busy` are retryable.

use std::fmt;

use cap_core::enums::EntityType;
use cap_core::errors::CoreError;
use cap_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("student {student_id} does not lead group {group_id}")]
    NotLeader { student_id: String, group_id: String },

    #[error("student {0} already belongs to a group")]
    AlreadyInGroup(String),

    #[error("invited student {0} already belongs to a group")]
    TargetAlreadyInGroup(String),

    #[error("group {group_id} is full (max {max} members including pending invitations)")]
    GroupFull { group_id: String, max: u32 },

    #[error("student {student_id} already has an open invitation to group {group_id}")]
    DuplicateInvitation { group_id: String, student_id: String },

    #[error("student {0} has already accepted an invitation")]
    LifetimeAcceptCapReached(String),

    #[error("leader of group {group_id} already has {cap} open invitations")]
    InvitationCapReached { group_id: String, cap: u32 },

    #[error("group {0} already has a proposal")]
    ProposalAlreadyExists(String),

    #[error("group {0} has no proposal to supervise")]
    ProposalRequired(String),

    #[error("group {group_id} already has an open request to teacher {teacher_id}")]
    DuplicateRequest { group_id: String, teacher_id: String },

    #[error("group {group_id} already has {cap} pending supervision requests")]
    RequestCapReached { group_id: String, cap: u32 },

    #[error("teacher {0} has no open supervision slots")]
    TeacherAtCapacity(String),

    #[error("{kind} {id} is already {status}")]
    AlreadyResolved {
        kind: EntityType,
        id: String,
        status: String,
    },

    #[error("student {0} already has an open group creation request")]
    DuplicatePendingRequest(String),

    #[error("group creation request {0} not found")]
    RequestNotFound(String),

    #[error("group creation request {id} is already {status}")]
    RequestNotPending { id: String, status: String },

    #[error("invitation {invitation_id} is not addressed to student {student_id}")]
    NotInvitee {
        invitation_id: String,
        student_id: String,
    },

    #[error("supervision request {request_id} is not addressed to teacher {teacher_id}")]
    NotAssignedTeacher {
        request_id: String,
        teacher_id: String,
    },

    #[error("group {group_id} is {status}, not forming")]
    GroupNotForming { group_id: String, status: String },

    #[error("group {group_id} is {status}, not active")]
    GroupNotActive { group_id: String, status: String },

    #[error("group {0} already has an accepted supervisor")]
    AlreadySupervised(String),

    #[error("supervision request {request_id} is {status}, not accepted")]
    SupervisionNotAccepted { request_id: String, status: String },

    #[error("{0}")]
    InvalidTransition(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityType, id: String },

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("busy: {0}")]
    Busy(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Serializable discriminant of [`WorkflowError`], for UIs and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotLeader,
    AlreadyInGroup,
    TargetAlreadyInGroup,
    GroupFull,
    DuplicateInvitation,
    LifetimeAcceptCapReached,
    InvitationCapReached,
    ProposalAlreadyExists,
    ProposalRequired,
    DuplicateRequest,
    RequestCapReached,
    TeacherAtCapacity,
    AlreadyResolved,
    DuplicatePendingRequest,
    RequestNotFound,
    RequestNotPending,
    NotInvitee,
    NotAssignedTeacher,
    GroupNotForming,
    GroupNotActive,
    AlreadySupervised,
    SupervisionNotAccepted,
    InvalidTransition,
    Validation,
    NotFound,
    StoreUnavailable,
    Busy,
    Storage,
}

impl ErrorKind {
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::StoreUnavailable | Self::Busy)
    }

    #[must_use]
    pub const fn is_infrastructure(self) -> bool {
        matches!(self, Self::StoreUnavailable | Self::Busy | Self::Storage)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(s)) => f.write_str(&s),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl WorkflowError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotLeader { .. } => ErrorKind::NotLeader,
            Self::AlreadyInGroup(_) => ErrorKind::AlreadyInGroup,
            Self::TargetAlreadyInGroup(_) => ErrorKind::TargetAlreadyInGroup,
            Self::GroupFull { .. } => ErrorKind::GroupFull,
            Self::DuplicateInvitation { .. } => ErrorKind::DuplicateInvitation,
            Self::LifetimeAcceptCapReached(_) => ErrorKind::LifetimeAcceptCapReached,
            Self::InvitationCapReached { .. } => ErrorKind::InvitationCapReached,
            Self::ProposalAlreadyExists(_) => ErrorKind::ProposalAlreadyExists,
            Self::ProposalRequired(_) => ErrorKind::ProposalRequired,
            Self::DuplicateRequest { .. } => ErrorKind::DuplicateRequest,
            Self::RequestCapReached { .. } => ErrorKind::RequestCapReached,
            Self::TeacherAtCapacity(_) => ErrorKind::TeacherAtCapacity,
            Self::AlreadyResolved { .. } => ErrorKind::AlreadyResolved,
            Self::DuplicatePendingRequest(_) => ErrorKind::DuplicatePendingRequest,
            Self::RequestNotFound(_) => ErrorKind::RequestNotFound,
            Self::RequestNotPending { .. } => ErrorKind::RequestNotPending,
            Self::NotInvitee { .. } => ErrorKind::NotInvitee,
            Self::NotAssignedTeacher { .. } => ErrorKind::NotAssignedTeacher,
            Self::GroupNotForming { .. } => ErrorKind::GroupNotForming,
            Self::GroupNotActive { .. } => ErrorKind::GroupNotActive,
            Self::AlreadySupervised(_) => ErrorKind::AlreadySupervised,
            Self::SupervisionNotAccepted { .. } => ErrorKind::SupervisionNotAccepted,
            Self::InvalidTransition(_) => ErrorKind::InvalidTransition,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Busy(_) => ErrorKind::Busy,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            // Proposals are the only kind keyed by group.
            StoreError::Conflict {
                kind: EntityType::Proposal,
                key,
            } => Self::ProposalAlreadyExists(key),
            StoreError::Conflict { kind, key } => {
                Self::Storage(format!("{kind} {key} already exists"))
            }
            StoreError::Corrupt(msg) => Self::Storage(msg),
        }
    }
}

impl From<CoreError> for WorkflowError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { .. } => Self::InvalidTransition(err.to_string()),
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::IdGeneration(msg) => Self::Storage(msg),
        }
    }
}
