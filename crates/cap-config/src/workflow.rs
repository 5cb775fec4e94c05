//! Business-rule limits for the group and supervision workflow.

use serde::{Deserialize, Serialize};

const fn default_max_group_size() -> u32 {
    3
}

const fn default_max_outstanding_invitations() -> u32 {
    2
}

const fn default_max_lifetime_accepts() -> u32 {
    1
}

const fn default_max_pending_supervision_requests() -> u32 {
    3
}

const fn default_event_channel_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Maximum members per group, leader included.
    #[serde(default = "default_max_group_size")]
    pub max_group_size: u32,

    /// Maximum pending + accepted invitations a leader may hold for one group.
    #[serde(default = "default_max_outstanding_invitations")]
    pub max_outstanding_invitations: u32,

    /// Invitations a student may accept over the lifetime of their account.
    /// Dissolving a group does not give acceptances back.
    #[serde(default = "default_max_lifetime_accepts")]
    pub max_lifetime_accepts: u32,

    /// Maximum concurrently pending supervision requests per group.
    #[serde(default = "default_max_pending_supervision_requests")]
    pub max_pending_supervision_requests: u32,

    /// Buffer size of the domain event broadcast channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_group_size: default_max_group_size(),
            max_outstanding_invitations: default_max_outstanding_invitations(),
            max_lifetime_accepts: default_max_lifetime_accepts(),
            max_pending_supervision_requests: default_max_pending_supervision_requests(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}
