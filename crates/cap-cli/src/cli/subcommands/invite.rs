use clap::Subcommand;

/// Invitation commands.
#[derive(Clone, Debug, Subcommand)]
pub enum InviteCommands {
    /// Invite a student into the leader's forming group.
    Send {
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        student: String,
    },
    /// Accept an invitation.
    Accept {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Decline an invitation.
    Decline {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Withdraw a pending invitation (sender only).
    Cancel {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Get an invitation by ID.
    Get { id: String },
    /// Invitations sent by a leader.
    Sent {
        #[arg(long)]
        leader: String,
    },
    /// Invitations addressed to a student.
    Received {
        #[arg(long)]
        student: String,
        #[arg(long)]
        status: Option<String>,
    },
}
