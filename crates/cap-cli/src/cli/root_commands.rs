use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    GroupCommands, InviteCommands, ProposalCommands, StudentCommands, SupervisionCommands,
    TeacherCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Student accounts.
    Student {
        #[command(subcommand)]
        action: StudentCommands,
    },
    /// Teacher accounts.
    Teacher {
        #[command(subcommand)]
        action: TeacherCommands,
    },
    /// Group creation requests and group lifecycle.
    Group {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Group invitations.
    Invite {
        #[command(subcommand)]
        action: InviteCommands,
    },
    /// Thesis proposals.
    Proposal {
        #[command(subcommand)]
        action: ProposalCommands,
    },
    /// Supervision requests.
    Supervision {
        #[command(subcommand)]
        action: SupervisionCommands,
    },
    /// Audit trail.
    Audit(AuditArgs),
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Only entries for this entity ID.
    #[arg(long)]
    pub entity: Option<String>,
}
