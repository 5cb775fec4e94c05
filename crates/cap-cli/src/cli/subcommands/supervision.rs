use cap_core::enums::SupervisionDecision;
use clap::{Subcommand, ValueEnum};

/// Teacher's answer to a supervision request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DecisionArg {
    Accept,
    Reject,
}

impl From<DecisionArg> for SupervisionDecision {
    fn from(value: DecisionArg) -> Self {
        match value {
            DecisionArg::Accept => Self::Accept,
            DecisionArg::Reject => Self::Reject,
        }
    }
}

/// Supervision request commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SupervisionCommands {
    /// Ask a teacher to supervise the group's proposal.
    Request {
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        teacher: String,
    },
    /// Accept or reject a request (assigned teacher only).
    Respond {
        id: String,
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        decision: DecisionArg,
    },
    /// Withdraw a pending request (group leader only).
    Cancel {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Lock in an accepted pairing and approve the proposal.
    Finalize {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Get a request by ID.
    Get { id: String },
    /// List requests by group or by teacher.
    List {
        #[arg(long, required_unless_present = "teacher", conflicts_with = "teacher")]
        group: Option<String>,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
}
