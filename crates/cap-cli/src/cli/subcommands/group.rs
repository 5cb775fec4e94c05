use clap::Subcommand;

/// Group lifecycle commands. `--as` names the acting student or admin.
#[derive(Clone, Debug, Subcommand)]
pub enum GroupCommands {
    /// Ask an admin to create a group led by the acting student.
    Request {
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Approve a creation request.
    Approve {
        request_id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Reject a creation request.
    Reject {
        request_id: String,
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List creation requests.
    Requests {
        #[arg(long)]
        status: Option<String>,
    },
    /// Confirm a forming group (leader only).
    Confirm {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Dissolve a group.
    Dissolve {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Get a group by ID.
    Get { id: String },
    /// List groups.
    List {
        #[arg(long)]
        status: Option<String>,
    },
}
