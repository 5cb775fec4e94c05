use clap::Subcommand;

/// Proposal commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProposalCommands {
    /// Create the group's proposal as a draft.
    Create {
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        title: String,
        #[arg(long = "abstract", default_value = "")]
        summary: String,
        #[arg(long, default_value = "")]
        field: String,
        #[arg(long, default_value = "")]
        project_type: String,
    },
    /// Edit a draft proposal.
    Update {
        id: String,
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "abstract")]
        summary: Option<String>,
        #[arg(long)]
        field: Option<String>,
        #[arg(long)]
        project_type: Option<String>,
    },
    /// Submit a draft for review.
    Submit {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Reject a submitted proposal.
    Reject {
        id: String,
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Delete a draft proposal.
    Delete {
        id: String,
        #[arg(long = "as")]
        actor: String,
    },
    /// Get a proposal by ID, or by `--group`.
    Get {
        id: Option<String>,
        #[arg(long, conflicts_with = "id")]
        group: Option<String>,
    },
}
