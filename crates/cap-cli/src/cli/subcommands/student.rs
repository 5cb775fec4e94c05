use clap::Subcommand;

/// Student account commands.
#[derive(Clone, Debug, Subcommand)]
pub enum StudentCommands {
    /// Register a student.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Get a student by ID.
    Get { id: String },
    /// List students in a group, or those without one.
    List {
        #[arg(long)]
        group: Option<String>,
    },
}
