use clap::Subcommand;

/// Teacher account commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TeacherCommands {
    /// Register a teacher.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Number of groups this teacher can supervise.
        #[arg(long)]
        max_students: u32,
        /// Accepted topic (repeatable).
        #[arg(long = "topic")]
        topics: Vec<String>,
    },
    /// Get a teacher by ID.
    Get { id: String },
    /// List teachers.
    List {
        /// Only teachers with an open supervision slot.
        #[arg(long)]
        available: bool,
    },
}
