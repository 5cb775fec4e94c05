use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `capstone` binary.
#[derive(Debug, Parser)]
#[command(
    name = "capstone",
    version,
    about = "Capstone - thesis group formation and supervision"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path, overriding `store.path`
    #[arg(long, global = true)]
    pub db: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::subcommands::{GroupCommands, InviteCommands, SupervisionCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "capstone", "--format", "raw", "--limit", "5", "--verbose", "group", "list",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert_eq!(cli.limit, Some(5));
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Group {
                action: GroupCommands::List { .. }
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "capstone", "invite", "accept", "inv-0c9e41d7", "--as", "stu-00000002", "--quiet",
            "--db", ":memory:",
        ])
        .expect("cli should parse");

        assert!(cli.quiet);
        assert_eq!(cli.global_flags().db.as_deref(), Some(":memory:"));
        match cli.command {
            Commands::Invite {
                action: InviteCommands::Accept { id, actor },
            } => {
                assert_eq!(id, "inv-0c9e41d7");
                assert_eq!(actor, "stu-00000002");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn output_format_rejects_table() {
        let parsed = Cli::try_parse_from(["capstone", "--format", "table", "group", "list"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn decision_is_validated_by_clap() {
        let parsed = Cli::try_parse_from([
            "capstone", "supervision", "respond", "svr-00000001", "--as", "tch-00000001",
            "--decision", "maybe",
        ]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "capstone", "supervision", "respond", "svr-00000001", "--as", "tch-00000001",
            "--decision", "accept",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Supervision {
                action: SupervisionCommands::Respond { .. }
            }
        ));
    }

    #[test]
    fn supervision_list_needs_group_or_teacher() {
        let parsed = Cli::try_parse_from(["capstone", "supervision", "list"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "capstone", "supervision", "list", "--group", "grp-00000001", "--teacher",
            "tch-00000001",
        ]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from(["capstone", "supervision", "list", "--teacher", "tch-00000001"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Supervision {
                action: SupervisionCommands::List { group: None, .. }
            }
        ));
    }
}
