mod audit;
mod group;
mod invite;
mod proposal;
mod shared;
mod student;
mod supervision;
mod teacher;

use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Student { action } => student::handle(&action, ctx, flags).await,
        Commands::Teacher { action } => teacher::handle(&action, ctx, flags).await,
        Commands::Group { action } => group::handle(&action, ctx, flags).await,
        Commands::Invite { action } => invite::handle(&action, ctx, flags).await,
        Commands::Proposal { action } => proposal::handle(&action, ctx, flags).await,
        Commands::Supervision { action } => supervision::handle(&action, ctx, flags).await,
        Commands::Audit(args) => audit::handle(&args, ctx, flags).await,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use cap_config::CapConfig;

    use crate::cli::{GlobalFlags, OutputFormat};
    use crate::context::AppContext;

    pub async fn memory_context() -> AppContext {
        let mut config = CapConfig::default();
        config.store.path = ":memory:".to_string();
        AppContext::init(config).await.expect("in-memory context")
    }

    pub fn raw_flags() -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Raw,
            limit: None,
            quiet: true,
            verbose: false,
            db: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use cap_core::enums::CreationRequestStatus;
    use cap_workflow::{ErrorKind, WorkflowError};
    use pretty_assertions::assert_eq;

    use super::dispatch;
    use super::test_support::{memory_context, raw_flags};
    use crate::cli::Commands;
    use crate::cli::subcommands::{
        GroupCommands, InviteCommands, ProposalCommands, SupervisionCommands,
    };

    #[tokio::test]
    async fn group_request_reaches_the_service() {
        let ctx = memory_context().await;
        let ada = ctx
            .service
            .register_student("Ada", "ada@uni.example")
            .await
            .unwrap();

        let command = Commands::Group {
            action: GroupCommands::Request {
                actor: ada.id.clone(),
                name: "Parsers".into(),
                description: None,
            },
        };
        dispatch(command, &ctx, &raw_flags()).await.unwrap();

        let pending = ctx
            .service
            .list_creation_requests(Some(CreationRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].student_id, ada.id);
    }

    #[tokio::test]
    async fn workflow_errors_keep_their_kind() {
        let ctx = memory_context().await;
        let command = Commands::Invite {
            action: InviteCommands::Accept {
                id: "inv-00000000".into(),
                actor: "stu-00000000".into(),
            },
        };

        let error = dispatch(command, &ctx, &raw_flags()).await.unwrap_err();
        let workflow = error
            .downcast_ref::<WorkflowError>()
            .expect("workflow error should survive anyhow");
        assert_eq!(workflow.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn supervision_list_without_scope_is_an_error() {
        let ctx = memory_context().await;
        let command = Commands::Supervision {
            action: SupervisionCommands::List {
                group: None,
                teacher: None,
                status: None,
            },
        };

        let error = dispatch(command, &ctx, &raw_flags()).await.unwrap_err();
        assert!(error.to_string().contains("--group or --teacher"));
    }

    #[tokio::test]
    async fn proposal_delete_requires_a_draft_owner() {
        let ctx = memory_context().await;
        let command = Commands::Proposal {
            action: ProposalCommands::Delete {
                id: "prp-00000000".into(),
                actor: "stu-00000000".into(),
            },
        };

        let error = dispatch(command, &ctx, &raw_flags()).await.unwrap_err();
        let workflow = error
            .downcast_ref::<WorkflowError>()
            .expect("workflow error should survive anyhow");
        assert_eq!(workflow.kind(), ErrorKind::NotFound);
    }
}
