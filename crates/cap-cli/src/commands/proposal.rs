use anyhow::bail;
use cap_core::entities::ProposalFields;
use cap_workflow::ProposalUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProposalCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capstone proposal`.
pub async fn handle(action: &ProposalCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        ProposalCommands::Create {
            actor,
            group,
            title,
            summary,
            field,
            project_type,
        } => {
            let fields = ProposalFields {
                title: title.clone(),
                summary: summary.clone(),
                field: field.clone(),
                project_type: project_type.clone(),
            };
            let proposal = ctx
                .retrying(|| svc.create_proposal(actor, group, fields.clone()))
                .await?;
            output(&proposal, flags.format)
        }
        ProposalCommands::Update {
            id,
            actor,
            title,
            summary,
            field,
            project_type,
        } => {
            let mut builder = ProposalUpdateBuilder::new();
            if let Some(title) = title {
                builder = builder.title(title);
            }
            if let Some(summary) = summary {
                builder = builder.summary(summary);
            }
            if let Some(field) = field {
                builder = builder.field(field);
            }
            if let Some(project_type) = project_type {
                builder = builder.project_type(project_type);
            }
            let update = builder.build();
            let proposal = ctx
                .retrying(|| svc.update_proposal(actor, id, update.clone()))
                .await?;
            output(&proposal, flags.format)
        }
        ProposalCommands::Submit { id, actor } => {
            let proposal = ctx.retrying(|| svc.submit_proposal(actor, id)).await?;
            output(&proposal, flags.format)
        }
        ProposalCommands::Reject { id, actor, reason } => {
            let proposal = ctx
                .retrying(|| svc.reject_proposal(actor, id, reason.as_deref()))
                .await?;
            output(&proposal, flags.format)
        }
        ProposalCommands::Delete { id, actor } => {
            ctx.retrying(|| svc.delete_proposal(actor, id)).await?;
            output(&serde_json::json!({ "deleted": id }), flags.format)
        }
        ProposalCommands::Get { id, group } => match (id, group) {
            (Some(id), _) => {
                let proposal = ctx.retrying(|| svc.get_proposal(id)).await?;
                output(&proposal, flags.format)
            }
            (None, Some(group)) => {
                let proposal = ctx.retrying(|| svc.get_proposal_for_group(group)).await?;
                output(&proposal, flags.format)
            }
            (None, None) => bail!("pass a proposal ID or --group"),
        },
    }
}
