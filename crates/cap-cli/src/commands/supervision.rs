use anyhow::bail;
use cap_core::enums::SupervisionStatus;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SupervisionCommands;
use crate::commands::shared::limit::limited;
use crate::commands::shared::parse::parse_status;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capstone supervision`.
pub async fn handle(
    action: &SupervisionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        SupervisionCommands::Request {
            actor,
            group,
            teacher,
        } => {
            let request = ctx
                .retrying(|| svc.request_supervision(actor, group, teacher))
                .await?;
            output(&request, flags.format)
        }
        SupervisionCommands::Respond {
            id,
            actor,
            decision,
        } => {
            let request = ctx
                .retrying(|| svc.respond_to_supervision_request(actor, id, (*decision).into()))
                .await?;
            output(&request, flags.format)
        }
        SupervisionCommands::Cancel { id, actor } => {
            let request = ctx
                .retrying(|| svc.cancel_supervision_request(actor, id))
                .await?;
            output(&request, flags.format)
        }
        SupervisionCommands::Finalize { id, actor } => {
            let request = ctx.retrying(|| svc.finalize_supervision(actor, id)).await?;
            output(&request, flags.format)
        }
        SupervisionCommands::Get { id } => {
            let request = ctx.retrying(|| svc.get_supervision_request(id)).await?;
            output(&request, flags.format)
        }
        SupervisionCommands::List {
            group,
            teacher,
            status,
        } => {
            let status: Option<SupervisionStatus> = parse_status(status.as_deref())?;
            let requests = match (group, teacher) {
                (Some(group), _) => {
                    let mut requests = ctx.retrying(|| svc.list_group_requests(group)).await?;
                    if let Some(status) = status {
                        requests.retain(|r| r.status == status);
                    }
                    requests
                }
                (None, Some(teacher)) => {
                    ctx.retrying(|| svc.list_teacher_requests(teacher, status))
                        .await?
                }
                (None, None) => bail!("pass --group or --teacher"),
            };
            output(&limited(requests, ctx, flags), flags.format)
        }
    }
}
