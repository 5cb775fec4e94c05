use cap_core::enums::{CreationRequestStatus, GroupStatus};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::GroupCommands;
use crate::commands::shared::limit::limited;
use crate::commands::shared::parse::parse_status;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capstone group`.
pub async fn handle(action: &GroupCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        GroupCommands::Request {
            actor,
            name,
            description,
        } => {
            let request = ctx
                .retrying(|| svc.request_group_creation(actor, name, description.as_deref()))
                .await?;
            output(&request, flags.format)
        }
        GroupCommands::Approve { request_id, actor } => {
            let group = ctx
                .retrying(|| svc.approve_group_creation(actor, request_id))
                .await?;
            output(&group, flags.format)
        }
        GroupCommands::Reject {
            request_id,
            actor,
            reason,
        } => {
            let request = ctx
                .retrying(|| svc.reject_group_creation(actor, request_id, reason.as_deref()))
                .await?;
            output(&request, flags.format)
        }
        GroupCommands::Requests { status } => {
            let status: Option<CreationRequestStatus> = parse_status(status.as_deref())?;
            let requests = ctx.retrying(|| svc.list_creation_requests(status)).await?;
            output(&limited(requests, ctx, flags), flags.format)
        }
        GroupCommands::Confirm { id, actor } => {
            let group = ctx.retrying(|| svc.confirm_group(actor, id)).await?;
            output(&group, flags.format)
        }
        GroupCommands::Dissolve { id, actor } => {
            let group = ctx.retrying(|| svc.dissolve_group(actor, id)).await?;
            output(&group, flags.format)
        }
        GroupCommands::Get { id } => {
            let group = ctx.retrying(|| svc.get_group(id)).await?;
            output(&group, flags.format)
        }
        GroupCommands::List { status } => {
            let status: Option<GroupStatus> = parse_status(status.as_deref())?;
            let groups = ctx.retrying(|| svc.list_groups(status)).await?;
            output(&limited(groups, ctx, flags), flags.format)
        }
    }
}
