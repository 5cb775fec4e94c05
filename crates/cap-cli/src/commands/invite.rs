use cap_core::enums::InvitationStatus;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::InviteCommands;
use crate::commands::shared::limit::limited;
use crate::commands::shared::parse::parse_status;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capstone invite`.
pub async fn handle(action: &InviteCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        InviteCommands::Send {
            actor,
            group,
            student,
        } => {
            let invitation = ctx
                .retrying(|| svc.send_invitation(actor, group, student))
                .await?;
            output(&invitation, flags.format)
        }
        InviteCommands::Accept { id, actor } => {
            let group = ctx.retrying(|| svc.accept_invitation(actor, id)).await?;
            output(&group, flags.format)
        }
        InviteCommands::Decline { id, actor } => {
            let invitation = ctx.retrying(|| svc.decline_invitation(actor, id)).await?;
            output(&invitation, flags.format)
        }
        InviteCommands::Cancel { id, actor } => {
            let invitation = ctx.retrying(|| svc.cancel_invitation(actor, id)).await?;
            output(&invitation, flags.format)
        }
        InviteCommands::Get { id } => {
            let invitation = ctx.retrying(|| svc.get_invitation(id)).await?;
            output(&invitation, flags.format)
        }
        InviteCommands::Sent { leader } => {
            let invitations = ctx.retrying(|| svc.list_sent_invitations(leader)).await?;
            output(&limited(invitations, ctx, flags), flags.format)
        }
        InviteCommands::Received { student, status } => {
            let status: Option<InvitationStatus> = parse_status(status.as_deref())?;
            let invitations = ctx
                .retrying(|| svc.list_received_invitations(student, status))
                .await?;
            output(&limited(invitations, ctx, flags), flags.format)
        }
    }
}
