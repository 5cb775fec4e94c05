use crate::cli::GlobalFlags;
use crate::cli::subcommands::StudentCommands;
use crate::commands::shared::limit::limited;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capstone student`.
pub async fn handle(action: &StudentCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        StudentCommands::Register { name, email } => {
            let student = ctx
                .retrying(|| ctx.service.register_student(name, email))
                .await?;
            output(&student, flags.format)
        }
        StudentCommands::Get { id } => {
            let student = ctx.retrying(|| ctx.service.get_student(id)).await?;
            output(&student, flags.format)
        }
        StudentCommands::List { group } => {
            let students = ctx
                .retrying(|| ctx.service.list_students(group.as_deref()))
                .await?;
            output(&limited(students, ctx, flags), flags.format)
        }
    }
}
