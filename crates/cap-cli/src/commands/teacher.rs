use crate::cli::GlobalFlags;
use crate::cli::subcommands::TeacherCommands;
use crate::commands::shared::limit::limited;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capstone teacher`.
pub async fn handle(action: &TeacherCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        TeacherCommands::Register {
            name,
            email,
            max_students,
            topics,
        } => {
            let teacher = ctx
                .retrying(|| {
                    ctx.service
                        .register_teacher(name, email, *max_students, topics.clone())
                })
                .await?;
            output(&teacher, flags.format)
        }
        TeacherCommands::Get { id } => {
            let teacher = ctx.retrying(|| ctx.service.get_teacher(id)).await?;
            output(&teacher, flags.format)
        }
        TeacherCommands::List { available } => {
            let teachers = ctx
                .retrying(|| ctx.service.list_teachers(*available))
                .await?;
            output(&limited(teachers, ctx, flags), flags.format)
        }
    }
}
