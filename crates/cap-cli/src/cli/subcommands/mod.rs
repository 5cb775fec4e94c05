mod group;
mod invite;
mod proposal;
mod student;
mod supervision;
mod teacher;

pub use group::GroupCommands;
pub use invite::InviteCommands;
pub use proposal::ProposalCommands;
pub use student::StudentCommands;
pub use supervision::SupervisionCommands;
pub use teacher::TeacherCommands;
