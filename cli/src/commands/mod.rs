mod chat;
mod helpers;
mod log;
mod plan;
mod user;

pub(crate) use chat::cmd_chat;
pub(crate) use log::{cmd_cgm, cmd_food, cmd_logs, cmd_mood};
pub(crate) use plan::{PlanArgs, cmd_insights, cmd_plan};
pub(crate) use user::cmd_user;
