mod coach;
mod goals;
mod helpers;
mod log;
mod summary;

pub(crate) use coach::{cmd_advice, cmd_chat, cmd_context, cmd_health};
pub(crate) use goals::{cmd_goals_set, cmd_goals_show};
pub(crate) use log::{MealArgs, cmd_log};
pub(crate) use summary::{cmd_history, cmd_summary};
