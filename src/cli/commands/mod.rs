mod delete;
mod list;
mod pull;
mod push;
mod set;
mod unset;
mod util;

pub(crate) use delete::cmd_delete;
pub(crate) use list::cmd_list;
pub(crate) use pull::cmd_pull;
pub(crate) use push::cmd_push;
pub(crate) use set::cmd_set;
pub(crate) use unset::cmd_unset;
