mod dump;
mod get;
mod set;
mod util;

pub(crate) use dump::{cmd_dump, cmd_stats};
pub(crate) use get::cmd_get;
pub(crate) use set::cmd_set;
pub(crate) use util::open_registry;
