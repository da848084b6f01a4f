mod constants;
mod event_bus;
mod task_util;
mod type_utils;

pub use constants::*;
pub use event_bus::*;
pub use task_util::*;
pub use type_utils::*;
