mod builder;
mod default_resolver;

pub use builder::*;
pub use default_resolver::*;
