use crate::errors::{ErrorKind, OpsError};

mod aggregator;
mod batch_executor;
#[cfg(feature = "deferred")]
mod deferred;
mod delete;
mod prepared;
mod put;
mod resolver;
mod results;
mod transaction;

#[cfg(feature = "deferred")]
pub use deferred::*;
pub use delete::*;
pub use prepared::*;
pub use put::*;
pub use resolver::*;
pub use results::*;

pub(crate) fn missing_resolver<T>(operation: &str) -> OpsError {
    let type_name = std::any::type_name::<T>();
    log::error!("No {} resolver configured for {}", operation, type_name);
    OpsError::new(
        &format!(
            "Please specify a {} resolver for {}, either explicitly or through a type mapping",
            operation, type_name
        ),
        ErrorKind::ConfigurationError,
    )
}
