use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for storeops operations.
///
/// Each kind describes a category of failure so callers can branch on
/// [`OpsError::kind`] instead of parsing messages.
///
/// # Examples
///
/// ```rust
/// use storeops::errors::{ErrorKind, OpsError, OpsResult};
///
/// fn example() -> OpsResult<()> {
///     Err(OpsError::new("Please specify a delete resolver", ErrorKind::ConfigurationError))
/// }
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::ConfigurationError);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Build time
    /// A required piece of configuration is missing or invalid.
    ConfigurationError,

    // Execution time
    /// A resolver failed while mutating the store.
    StoreOperationError,
    /// Transaction begin/commit/end failed or was called out of order.
    TransactionError,
    /// A unique key or other store constraint was violated.
    ConstraintViolation,
    /// The requested row or table does not exist.
    NotFound,
    /// The store has already been closed.
    StoreClosed,
    /// The operation is not valid in the current state.
    InvalidOperation,

    // Notification
    /// Error in change notification delivery.
    EventError,

    /// Generic IO error.
    IOError,

    /// Error from a store provider crate, tagged with the provider name.
    Extension(String),

    /// Internal error (usually indicates a bug).
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::StoreOperationError => write!(f, "Store operation error"),
            ErrorKind::TransactionError => write!(f, "Transaction error"),
            ErrorKind::ConstraintViolation => write!(f, "Constraint violation"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::StoreClosed => write!(f, "Store closed"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::Extension(name) => write!(f, "{} error", name),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type returned by every fallible storeops call.
///
/// Carries a message, an [`ErrorKind`], an optional cause and the backtrace
/// captured at construction time. The `Debug` output prints the backtrace (or
/// the cause chain), `Display` prints only the message.
///
/// `OpsResult<T>` is shorthand for `Result<T, OpsError>`.
#[derive(Clone)]
pub struct OpsError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<OpsError>>,
    backtrace: Atomic<Backtrace>,
}

impl OpsError {
    /// Creates a new error with the given message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        OpsError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new error wrapping `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: OpsError) -> Self {
        OpsError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&OpsError> {
        self.cause.as_deref()
    }
}

impl Display for OpsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for OpsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for OpsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for storeops operations.
pub type OpsResult<T> = Result<T, OpsError>;

impl From<std::io::Error> for OpsError {
    fn from(err: std::io::Error) -> Self {
        OpsError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<String> for OpsError {
    fn from(msg: String) -> Self {
        OpsError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for OpsError {
    fn from(msg: &str) -> Self {
        OpsError::new(msg, ErrorKind::InternalError)
    }
}
