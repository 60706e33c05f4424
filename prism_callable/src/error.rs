//! Call errors.
//!
//! Every fallible operation of the callable layer returns [`CallResult`].
//! Errors carry enough context to render a CPython-compatible message and
//! are classified by [`ErrorKind`] for the exception machinery of the host.

use crate::types::function::binding::BindingError;
use std::sync::Arc;
use thiserror::Error;

/// Exception class an error maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TypeError,
    AttributeError,
    SystemError,
    RecursionError,
    /// Raised by the body of the invoked callable.
    Raised,
}

impl ErrorKind {
    /// Exception class name.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::SystemError => "SystemError",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::Raised => "Exception",
        }
    }
}

/// Errors during calls, binding and attribute access on callables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// Unbound call of a method that needs a receiver, with no arguments.
    #[error("descriptor '{name}' of '{owner}' object needs an argument")]
    MissingSelf { name: Arc<str>, owner: Arc<str> },

    /// Receiver is not an instance of the declared owner class.
    #[error("descriptor '{name}' for '{owner}' objects doesn't apply to a '{actual}' object")]
    WrongSelfType {
        name: Arc<str>,
        owner: Arc<str>,
        actual: Arc<str>,
    },

    #[error("{name}() takes no arguments ({given} given)")]
    TakesNoArguments { name: Arc<str>, given: usize },

    #[error("{name}() takes exactly one argument ({given} given)")]
    TakesOneArgument { name: Arc<str>, given: usize },

    #[error("{name}() takes no keyword arguments")]
    NoKeywordArguments { name: Arc<str> },

    #[error("'{type_name}' object is not callable")]
    NotCallable { type_name: Arc<str> },

    /// Argument binding for a host-language function failed.
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("{message}")]
    TypeError { message: String },

    #[error("'{type_name}' object has no attribute '{attr}'")]
    NoAttribute { type_name: Arc<str>, attr: Arc<str> },

    #[error("readonly attribute '{attr}'")]
    ReadOnlyAttribute { attr: Arc<str> },

    /// The dispatch-table entry has a flag combination with no calling convention.
    #[error("{name}() method: bad call flags {flags:#x}")]
    BadCallFlags { name: Arc<str>, flags: u32 },

    /// A dispatch-table entry cannot be materialized in this context.
    #[error("method '{name}': {reason}")]
    InvalidMethodDef { name: Arc<str>, reason: &'static str },

    #[error("maximum recursion depth exceeded while calling '{name}' (limit {limit})")]
    RecursionLimit { name: Arc<str>, limit: u32 },

    /// Error raised by the callee itself.
    #[error("{kind}: {message}")]
    Raised { kind: Arc<str>, message: String },
}

impl CallError {
    /// Build a free-form `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        CallError::TypeError {
            message: message.into(),
        }
    }

    /// Build an error raised by callee code.
    pub fn raised(kind: &str, message: impl Into<String>) -> Self {
        CallError::Raised {
            kind: Arc::from(kind),
            message: message.into(),
        }
    }

    /// Exception class this error surfaces as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::MissingSelf { .. }
            | CallError::WrongSelfType { .. }
            | CallError::TakesNoArguments { .. }
            | CallError::TakesOneArgument { .. }
            | CallError::NoKeywordArguments { .. }
            | CallError::NotCallable { .. }
            | CallError::Binding(_)
            | CallError::TypeError { .. } => ErrorKind::TypeError,
            CallError::NoAttribute { .. } | CallError::ReadOnlyAttribute { .. } => {
                ErrorKind::AttributeError
            }
            CallError::BadCallFlags { .. } | CallError::InvalidMethodDef { .. } => {
                ErrorKind::SystemError
            }
            CallError::RecursionLimit { .. } => ErrorKind::RecursionError,
            CallError::Raised { .. } => ErrorKind::Raised,
        }
    }

    #[inline]
    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::TypeError
    }
}

/// Result type for call operations.
pub type CallResult<T> = Result<T, CallError>;
