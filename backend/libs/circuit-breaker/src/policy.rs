//! Failure classification
//!
//! Decides whether a failed call should count against a breaker. Caller
//! mistakes (validation errors, 4xx responses) say nothing about the health of
//! the dependency, so a breaker protecting a payment gateway should not trip
//! because users keep typing invalid card numbers.
//!
//! Any `Display + 'static` error can be classified. Well-known error types are
//! recognized by downcasting; everything else is [`ErrorClass::Unclassified`]
//! unless a [`FailurePolicy::Custom`] predicate says otherwise.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Who is to blame for a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself was bad (4xx, validation)
    Caller,
    /// The dependency misbehaved (5xx, I/O, timeouts)
    Dependency,
    /// No information either way
    Unclassified,
}

/// Borrowed view of a failed call's error, handed to failure policies
pub struct Failure<'a> {
    error: &'a dyn Any,
    message: &'a dyn fmt::Display,
}

impl<'a> Failure<'a> {
    pub fn new<E: fmt::Display + 'static>(error: &'a E) -> Self {
        Self {
            error,
            message: error,
        }
    }

    /// The concrete error, if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        let error: &'a dyn Any = self.error;
        error.downcast_ref::<T>()
    }

    pub fn error_class(&self) -> ErrorClass {
        classify(self.error)
    }
}

impl fmt::Display for Failure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl fmt::Debug for Failure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("message", &self.message.to_string())
            .field("class", &self.error_class())
            .finish()
    }
}

fn classify(error: &dyn Any) -> ErrorClass {
    if let Some(status) = error.downcast_ref::<http::StatusCode>() {
        return classify_status(*status);
    }
    if error.is::<std::io::Error>() || error.is::<tokio::time::error::Elapsed>() {
        return ErrorClass::Dependency;
    }
    if let Some(boxed) = error.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
        if boxed.is::<std::io::Error>() || boxed.is::<tokio::time::error::Elapsed>() {
            return ErrorClass::Dependency;
        }
    }
    ErrorClass::Unclassified
}

fn classify_status(status: http::StatusCode) -> ErrorClass {
    if status.is_client_error() {
        ErrorClass::Caller
    } else if status.is_server_error() {
        ErrorClass::Dependency
    } else {
        ErrorClass::Unclassified
    }
}

type Predicate = dyn Fn(&Failure<'_>) -> bool + Send + Sync;

/// Strategy deciding which failures count toward the failure threshold
#[derive(Clone, Default)]
pub enum FailurePolicy {
    /// Every failure counts
    #[default]
    AlwaysCount,
    /// Everything except caller errors counts
    ServerErrorsOnly,
    /// User supplied predicate
    Custom(Arc<Predicate>),
}

impl FailurePolicy {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Failure<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Returns true when `error` should move the state machine
    pub fn should_count<E: fmt::Display + 'static>(&self, error: &E) -> bool {
        self.should_count_failure(&Failure::new(error))
    }

    pub fn should_count_failure(&self, failure: &Failure<'_>) -> bool {
        match self {
            Self::AlwaysCount => true,
            Self::ServerErrorsOnly => failure.error_class() != ErrorClass::Caller,
            Self::Custom(predicate) => predicate(failure),
        }
    }
}

impl fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysCount => f.write_str("AlwaysCount"),
            Self::ServerErrorsOnly => f.write_str("ServerErrorsOnly"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
