#![forbid(unsafe_code)]

//! Errors surfaced by the raw proxy constructor.
//!
//! Everything else in this crate degrades to a logged no-op.

/// Errors from [`ObservedObject::new`](crate::ObservedObject::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedError {
    /// The object is already wrapped by a live proxy.
    InvariantViolation(String),
    /// The value is `Null` or a primitive and cannot be proxied.
    NotAnObject { kind: &'static str },
}

impl std::fmt::Display for ObservedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            Self::NotAnObject { kind } => write!(f, "cannot observe a {kind} value"),
        }
    }
}

impl std::error::Error for ObservedError {}
