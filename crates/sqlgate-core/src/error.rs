//! Error types for sqlgate operations.

use std::fmt;

/// Machine-readable error category.
///
/// Callers branch on the category to decide whether a failure is worth
/// retrying (a transient `Connection`) or fatal (`Internal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Cannot establish or use a connection handle
    Connection,
    /// A statement failed to execute; message sourced from the engine
    Sql,
    /// Operating on an invalid/exhausted/freed result handle, or a fetch failure
    Resource,
    /// Programmer error: foreign native handle, missing capability
    Internal,
}

impl ErrorKind {
    /// The wire-stable tag for this category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection_error",
            ErrorKind::Sql => "sql_error",
            ErrorKind::Resource => "resource_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type produced by the facade and drivers.
///
/// Carries a category tag plus the engine's own error text where one was
/// available. The facade never swallows an engine failure and never retries;
/// every failure surfaces synchronously as one of the four categories.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Create an error with an explicit category.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A `connection_error`.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// A `sql_error`.
    pub fn sql(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Sql, message)
    }

    /// A `resource_error`.
    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    /// An `internal_error`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// The error category.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for Error {}

/// Result type alias for sqlgate operations.
pub type Result<T> = std::result::Result<T, Error>;
