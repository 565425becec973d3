//! The driver contract every engine adapter implements.
//!
//! The facade depends only on [`Driver`]; engine-specific types stay behind
//! opaque handles. A driver owns at most one live connection handle at a
//! time and `open` is idempotent once a handle exists.

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;
use std::any::Any;

/// Connection parameters consumed by engine adapters.
///
/// Absent keys fall back to the engine's defaults. Engine-specific keys
/// (e.g. `dsn`) go through `extra`.
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    /// Server host name or address
    pub host: Option<String>,
    /// Server port
    pub port: Option<u16>,
    /// User name
    pub user: Option<String>,
    /// Password
    pub pass: Option<String>,
    /// Database name, or file path for embedded engines
    pub database: Option<String>,
    /// Engine-specific keys, in insertion order
    pub extra: Vec<(String, String)>,
}

impl ConnectionParams {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the user name.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the password.
    pub fn pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }

    /// Set the database name (or file path for embedded engines).
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set an engine-specific key.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Look up an engine-specific key.
    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An opaque engine-native cursor returned by a successful `query`.
///
/// Owned by the caller until freed. `free` consumes the handle, so a freed
/// cursor can never be fetched from again; handing a handle to a driver of
/// a different engine fails with a `resource_error`.
pub struct ResultHandle(Box<dyn Any>);

impl ResultHandle {
    /// Wrap an engine-native cursor.
    pub fn new<T: Any>(cursor: T) -> Self {
        Self(Box::new(cursor))
    }

    /// Borrow the native cursor, if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Mutably borrow the native cursor, if it is of type `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }

    /// Unwrap the native cursor, if it is of type `T`.
    pub fn into_inner<T: Any>(self) -> Option<T> {
        self.0.downcast().ok().map(|b| *b)
    }
}

impl std::fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResultHandle")
    }
}

/// Optional transaction capability an engine adapter may expose.
///
/// Resolved through [`Driver::transaction`]; the facade reports an
/// `internal_error` when a driver does not provide it.
pub trait TransactionControl {
    /// Start a transaction.
    fn begin(&mut self) -> Result<()>;

    /// Commit the current transaction.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> Result<()>;
}

/// The capability set every engine adapter implements.
///
/// Failures inside `query` are signalled with `None` (the engine's falsy
/// sentinel), with the reason retrievable via [`Driver::error`]. All other
/// fallible operations return [`Result`] with an already-categorized error.
pub trait Driver {
    /// Establish the connection handle using the previously supplied
    /// parameters (or a pre-supplied native handle). No-op if a handle
    /// already exists.
    fn open(&mut self) -> Result<()>;

    /// Release the connection handle if present. Idempotent.
    fn close(&mut self);

    /// Whether a live connection handle exists.
    fn is_open(&self) -> bool;

    /// Escape a string for literal inclusion in a statement, without the
    /// surrounding quotes. May require an open connection on some engines.
    fn escape(&mut self, raw: &str) -> Result<String>;

    /// Execute a statement. `None` signals failure; the reason is
    /// retrievable via [`Driver::error`].
    fn query(&mut self, sql: &str) -> Option<ResultHandle>;

    /// Advance the cursor one row. `Ok(None)` is terminal.
    fn fetch(&mut self, res: &mut ResultHandle) -> Result<Option<Row>>;

    /// Rows affected by the most recent mutating statement.
    fn affected(&mut self, res: Option<&ResultHandle>) -> i64;

    /// Most recent auto-generated identifier.
    fn last_id(&mut self) -> Value;

    /// Release cursor resources.
    fn free(&mut self, res: ResultHandle);

    /// Last error message for the connection.
    fn error(&self) -> String;

    /// Borrow the native connection handle, if one exists.
    fn handle(&self) -> Option<&dyn Any>;

    /// Replace the native connection handle. Fails with an
    /// `internal_error` if the value is not of the engine's handle type.
    fn set_handle(&mut self, handle: Box<dyn Any>) -> Result<()>;

    /// Query the optional transaction capability.
    fn transaction(&mut self) -> Option<&mut dyn TransactionControl> {
        None
    }
}
