//! sqlgate - a uniform data-access facade.
//!
//! Application code issues queries and manages connections through [`Db`]
//! without depending on which engine backs them. Engine adapters implement
//! the [`Driver`] contract; this crate re-exports the core together with
//! the SQLite adapter.
//!
//! ```rust
//! use sqlgate::{Db, Params, SqliteDriver, Value};
//!
//! # fn main() -> sqlgate::Result<()> {
//! let mut db = Db::new(SqliteDriver::memory());
//! db.all("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let sql = db.bind_params(
//!     "INSERT INTO users (name) VALUES (:name)",
//!     &Params::new().set("name", "Alice"),
//!     true,
//! )?;
//! db.all(&sql)?;
//!
//! assert_eq!(db.last_id(), Value::Int(1));
//! # Ok(())
//! # }
//! ```

pub use sqlgate_core::{
    ColumnInfo, ConnectionParams, Db, Driver, Error, ErrorKind, HookId, HookRegistry, Params,
    Phase, Result, ResultHandle, Row, TransactionControl, Value,
};
pub use sqlgate_sqlite::SqliteDriver;
