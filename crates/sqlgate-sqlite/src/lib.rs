//! SQLite driver for sqlgate.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! Implements the `Driver` contract from sqlgate-core over `libsqlite3-sys`.
//! Statements are executed through the prepare/step interface: queries with
//! result columns hand back a stepping cursor, statements without result
//! columns run to completion inside `query` so `affected()` and `last_id()`
//! observe them immediately.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlgate_core::Db;
//! use sqlgate_sqlite::SqliteDriver;
//!
//! let mut db = Db::new(SqliteDriver::memory());
//! db.all("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! ```

pub mod driver;

pub use driver::SqliteDriver;

use std::ffi::CStr;

/// The version string of the linked SQLite library.
pub fn sqlite_version() -> String {
    // SAFETY: sqlite3_libversion returns a static NUL-terminated string
    unsafe { CStr::from_ptr(libsqlite3_sys::sqlite3_libversion()) }
        .to_string_lossy()
        .into_owned()
}

/// The numeric version of the linked SQLite library.
pub fn sqlite_version_number() -> i32 {
    // SAFETY: no preconditions
    unsafe { libsqlite3_sys::sqlite3_libversion_number() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_library_is_sqlite3() {
        assert!(sqlite_version().starts_with('3'));
        assert!(sqlite_version_number() >= 3_000_000);
    }
}
