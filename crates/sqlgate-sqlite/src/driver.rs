//! SQLite implementation of the driver contract.

// Allow casts in FFI code where we need to match C types exactly
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]

use libsqlite3_sys as ffi;
use sqlgate_core::driver::{ConnectionParams, Driver, ResultHandle, TransactionControl};
use sqlgate_core::error::{Error, Result};
use sqlgate_core::row::{ColumnInfo, Row};
use sqlgate_core::value::Value;
use std::any::Any;
use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;
use std::sync::Arc;

/// A driver over one SQLite connection.
///
/// The `database` connection parameter is the file path, or `":memory:"`
/// for an in-memory database. The driver can also adopt a pre-opened
/// native `sqlite3` handle.
pub struct SqliteDriver {
    db: *mut ffi::sqlite3,
    params: ConnectionParams,
    /// Error text for failures that happen before a handle exists
    last_error: String,
}

/// Cursor state for one prepared statement.
///
/// Statements without result columns are finalized inside `query`; their
/// cursor carries a null statement and is already terminal.
struct SqliteCursor {
    stmt: *mut ffi::sqlite3_stmt,
    columns: Arc<ColumnInfo>,
    done: bool,
}

impl Drop for SqliteCursor {
    fn drop(&mut self) {
        if !self.stmt.is_null() {
            // SAFETY: stmt came from sqlite3_prepare_v2 and is finalized once
            unsafe { ffi::sqlite3_finalize(self.stmt) };
            self.stmt = ptr::null_mut();
        }
    }
}

/// # Safety
/// `ptr` must be null or point to a valid NUL-terminated C string.
unsafe fn cstr_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: caller guarantees a valid NUL-terminated string
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// # Safety
/// `stmt` must be a valid statement positioned on a row, with `index` in
/// range.
unsafe fn column_value(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Value {
    // SAFETY: caller guarantees stmt is on a row and index is in range
    unsafe {
        match ffi::sqlite3_column_type(stmt, index) {
            ffi::SQLITE_INTEGER => Value::Int(ffi::sqlite3_column_int64(stmt, index)),
            ffi::SQLITE_FLOAT => Value::Double(ffi::sqlite3_column_double(stmt, index)),
            ffi::SQLITE_TEXT => {
                let text = ffi::sqlite3_column_text(stmt, index);
                if text.is_null() {
                    Value::Null
                } else {
                    Value::Text(cstr_to_string(text.cast()))
                }
            }
            ffi::SQLITE_BLOB => {
                let len = ffi::sqlite3_column_bytes(stmt, index);
                if len <= 0 {
                    Value::Bytes(Vec::new())
                } else {
                    let data = ffi::sqlite3_column_blob(stmt, index);
                    Value::Bytes(std::slice::from_raw_parts(data.cast::<u8>(), len as usize).to_vec())
                }
            }
            _ => Value::Null,
        }
    }
}

impl SqliteDriver {
    /// Create a driver from connection parameters. Only `database` is
    /// consulted; it is required at `open` time.
    pub fn new(params: ConnectionParams) -> Self {
        Self {
            db: ptr::null_mut(),
            params,
            last_error: String::new(),
        }
    }

    /// Create a driver for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(ConnectionParams::new().database(path))
    }

    /// Create a driver for an in-memory database.
    pub fn memory() -> Self {
        Self::file(":memory:")
    }

    /// Adopt a pre-opened native handle. The driver takes ownership and
    /// closes it when dropped.
    ///
    /// # Safety
    /// `db` must be a valid `sqlite3` connection not owned elsewhere.
    pub unsafe fn from_handle(db: *mut ffi::sqlite3) -> Self {
        Self {
            db,
            params: ConnectionParams::new(),
            last_error: String::new(),
        }
    }

    fn exec_simple(&mut self, sql: &str) -> Result<()> {
        if self.db.is_null() {
            return Err(Error::connection("connection is not open"));
        }
        let c_sql =
            CString::new(sql).map_err(|_| Error::sql("statement contains a nul byte"))?;
        // SAFETY: db is a valid open connection, c_sql is NUL-terminated
        let rc = unsafe {
            ffi::sqlite3_exec(self.db, c_sql.as_ptr(), None, ptr::null_mut(), ptr::null_mut())
        };
        if rc != ffi::SQLITE_OK {
            return Err(Error::sql(self.error()));
        }
        Ok(())
    }
}

impl Driver for SqliteDriver {
    fn open(&mut self) -> Result<()> {
        if !self.db.is_null() {
            return Ok(());
        }

        let path = match self.params.database.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => return Err(Error::internal("database parameter is missing")),
        };

        let c_path = CString::new(path)
            .map_err(|_| Error::connection("database path contains a nul byte"))?;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;

        // SAFETY: we pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };
        if rc != ffi::SQLITE_OK {
            let message = if db.is_null() {
                format!("failed to open database (code {rc})")
            } else {
                // SAFETY: db is valid even after a failed open; close it here
                unsafe {
                    let message = cstr_to_string(ffi::sqlite3_errmsg(db));
                    ffi::sqlite3_close(db);
                    message
                }
            };
            self.last_error = message.clone();
            return Err(Error::connection(message));
        }

        self.db = db;
        Ok(())
    }

    fn close(&mut self) {
        if !self.db.is_null() {
            // SAFETY: db is a valid open connection, closed exactly once
            unsafe { ffi::sqlite3_close(self.db) };
            self.db = ptr::null_mut();
        }
    }

    fn is_open(&self) -> bool {
        !self.db.is_null()
    }

    fn escape(&mut self, raw: &str) -> Result<String> {
        // SQLite's quoting convention: double every single quote
        Ok(raw.replace('\'', "''"))
    }

    fn query(&mut self, sql: &str) -> Option<ResultHandle> {
        if self.db.is_null() {
            self.last_error = "connection is not open".to_string();
            return None;
        }
        let c_sql = match CString::new(sql) {
            Ok(c_sql) => c_sql,
            Err(_) => {
                self.last_error = "statement contains a nul byte".to_string();
                return None;
            }
        };

        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        // SAFETY: db is open, c_sql is NUL-terminated, stmt receives the result
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(self.db, c_sql.as_ptr(), -1, &mut stmt, ptr::null_mut())
        };
        if rc != ffi::SQLITE_OK {
            return None;
        }

        // SAFETY: stmt is a valid prepared statement
        let count = unsafe { ffi::sqlite3_column_count(stmt) };
        if count == 0 {
            // No result columns: run to completion so affected()/last_id()
            // observe the statement, then hand back a terminal cursor.
            loop {
                // SAFETY: stmt is valid until finalized below
                let rc = unsafe { ffi::sqlite3_step(stmt) };
                if rc == ffi::SQLITE_DONE {
                    break;
                }
                if rc != ffi::SQLITE_ROW {
                    // SAFETY: finalize exactly once on the failure path
                    unsafe { ffi::sqlite3_finalize(stmt) };
                    return None;
                }
            }
            // SAFETY: finalize exactly once on the success path
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Some(ResultHandle::new(SqliteCursor {
                stmt: ptr::null_mut(),
                columns: Arc::new(ColumnInfo::new(Vec::new())),
                done: true,
            }));
        }

        let names = (0..count)
            // SAFETY: stmt is valid and i is within the column count
            .map(|i| unsafe { cstr_to_string(ffi::sqlite3_column_name(stmt, i)) })
            .collect();
        Some(ResultHandle::new(SqliteCursor {
            stmt,
            columns: Arc::new(ColumnInfo::new(names)),
            done: false,
        }))
    }

    fn fetch(&mut self, res: &mut ResultHandle) -> Result<Option<Row>> {
        let cursor = res
            .downcast_mut::<SqliteCursor>()
            .ok_or_else(|| Error::resource("result handle does not belong to the sqlite driver"))?;
        if cursor.done || cursor.stmt.is_null() {
            return Ok(None);
        }

        // SAFETY: cursor.stmt is a valid, non-finalized statement
        match unsafe { ffi::sqlite3_step(cursor.stmt) } {
            ffi::SQLITE_ROW => {
                let mut values = Vec::with_capacity(cursor.columns.len());
                for i in 0..cursor.columns.len() {
                    // SAFETY: stmt is positioned on a row, i is in range
                    values.push(unsafe { column_value(cursor.stmt, i as c_int) });
                }
                Ok(Some(Row::with_columns(Arc::clone(&cursor.columns), values)))
            }
            ffi::SQLITE_DONE => {
                cursor.done = true;
                Ok(None)
            }
            _ => {
                cursor.done = true;
                Err(Error::resource(self.error()))
            }
        }
    }

    fn affected(&mut self, _res: Option<&ResultHandle>) -> i64 {
        if self.db.is_null() {
            return 0;
        }
        // SAFETY: db is a valid open connection
        i64::from(unsafe { ffi::sqlite3_changes(self.db) })
    }

    fn last_id(&mut self) -> Value {
        if self.db.is_null() {
            return Value::Null;
        }
        // SAFETY: db is a valid open connection
        Value::Int(unsafe { ffi::sqlite3_last_insert_rowid(self.db) })
    }

    fn free(&mut self, res: ResultHandle) {
        // The cursor finalizes its statement on drop; a foreign handle is
        // simply dropped.
        drop(res.into_inner::<SqliteCursor>());
    }

    fn error(&self) -> String {
        if self.db.is_null() {
            return self.last_error.clone();
        }
        // SAFETY: db is a valid open connection
        unsafe { cstr_to_string(ffi::sqlite3_errmsg(self.db)) }
    }

    fn handle(&self) -> Option<&dyn Any> {
        if self.db.is_null() {
            None
        } else {
            Some(&self.db as &dyn Any)
        }
    }

    fn set_handle(&mut self, handle: Box<dyn Any>) -> Result<()> {
        match handle.downcast::<*mut ffi::sqlite3>() {
            Ok(db) => {
                self.close();
                self.db = *db;
                Ok(())
            }
            Err(_) => Err(Error::internal("handle is not a sqlite3 connection")),
        }
    }

    fn transaction(&mut self) -> Option<&mut dyn TransactionControl> {
        Some(self)
    }
}

impl TransactionControl for SqliteDriver {
    fn begin(&mut self) -> Result<()> {
        self.exec_simple("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.exec_simple("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.exec_simple("ROLLBACK")
    }
}

impl Drop for SqliteDriver {
    fn drop(&mut self) {
        self.close();
    }
}
