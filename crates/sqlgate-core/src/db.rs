//! The caller-facing database facade.
//!
//! [`Db`] wraps exactly one [`Driver`] and coordinates lazy connection
//! opening, lifecycle hooks and delegation. The connection opens on the
//! first operation that touches it, not at construction; dropping the
//! facade closes the connection if it is still open.
//!
//! The model is single-threaded and blocking: every operation runs on the
//! calling thread until the engine call returns. Use one facade (and one
//! connection) per worker; never share one across threads.

use crate::bind::{self, Params};
use crate::driver::{Driver, ResultHandle};
use crate::error::{Error, Result};
use crate::hooks::{HookId, HookRegistry, Phase};
use crate::row::Row;
use crate::value::Value;

/// Engine-agnostic database access facade.
pub struct Db {
    driver: Box<dyn Driver>,
    hooks: HookRegistry,
}

impl Db {
    /// Create a facade around a driver. Does not connect; the connection
    /// opens lazily on first use.
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::from_boxed(Box::new(driver))
    }

    /// Create a facade around an already-boxed driver.
    pub fn from_boxed(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            hooks: HookRegistry::new(),
        }
    }

    /// Borrow the underlying driver, for engine-specific accessors such as
    /// the native connection handle.
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Mutably borrow the underlying driver.
    pub fn driver_mut(&mut self) -> &mut dyn Driver {
        self.driver.as_mut()
    }

    /// Open the connection if it is not already open, firing
    /// `pre_open`/`post_open` hooks around the delegation.
    pub fn open(&mut self) -> Result<()> {
        if !self.driver.is_open() {
            tracing::debug!("opening database connection");
            self.hooks.trigger(Phase::Pre, "open", None)?;
            self.driver.open()?;
            self.hooks.trigger(Phase::Post, "open", None)?;
        }
        Ok(())
    }

    /// Close the connection if open, firing `pre_close`/`post_close`.
    /// Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.driver.is_open() {
            tracing::debug!("closing database connection");
            self.hooks.trigger(Phase::Pre, "close", None)?;
            self.driver.close();
            self.hooks.trigger(Phase::Post, "close", None)?;
        }
        Ok(())
    }

    /// Escape a string through the engine. Opens the connection lazily,
    /// since some engines escape relative to connection state.
    pub fn escape(&mut self, raw: &str) -> Result<String> {
        self.open()?;
        self.driver.escape(raw)
    }

    /// Execute a statement.
    ///
    /// Opens the connection lazily, fires `pre_query` hooks with the SQL
    /// text, and delegates. A falsy driver result becomes a `sql_error`
    /// carrying the engine's last error message; `post_query` fires only
    /// on success.
    pub fn query(&mut self, sql: &str) -> Result<ResultHandle> {
        self.open()?;
        tracing::debug!(sql = %sql, "executing query");
        self.hooks.trigger(Phase::Pre, "query", Some(sql))?;
        match self.driver.query(sql) {
            Some(res) => {
                self.hooks.trigger(Phase::Post, "query", Some(sql))?;
                Ok(res)
            }
            None => Err(Error::sql(self.driver.error())),
        }
    }

    /// Fetch one row from a result. `Ok(None)` means the cursor is
    /// exhausted. Any underlying failure is re-raised as a `resource_error`.
    pub fn fetch(&mut self, res: &mut ResultHandle) -> Result<Option<Row>> {
        self.driver
            .fetch(res)
            .map_err(|e| Error::resource(e.message().to_string()))
    }

    /// Fetch all remaining rows, in fetch order.
    pub fn fetch_all(&mut self, res: &mut ResultHandle) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch(res)? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a statement and fetch every row. The cursor is freed before
    /// returning.
    pub fn all(&mut self, sql: &str) -> Result<Vec<Row>> {
        let mut res = self.query(sql)?;
        let rows = self.fetch_all(&mut res);
        self.driver.free(res);
        rows
    }

    /// Execute a statement and return only the first row, or `None` if it
    /// produced no rows. The cursor is freed before returning.
    pub fn single(&mut self, sql: &str) -> Result<Option<Row>> {
        let mut res = self.query(sql)?;
        let row = self.fetch(&mut res);
        self.driver.free(res);
        row
    }

    /// Execute a statement and return the first column of the first row,
    /// or `None` if it produced no rows.
    pub fn single_field(&mut self, sql: &str) -> Result<Option<Value>> {
        Ok(self
            .single(sql)?
            .and_then(|row| row.into_values().next()))
    }

    /// Rows affected by the most recent mutating statement.
    pub fn affected(&mut self, res: Option<&ResultHandle>) -> i64 {
        self.driver.affected(res)
    }

    /// Most recent auto-generated identifier.
    pub fn last_id(&mut self) -> Value {
        self.driver.last_id()
    }

    /// Free a result cursor. Passing `None` (an invalid handle) fails with
    /// a `resource_error`.
    pub fn free(&mut self, res: Option<ResultHandle>) -> Result<()> {
        match res {
            Some(res) => {
                self.driver.free(res);
                Ok(())
            }
            None => Err(Error::resource("could not free invalid result handle")),
        }
    }

    /// Escape every parameter value for literal inclusion in SQL.
    ///
    /// NULL becomes `null`, numbers pass through unquoted, booleans become
    /// `TRUE`/`FALSE`, text is engine-escaped and single-quoted. Order and
    /// key set are preserved.
    pub fn escape_all(&mut self, params: &Params) -> Result<Vec<(String, String)>> {
        let mut rendered = Vec::with_capacity(params.len());
        for (name, value) in params.iter() {
            let mut escape = |raw: &str| self.escape(raw);
            rendered.push((name.to_string(), bind::render_value(value, &mut escape)?));
        }
        Ok(rendered)
    }

    /// Escape all parameters and substitute their `:name` placeholders in
    /// `sql`. Placeholders with no matching parameter become the literal
    /// `null` when `null_missing`, otherwise stay verbatim.
    pub fn bind_params(&mut self, sql: &str, params: &Params, null_missing: bool) -> Result<String> {
        let rendered = self.escape_all(params)?;
        Ok(bind::substitute(sql, &rendered, null_missing))
    }

    /// Register a callback under a lifecycle event (`"pre_query"`,
    /// `"post_open"`, ...). Returns the subscription handle used to unhook.
    pub fn hook(
        &mut self,
        event: &str,
        callback: impl FnMut(&str, Option<&str>) -> Result<()> + 'static,
    ) -> HookId {
        self.hooks.hook(event, callback)
    }

    /// Remove one hook registration. No-op if absent.
    pub fn unhook(&mut self, id: HookId) {
        self.hooks.unhook(id);
    }

    /// Remove every callback under one event. No-op if absent.
    pub fn unhook_event(&mut self, event: &str) {
        self.hooks.unhook_event(event);
    }

    /// Remove all hooks.
    pub fn unhook_all(&mut self) {
        self.hooks.unhook_all();
    }

    /// Start a transaction through the driver's transaction capability.
    pub fn begin(&mut self) -> Result<()> {
        self.open()?;
        self.transaction_control()?.begin()
    }

    /// Commit the current transaction.
    pub fn commit(&mut self) -> Result<()> {
        self.transaction_control()?.commit()
    }

    /// Roll back the current transaction.
    pub fn rollback(&mut self) -> Result<()> {
        self.transaction_control()?.rollback()
    }

    fn transaction_control(&mut self) -> Result<&mut dyn crate::driver::TransactionControl> {
        self.driver
            .transaction()
            .ok_or_else(|| Error::internal("driver does not support transaction control"))
    }
}

impl Drop for Db {
    fn drop(&mut self) {
        // Deterministic release; hook failures cannot propagate out of drop.
        let _ = self.close();
    }
}
