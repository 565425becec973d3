//! Core types and traits for sqlgate.
//!
//! This crate provides the engine-agnostic half of the system:
//!
//! - [`Driver`] - the capability set every engine adapter implements
//! - [`Db`] - the caller-facing facade with lazy connect and hooks
//! - [`HookRegistry`] - pre/post lifecycle event subscriptions
//! - [`bind`] - named-placeholder escaping and substitution
//! - [`Error`] - the categorized error taxonomy

pub mod bind;
pub mod db;
pub mod driver;
pub mod error;
pub mod hooks;
pub mod row;
pub mod value;

pub use bind::Params;
pub use db::Db;
pub use driver::{ConnectionParams, Driver, ResultHandle, TransactionControl};
pub use error::{Error, ErrorKind, Result};
pub use hooks::{HookId, HookRegistry, Phase};
pub use row::{ColumnInfo, Row};
pub use value::Value;
