//! # LineDB Core
//!
//! An embedded entity database that keeps everything in one flat text file.
//!
//! This crate provides:
//! - The [`Entity`] trait and [`SchemaBuilder`] for describing persistable
//!   types, checked once per type by [`Schema::probe`]
//! - Per-type integer identities ([`EntityId`], [`IdentityManager`])
//! - The in-memory [`EntityStore`]
//! - The record line format ([`record`])
//! - The persistence engine, [`Database`]: save with cascading, shallow
//!   loading of nested entities, full-file flush and autosave
//!
//! ## File format
//!
//! ```text
//! #Apple:2
//! Apple;Id:1;color:GREEN;weight:150
//! Apple;Id:2;color:RED;weight:120
//! #Basket:1
//! Basket;Id:1;apples:Apple,1,2
//! ```
//!
//! ## Non-goals
//!
//! No transactions, no queries or indexes, and no coordination between
//! processes sharing a file.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod encoding;
mod entity;
mod error;
mod identity;
pub mod record;
mod report;
mod stats;

pub use config::{Config, DEFAULT_PATH};
pub use database::{Database, DatabaseState};
pub use encoding::TextEncoding;
pub use entity::{Entity, EntityId, EntityStore, RawRecord, Schema, SchemaBuilder, StoredEntity};
pub use error::{CoreError, CoreResult};
pub use identity::IdentityManager;
pub use report::{ErrorReporter, TracingReporter};
pub use stats::DatabaseStats;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use linedb_codec::{impl_symbol_field, CalendarStamp, FieldValue, Kind, Symbol, Value};
