//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking.

pub mod congresses;
pub mod context;
pub mod diesel_models;
pub mod documents;
pub mod files;
pub mod migrations;
pub mod pool;
pub mod util;

pub use congresses::{CongressRepository, CongressSummary};
pub use context::DbContext;
pub use documents::{CompletenessCount, DocumentFilter, DocumentRepository, StoreError};
pub use files::{status_of, FileRepository, PresenceCount};
pub use pool::{DbError, SqliteConn, SqlitePool};
