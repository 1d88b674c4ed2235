//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection pool and provides access to all repositories.

use std::path::Path;

use super::congresses::CongressRepository;
use super::documents::DocumentRepository;
use super::files::FileRepository;
use super::migrations::run_migrations;
use super::pool::{DbError, SqlitePool};

/// Database context that manages the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::new(&settings.database_path());
/// ctx.init_schema().await?;
/// let status = ctx.files().file_status(&id, FileFormat::Txt).await?;
/// ```
#[derive(Clone, Debug)]
pub struct DbContext {
    pool: SqlitePool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
        }
    }

    /// Get a file acquisition repository.
    pub fn files(&self) -> FileRepository {
        FileRepository::new(self.pool.clone())
    }

    /// Get a document repository.
    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.pool.clone())
    }

    /// Get a congress repository.
    pub fn congresses(&self) -> CongressRepository {
        CongressRepository::new(self.pool.clone())
    }

    /// Apply pending migrations. Returns the names applied.
    pub async fn init_schema(&self) -> Result<Vec<String>, DbError> {
        run_migrations(self.pool.database_url()).await
    }
}
