use std::path::Path;

use libsql::{Builder, Connection};

use crate::errors::{MentionGraphError, Result};

/// The embedded SQL schema applied when initializing a new database.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// SQLite database holding entries and the mentions between them.
pub struct Database {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: Connection,
}

impl Database {
    /// Creates (or upgrades) a database at `db_path`, creating parent
    /// directories if needed, and applies the schema.
    pub async fn initialize(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MentionGraphError::Database {
                message: format!("failed to create database directory: {e}"),
                operation: "initialize".to_string(),
            })?;
        }

        let database = Self::connect(db_path, "initialize").await?;
        database.apply_schema("initialize").await?;
        Ok(database)
    }

    /// Opens an existing database at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(MentionGraphError::Database {
                message: format!("no database found at '{}'", db_path.display()),
                operation: "open".to_string(),
            });
        }
        Self::connect(db_path, "open").await
    }

    /// Opens a private in-memory database with the schema applied.
    pub async fn open_in_memory() -> Result<Self> {
        let database = Self::connect(Path::new(":memory:"), "open_in_memory").await?;
        database.apply_schema("open_in_memory").await?;
        Ok(database)
    }

    /// Returns a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn connect(db_path: &Path, operation: &str) -> Result<Self> {
        let db = Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| MentionGraphError::Database {
                message: format!("failed to open database: {e}"),
                operation: operation.to_string(),
            })?;

        let conn = db.connect().map_err(|e| MentionGraphError::Database {
            message: format!("failed to connect: {e}"),
            operation: operation.to_string(),
        })?;

        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| MentionGraphError::Database {
                message: format!("failed to apply pragmas: {e}"),
                operation: operation.to_string(),
            })?;

        Ok(Self { db, conn })
    }

    async fn apply_schema(&self, operation: &str) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .await
            .map_err(|e| MentionGraphError::Database {
                message: format!("failed to apply schema: {e}"),
                operation: operation.to_string(),
            })?;
        Ok(())
    }
}
