//! SQLite member store - persistent storage using SQLite
//!
//! Features:
//! - Persistent storage across sessions
//! - `AUTOINCREMENT` ids, so an id is never handed out twice
//! - Automatic schema migration
//! - Async-friendly: each operation runs on the blocking pool with its own
//!   connection

use async_trait::async_trait;
use roster_core::{Member, MemberDraft, MemberId, StorageConfig};
use rusqlite::{OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::trait_::{MemberStore, Result, StoreError};

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

const MEMBER_COLUMNS: &str = "id, name, email, profession, about, image";

/// SQLite member store
#[derive(Debug, Clone)]
pub struct SqliteMemberStore {
    /// Database file path
    path: PathBuf,
    /// How long a connection waits for the write lock
    busy_timeout: Duration,
}

impl SqliteMemberStore {
    /// Open (or create) a store at `path` with default settings
    pub async fn new(path: PathBuf) -> Result<Self> {
        Self::open(&StorageConfig::sqlite(path)).await
    }

    /// Open (or create) the store described by `config`
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let path = config.db_path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let store = Self {
            path,
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        };

        let wal = config.wal;
        store
            .run(move |conn| {
                if wal {
                    let mode: String =
                        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                    debug!("SQLite journal mode: {}", mode);
                }
                Self::init_schema(conn)
            })
            .await?;

        info!("SQLite member store initialized at: {:?}", store.path);
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(conn: &rusqlite::Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                profession TEXT NOT NULL,
                about TEXT NOT NULL,
                image BLOB NOT NULL
            )
            "#,
            [],
        )
        .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against a fresh connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;

        let result = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&path)?;
            conn.busy_timeout(busy_timeout)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))
        .and_then(|r| r);

        if let Err(e) = &result {
            warn!("SQLite member store {:?}: {}", self.path, e);
        }
        result
    }
}

fn member_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: MemberId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        profession: row.get(3)?,
        about: row.get(4)?,
        image: row.get(5)?,
    })
}

fn count_to_u64(count: i64) -> Result<u64> {
    u64::try_from(count).map_err(|e| StoreError::InvalidData(e.to_string()))
}

#[async_trait]
impl MemberStore for SqliteMemberStore {
    async fn list_all(&self) -> Result<Vec<Member>> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY id ASC"))?;
            let rows = stmt.query_map([], member_from_row)?;

            let mut members = Vec::new();
            for member in rows {
                members.push(member?);
            }
            Ok(members)
        })
        .await
    }

    async fn get(&self, id: MemberId) -> Result<Option<Member>> {
        self.run(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"))?;
            Ok(stmt.query_row([id.0], member_from_row).optional()?)
        })
        .await
    }

    async fn create(&self, draft: MemberDraft) -> Result<Member> {
        self.run(move |conn| {
            conn.execute(
                r#"
                INSERT INTO members (name, email, profession, about, image)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![draft.name, draft.email, draft.profession, draft.about, draft.image],
            )?;
            // Rowid of this connection's own insert
            let id = MemberId(conn.last_insert_rowid());
            debug!("Created member {}", id);
            Ok(Member::from_draft(id, draft))
        })
        .await
    }

    async fn update(&self, id: MemberId, draft: MemberDraft) -> Result<Option<Member>> {
        self.run(move |conn| {
            let changed = conn.execute(
                r#"
                UPDATE members
                SET name = ?2, email = ?3, profession = ?4, about = ?5, image = ?6
                WHERE id = ?1
                "#,
                params![id.0, draft.name, draft.email, draft.profession, draft.about, draft.image],
            )?;
            if changed == 0 {
                debug!("Update skipped, member {} not found", id);
                return Ok(None);
            }
            debug!("Updated member {}", id);
            Ok(Some(Member::from_draft(id, draft)))
        })
        .await
    }

    async fn delete(&self, id: MemberId) -> Result<bool> {
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM members WHERE id = ?1", [id.0])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_all(&self) -> Result<u64> {
        self.run(|conn| {
            let removed = conn.execute("DELETE FROM members", [])?;
            debug!("Deleted {} members", removed);
            Ok(removed as u64)
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
            count_to_u64(count)
        })
        .await
    }

    async fn max_id(&self) -> Result<Option<MemberId>> {
        self.run(|conn| {
            let max: Option<i64> =
                conn.query_row("SELECT MAX(id) FROM members", [], |row| row.get(0))?;
            Ok(max.map(MemberId))
        })
        .await
    }
}

/// Create a new shared SQLite member store
pub async fn create_sqlite_store(path: PathBuf) -> Result<Arc<SqliteMemberStore>> {
    let store = SqliteMemberStore::new(path).await?;
    Ok(Arc::new(store))
}
