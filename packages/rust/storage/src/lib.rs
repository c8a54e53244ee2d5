//! libSQL storage layer (local files, offline).
//!
//! Every logical database lives in its own file, `<root>/<name>.db`.
//!
//! - [`SourceStore`]: a source database. Each collection is a table of
//!   native JSON documents; the unification run only reads them.
//! - [`SpeakerStore`]: the canonical database holding one row per
//!   [`SpeakerRecord`], created and upgraded by versioned migrations.

mod migrations;

use std::path::{Path, PathBuf};

use chrono::Utc;
use libsql::{Connection, Database, Rows, params};
use serde_json::Value;
use speakerunify_shared::{Result, SpeakerId, SpeakerRecord, UnifyError};

/// File holding database `name` under `root`.
pub fn database_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.db"))
}

fn storage_err(e: impl std::fmt::Display) -> UnifyError {
    UnifyError::Storage(e.to_string())
}

/// Collection names become table names, so only `[A-Za-z0-9_]` is allowed.
fn validate_identifier(name: &str) -> Result<&str> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(UnifyError::validation(format!(
            "invalid collection name '{name}' (letters, digits and '_' only)"
        )))
    }
}

async fn open_local(path: &Path) -> Result<(Database, Connection)> {
    let db = libsql::Builder::new_local(path)
        .build()
        .await
        .map_err(storage_err)?;
    let conn = db.connect().map_err(storage_err)?;
    Ok((db, conn))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| UnifyError::io(parent, e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Source databases
// ---------------------------------------------------------------------------

/// Handle on one source database.
pub struct SourceStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl SourceStore {
    /// Open or create a source database for writing (imports, fixtures).
    pub async fn open(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let (db, conn) = open_local(path).await?;
        Ok(Self {
            db,
            conn,
            readonly: false,
        })
    }

    /// Open an existing source database for reading.
    ///
    /// Returns `None` when the file does not exist; a missing source is not
    /// an error.
    pub async fn open_readonly(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let (db, conn) = open_local(path).await?;
        Ok(Some(Self {
            db,
            conn,
            readonly: true,
        }))
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(UnifyError::Storage(
                "source database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    /// Names of all collections, sorted.
    pub async fn collections(&self) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut names = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            names.push(row.get::<String>(0).map_err(storage_err)?);
        }
        Ok(names)
    }

    /// The collection to read: `preferred` if present, otherwise the first
    /// collection whose name contains `speaker`.
    pub async fn resolve_collection(&self, preferred: &str) -> Result<Option<String>> {
        let names = self.collections().await?;
        if names.iter().any(|n| n == preferred) {
            return Ok(Some(preferred.to_string()));
        }
        let fallback = names
            .into_iter()
            .find(|n| n.to_ascii_lowercase().contains("speaker"));
        if let Some(name) = &fallback {
            tracing::info!(preferred, using = %name, "configured collection missing, using fallback");
        }
        Ok(fallback)
    }

    /// Create a collection table if it does not exist.
    pub async fn ensure_collection(&self, collection: &str) -> Result<()> {
        self.check_writable()?;
        let table = validate_identifier(collection)?;
        self.conn
            .execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        seq INTEGER PRIMARY KEY AUTOINCREMENT,
                        doc TEXT NOT NULL
                    )"
                ),
                params![],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Append native documents to a collection in one transaction.
    pub async fn insert_documents(&self, collection: &str, docs: &[Value]) -> Result<usize> {
        self.check_writable()?;
        self.ensure_collection(collection).await?;
        let sql = format!("INSERT INTO {collection} (doc) VALUES (?1)");

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        for doc in docs {
            tx.execute(&sql, params![doc.to_string()])
                .await
                .map_err(storage_err)?;
        }
        tx.commit().await.map_err(storage_err)?;
        Ok(docs.len())
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> Result<u64> {
        let table = validate_identifier(collection)?;
        let mut rows = self
            .conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), params![])
            .await
            .map_err(storage_err)?;
        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<u64>(0).map_err(storage_err)?),
            None => Ok(0),
        }
    }

    /// Iterate a collection in insertion order.
    pub async fn documents(&self, collection: &str) -> Result<DocumentCursor> {
        let table = validate_identifier(collection)?;
        let rows = self
            .conn
            .query(&format!("SELECT seq, doc FROM {table} ORDER BY seq"), params![])
            .await
            .map_err(storage_err)?;
        Ok(DocumentCursor { rows })
    }
}

/// One stored native document, still as text.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub seq: i64,
    pub body: String,
}

impl RawDocument {
    /// Decode the stored JSON text.
    pub fn parse(&self) -> Result<Value> {
        serde_json::from_str(&self.body)
            .map_err(|e| UnifyError::parse(format!("document #{}: {e}", self.seq)))
    }
}

/// Forward-only cursor over a collection.
pub struct DocumentCursor {
    rows: Rows,
}

impl DocumentCursor {
    pub async fn next(&mut self) -> Result<Option<RawDocument>> {
        let Some(row) = self.rows.next().await.map_err(storage_err)? else {
            return Ok(None);
        };
        Ok(Some(RawDocument {
            seq: row.get::<i64>(0).map_err(storage_err)?,
            body: row.get::<String>(1).map_err(storage_err)?,
        }))
    }
}

// ---------------------------------------------------------------------------
// Canonical database
// ---------------------------------------------------------------------------

/// The identity a stored record is indexed under, enough to rebuild the
/// identity index. `name` and `city` are the values the record was created
/// with, not its current ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub id: SpeakerId,
    pub name: Option<String>,
    pub city: Option<String>,
}

/// A record queued for writing.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    pub record: SpeakerRecord,
    /// Identity written only when the row is created; later writes of the
    /// same id leave the stored identity alone.
    pub index_name: Option<String>,
    pub index_city: Option<String>,
}

impl From<SpeakerRecord> for StagedRecord {
    /// Index the record under its own name and city.
    fn from(record: SpeakerRecord) -> Self {
        Self {
            index_name: record.name.clone(),
            index_city: record.location.city.clone(),
            record,
        }
    }
}

/// Result of one batch flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub written: usize,
    pub failed: usize,
}

/// How many canonical records carry each optional field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub total: u64,
    pub social_media: u64,
    pub contact: u64,
    pub testimonials: u64,
    pub professional_info: u64,
    pub company: u64,
    pub platform_fields: u64,
    pub seo_metadata: u64,
}

/// Read-write handle on the canonical speaker database.
pub struct SpeakerStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl SpeakerStore {
    /// Open or create the database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let (db, conn) = open_local(path).await?;
        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        UnifyError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before the first migration.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0,
        }
    }

    /// Every stored record's pinned identity.
    pub async fn index_rows(&self) -> Result<Vec<IndexRow>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, index_name, index_city FROM speakers ORDER BY id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            out.push(IndexRow {
                id: SpeakerId(row.get::<String>(0).map_err(storage_err)?),
                name: row.get::<Option<String>>(1).map_err(storage_err)?,
                city: row.get::<Option<String>>(2).map_err(storage_err)?,
            });
        }
        Ok(out)
    }

    /// Load one record by id.
    pub async fn get(&self, id: &SpeakerId) -> Result<Option<SpeakerRecord>> {
        let mut rows = self
            .conn
            .query("SELECT doc FROM speakers WHERE id = ?1", params![id.as_str()])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => {
                let doc = row.get::<String>(0).map_err(storage_err)?;
                let record = serde_json::from_str(&doc)
                    .map_err(|e| UnifyError::parse(format!("stored record {id}: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Number of canonical records.
    pub async fn count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM speakers", params![])
            .await
            .map_err(storage_err)?;
        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<u64>(0).map_err(storage_err)?),
            None => Ok(0),
        }
    }

    /// Upsert a batch of records by id inside one transaction.
    ///
    /// A failing record is counted and logged; the rest of the batch still
    /// lands. `created_at` and the index identity of an existing row are
    /// never overwritten.
    pub async fn write_batch(&self, staged: &[StagedRecord]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        if staged.is_empty() {
            return Ok(outcome);
        }

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        for StagedRecord {
            record,
            index_name,
            index_city,
        } in staged
        {
            let doc = match serde_json::to_string(record) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "failed to serialize record");
                    outcome.failed += 1;
                    continue;
                }
            };
            let created_at = record.created_at.unwrap_or_else(Utc::now).to_rfc3339();
            let updated_at = record.updated_at.map(|t| t.to_rfc3339());

            let result = tx
                .execute(
                    "INSERT INTO speakers
                       (id, name, city, doc, created_at, updated_at, index_name, index_city)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(id) DO UPDATE SET
                       name = excluded.name,
                       city = excluded.city,
                       doc = excluded.doc,
                       updated_at = excluded.updated_at",
                    params![
                        record.id.as_str(),
                        record.name.as_deref(),
                        record.city(),
                        doc,
                        created_at,
                        updated_at,
                        index_name.as_deref(),
                        index_city.as_deref(),
                    ],
                )
                .await;

            match result {
                Ok(_) => outcome.written += 1,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "record write failed");
                    outcome.failed += 1;
                }
            }
        }
        tx.commit().await.map_err(storage_err)?;

        tracing::debug!(
            written = outcome.written,
            failed = outcome.failed,
            "flushed batch"
        );
        Ok(outcome)
    }

    /// Count records carrying each optional field.
    pub async fn coverage(&self) -> Result<Coverage> {
        let mut rows = self
            .conn
            .query(
                "SELECT
                   COUNT(*),
                   COALESCE(SUM(json_extract(doc, '$.social_media') IS NOT NULL), 0),
                   COALESCE(SUM(json_extract(doc, '$.contact') IS NOT NULL), 0),
                   COALESCE(SUM(json_extract(doc, '$.testimonials') IS NOT NULL), 0),
                   COALESCE(SUM(json_extract(doc, '$.professional_info') IS NOT NULL), 0),
                   COALESCE(SUM(json_extract(doc, '$.professional_info.company') IS NOT NULL), 0),
                   COALESCE(SUM(json_extract(doc, '$.platform_fields') IS NOT NULL), 0),
                   COALESCE(SUM(json_extract(doc, '$.metadata.meta_description') IS NOT NULL), 0)
                 FROM speakers",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let Some(row) = rows.next().await.map_err(storage_err)? else {
            return Ok(Coverage::default());
        };
        let col = |i: i32| row.get::<u64>(i).map_err(storage_err);
        Ok(Coverage {
            total: col(0)?,
            social_media: col(1)?,
            contact: col(2)?,
            testimonials: col(3)?,
            professional_info: col(4)?,
            company: col(5)?,
            platform_fields: col(6)?,
            seo_metadata: col(7)?,
        })
    }
}
