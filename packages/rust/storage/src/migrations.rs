//! SQL migration definitions for the canonical speaker database.
//!
//! Migrations are applied in order on open. Each migration has a version
//! number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: speakers",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Canonical speaker records; `doc` is the serialized record
CREATE TABLE IF NOT EXISTS speakers (
    id         TEXT PRIMARY KEY,
    name       TEXT,
    city       TEXT,
    doc        TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Index speakers by name for identity lookups",
            sql: r#"
CREATE INDEX IF NOT EXISTS idx_speakers_name ON speakers(name);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
        Migration {
            version: 3,
            description: "Pin the identity each speaker is indexed under",
            sql: r#"
-- Name and city at creation; merges rewrite name/city but never these
ALTER TABLE speakers ADD COLUMN index_name TEXT;
ALTER TABLE speakers ADD COLUMN index_city TEXT;
UPDATE speakers SET index_name = name, index_city = city;

INSERT INTO schema_migrations (version) VALUES (3);
"#,
        },
    ]
}
