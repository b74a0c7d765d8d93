//! Database schema and migrations for docvault.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Document index
    r#"
-- AUTOINCREMENT keeps deleted ids from ever being handed out again
CREATE TABLE documents (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    filename          TEXT NOT NULL,
    size              INTEGER NOT NULL CHECK (size >= 0),
    content_type      TEXT NOT NULL,
    upload_timestamp  TEXT NOT NULL,         -- RFC 3339, UTC
    storage_path      TEXT NOT NULL UNIQUE
);
"#,
    // v2: Listing is newest-first
    r#"
CREATE INDEX idx_documents_id_desc ON documents(id DESC);
"#,
];
