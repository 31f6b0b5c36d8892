//! SQLite schema definition.

/// Stored in `PRAGMA user_version` once the schema is applied.
pub const SCHEMA_VERSION: i64 = 1;

/// Local session store schema.
///
/// Holds only the current session's auth and user cache plus the device
/// identifier used for push registration. Everything else lives on the backend.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Session (single row)
-- ============================================================================

CREATE TABLE IF NOT EXISTS session (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    access_token TEXT,
    refresh_token TEXT,
    user_json TEXT,                              -- cached User as JSON
    authenticated INTEGER NOT NULL DEFAULT 0,    -- login completed in this session
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Device (single row, survives logout)
-- ============================================================================

CREATE TABLE IF NOT EXISTS device (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    device_id TEXT NOT NULL,
    push_token TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
