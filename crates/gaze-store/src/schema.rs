//! SQLite schema for the subject/classification store

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 2;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Subjects to classify, one row per item.
-- Referential integrity with the classification tables is by item id value
-- only; cleanup is the store's explicit cascade, not the engine's.
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    done INTEGER DEFAULT 0,
    uploaded INTEGER DEFAULT 0,
    subject_id TEXT,
    zooniverse_id TEXT,
    group_id TEXT,
    location_standard_uri_remote TEXT,
    location_standard_uri TEXT,
    location_standard_downloaded INTEGER DEFAULT 0,
    location_thumbnail_uri_remote TEXT,
    location_thumbnail_uri TEXT,
    location_thumbnail_downloaded INTEGER DEFAULT 0,
    location_inverted_uri_remote TEXT,
    location_inverted_uri TEXT,
    location_inverted_downloaded INTEGER DEFAULT 0,
    favorite INTEGER DEFAULT 0,
    datetime_done TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_subject_id ON items(subject_id);
CREATE INDEX IF NOT EXISTS idx_items_uploaded ON items(uploaded);
CREATE INDEX IF NOT EXISTS idx_items_done ON items(done);
CREATE INDEX IF NOT EXISTS idx_items_datetime_done ON items(datetime_done);
CREATE INDEX IF NOT EXISTS idx_items_standard_downloaded ON items(location_standard_downloaded);
CREATE INDEX IF NOT EXISTS idx_items_thumbnail_downloaded ON items(location_thumbnail_downloaded);
CREATE INDEX IF NOT EXISTS idx_items_inverted_downloaded ON items(location_inverted_downloaded);

-- Local cache files, referenced from the items location columns.
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_data TEXT
);

-- Each item row has many classification_answers rows.
CREATE TABLE IF NOT EXISTS classification_answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER,
    sequence INTEGER DEFAULT 0,
    question_id TEXT,
    answer_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_answers_item_id ON classification_answers(item_id);

-- Each item row has some classification_checkboxes rows.
CREATE TABLE IF NOT EXISTS classification_checkboxes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER,
    sequence INTEGER DEFAULT 0,
    question_id TEXT,
    checkbox_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_checkboxes_item_id ON classification_checkboxes(item_id);
CREATE INDEX IF NOT EXISTS idx_checkboxes_question_id ON classification_checkboxes(question_id);
"#
    }

    /// Drop the data tables ahead of a destructive rebuild.
    ///
    /// The schema_version table survives; cached image files on disk are
    /// left behind and reused if their names collide later.
    pub fn drop_tables() -> &'static str {
        r#"
DROP TABLE IF EXISTS items;
DROP TABLE IF EXISTS files;
DROP TABLE IF EXISTS classification_answers;
DROP TABLE IF EXISTS classification_checkboxes;
"#
    }

    /// Get migration SQL for a specific version step.
    ///
    /// Steps listed here are additive and preserve existing rows; a step
    /// with no entry forces a destructive rebuild of all four tables.
    pub fn migration(from_version: u32, to_version: u32) -> Option<&'static str> {
        match (from_version, to_version) {
            // v1 predates subject groups.
            (1, 2) => Some("ALTER TABLE items ADD COLUMN group_id TEXT;"),
            _ => None,
        }
    }
}
