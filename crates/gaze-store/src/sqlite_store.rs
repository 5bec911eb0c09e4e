//! SQLite-backed subject/classification store
//!
//! A single serialized-access store behind `Mutex<Connection>`. Individual
//! operations are atomic at the storage layer; the classification batch in
//! [`SubjectStore::commit_classification`] is the one multi-statement
//! transaction.

use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{error, info, warn};

use crate::classification::ClassificationRecord;
use crate::columns::{self, FieldTable};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::item::{CachedFile, ImageLocation, Item};
use crate::resource::ResourceRef;
use crate::schema::{Schema, SCHEMA_VERSION};
use crate::store::{QuerySpec, Row, Value, ValueMap};

const TABLE_ITEMS: &str = "items";
const TABLE_FILES: &str = "files";
const TABLE_ANSWERS: &str = "classification_answers";
const TABLE_CHECKBOXES: &str = "classification_checkboxes";

const ITEM_SELECT_COLUMNS: &str = "id, done, uploaded, subject_id, zooniverse_id, group_id, \
     location_standard_uri_remote, location_standard_uri, location_standard_downloaded, \
     location_thumbnail_uri_remote, location_thumbnail_uri, location_thumbnail_downloaded, \
     location_inverted_uri_remote, location_inverted_uri, location_inverted_downloaded, \
     favorite, datetime_done";

/// All the subjects that have not yet been classified and are ready to be
/// classified.
const WHERE_ELIGIBLE: &str = "done != 1 \
     AND location_standard_downloaded = 1 \
     AND location_thumbnail_downloaded = 1 \
     AND location_inverted_downloaded = 1";

/// Marker pushed on the sync channel whenever the store thinks background
/// work may be necessary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest;

/// SQLite-backed store for items, cached files and classification rows.
pub struct SubjectStore {
    conn: Mutex<Connection>,
    config: StoreConfig,
    sync_tx: Sender<SyncRequest>,
    sync_rx: Mutex<Option<Receiver<SyncRequest>>>,
}

impl SubjectStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        Self::init_with_connection(conn, config)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory(config: StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn, config)
    }

    fn init_with_connection(conn: Connection, config: StoreConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| StoreError::ConstraintViolation(e.to_string()))?;
        fs::create_dir_all(&config.cache_dir)?;
        Self::initialize(&conn)?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            conn: Mutex::new(conn),
            config,
            sync_tx: tx,
            sync_rx: Mutex::new(Some(rx)),
        })
    }

    /// Initialize or migrate the schema.
    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )?;

        let current = Self::schema_version(conn)?;
        if current == 0 {
            conn.execute_batch(Schema::create_tables())?;
            Self::set_schema_version(conn, SCHEMA_VERSION)?;
        } else if current != SCHEMA_VERSION {
            Self::migrate(conn, current)?;
        }
        Ok(())
    }

    /// Apply the two-tier migration policy.
    ///
    /// A complete chain of additive steps upgrades in place and preserves
    /// rows. Any other gap, including a database newer than this build,
    /// rebuilds all four tables; cached image files are left on disk and
    /// reused when their names collide later.
    fn migrate(conn: &Connection, from: u32) -> Result<()> {
        let mut steps = Vec::new();
        let mut additive = from < SCHEMA_VERSION;
        let mut version = from;
        while additive && version < SCHEMA_VERSION {
            match Schema::migration(version, version + 1) {
                Some(sql) => steps.push(sql),
                None => additive = false,
            }
            version += 1;
        }

        if additive {
            for sql in steps {
                conn.execute_batch(sql)?;
            }
            info!(from, to = SCHEMA_VERSION, "applied additive schema migration");
        } else {
            warn!(
                from,
                to = SCHEMA_VERSION,
                "no additive migration path; rebuilding tables, classification history is lost"
            );
            conn.execute_batch(Schema::drop_tables())?;
            conn.execute_batch(Schema::create_tables())?;
            // Old version rows would otherwise outrank the new one.
            conn.execute("DELETE FROM schema_version", [])?;
        }
        Self::set_schema_version(conn, SCHEMA_VERSION)
    }

    fn schema_version(conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version.unwrap_or(0))
    }

    fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ==================== Sync requests ====================

    /// Ask the background sync collaborator to do its work.
    ///
    /// Fire-and-forget: this is requested far more often than work is
    /// actually needed, and the receiver is trusted to debounce. A dropped
    /// receiver is ignored.
    pub fn request_sync(&self) {
        let _ = self.sync_tx.send(SyncRequest);
    }

    /// Take the sync-request receiver. Can only be taken once.
    pub fn sync_requests(&self) -> Result<Receiver<SyncRequest>> {
        self.sync_rx
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .take()
            .ok_or_else(|| StoreError::Storage("sync_requests: receiver already taken".to_string()))
    }

    // ==================== Generic CRUD ====================

    /// Query rows by reference, returning public-named field maps.
    ///
    /// `item/next` runs the eligibility query (not done, all three image
    /// variants downloaded, oldest first, limit 1) against the local cache
    /// only; the synchronous network fallback lives in
    /// [`crate::NextItemResolver`].
    pub fn query(&self, reference: &ResourceRef, spec: &QuerySpec) -> Result<Vec<Row>> {
        match reference {
            ResourceRef::Items => self.query_table(TABLE_ITEMS, columns::ITEM_FIELDS, None, None, spec),
            ResourceRef::Item(id) => {
                self.query_table(TABLE_ITEMS, columns::ITEM_FIELDS, Some(*id), None, spec)
            }
            ResourceRef::NextItem => {
                let mut forced = spec.clone();
                // Oldest first, so we are more likely to get an item that
                // was fully populated before anything newer.
                forced.order_by = None;
                forced.ascending = true;
                forced.limit = Some(1);
                let rows = self.query_table(
                    TABLE_ITEMS,
                    columns::ITEM_FIELDS,
                    None,
                    Some(WHERE_ELIGIBLE),
                    &forced,
                )?;
                // Consuming an item means more should be pre-fetched.
                self.request_sync();
                Ok(rows)
            }
            ResourceRef::File(id) => {
                self.query_table(TABLE_FILES, columns::FILE_FIELDS, Some(*id), None, spec)
            }
            ResourceRef::Answers => {
                self.query_table(TABLE_ANSWERS, columns::ANSWER_FIELDS, None, None, spec)
            }
            ResourceRef::Answer(id) => {
                self.query_table(TABLE_ANSWERS, columns::ANSWER_FIELDS, Some(*id), None, spec)
            }
            ResourceRef::Checkboxes => {
                self.query_table(TABLE_CHECKBOXES, columns::CHECKBOX_FIELDS, None, None, spec)
            }
            ResourceRef::Checkbox(id) => {
                self.query_table(TABLE_CHECKBOXES, columns::CHECKBOX_FIELDS, Some(*id), None, spec)
            }
        }
    }

    fn query_table(
        &self,
        table: &str,
        fields: FieldTable,
        id: Option<i64>,
        extra_where: Option<&str>,
        spec: &QuerySpec,
    ) -> Result<Vec<Row>> {
        let select_columns: Vec<&str> = fields.iter().map(|(_, column)| *column).collect();
        let mut sql = format!("SELECT {} FROM {}", select_columns.join(", "), table);

        let mut clauses: Vec<String> = Vec::new();
        let mut params_vec: Vec<Value> = Vec::new();

        if let Some(id) = id {
            clauses.push("id = ?".to_string());
            params_vec.push(Value::Int(id));
        }
        if let Some(extra) = extra_where {
            clauses.push(extra.to_string());
        }
        for (field, value) in &spec.filter {
            // Unknown public names are dropped, never passed through raw.
            if let Some(column) = columns::internal(fields, field) {
                clauses.push(format!("{} = ?", column));
                params_vec.push(value.clone());
            }
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let order_column = spec
            .order_by
            .as_deref()
            .and_then(|field| columns::internal(fields, field))
            .unwrap_or("id");
        sql.push_str(" ORDER BY ");
        sql.push_str(order_column);
        sql.push_str(if spec.ascending { " ASC" } else { " DESC" });

        if let Some(limit) = spec.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = params_vec
            .iter()
            .map(|p| p as &dyn rusqlite::types::ToSql)
            .collect();

        let mut rows = stmt.query(params_ref.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = Row::new();
            for (i, (public, _)) in fields.iter().enumerate() {
                map.insert((*public).to_string(), Value::from_sql(row.get_ref(i)?));
            }
            out.push(map);
        }
        Ok(out)
    }

    /// Insert a row, translating public field names.
    ///
    /// Item inserts require a non-empty subject id and reserve the three
    /// cached-file slots first; the reservation and the item row are one
    /// transaction, so a failure yields no partial item.
    pub fn insert(&self, reference: &ResourceRef, values: &ValueMap) -> Result<i64> {
        let id = match reference {
            ResourceRef::Items | ResourceRef::Item(_) => self.insert_item(values)?,
            ResourceRef::Answers | ResourceRef::Answer(_) => {
                let conn = self.lock()?;
                Self::insert_mapped(&conn, TABLE_ANSWERS, columns::ANSWER_FIELDS, values)?
            }
            ResourceRef::Checkboxes | ResourceRef::Checkbox(_) => {
                let conn = self.lock()?;
                Self::insert_mapped(&conn, TABLE_CHECKBOXES, columns::CHECKBOX_FIELDS, values)?
            }
            ResourceRef::File(_) => {
                return Err(StoreError::InvalidReference(
                    "cached-file records are created by the store, not inserted".into(),
                ))
            }
            ResourceRef::NextItem => {
                return Err(StoreError::InvalidReference(
                    "cannot insert into item/next".into(),
                ))
            }
        };
        self.request_sync();
        Ok(id)
    }

    fn insert_item(&self, values: &ValueMap) -> Result<i64> {
        let has_subject = values
            .get(columns::item::SUBJECT_ID)
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false);
        if !has_subject {
            return Err(StoreError::ConstraintViolation(
                "refusing to insert an item without a subjectId".into(),
            ));
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        match Self::insert_item_tx(&tx, &self.config, values) {
            Ok(id) => {
                tx.commit()?;
                Ok(id)
            }
            Err(e) => {
                // Dropping the transaction rolls back the file rows too:
                // no partial item.
                Err(e)
            }
        }
    }

    fn insert_item_tx(conn: &Connection, config: &StoreConfig, values: &ValueMap) -> Result<i64> {
        // Reserve local cache slots for the three image variants. A remote
        // URI may be supplied by the caller, but the local URI is always
        // ours.
        let mut complete = values.clone();
        for field in [
            columns::item::LOCATION_STANDARD_URI,
            columns::item::LOCATION_THUMBNAIL_URI,
            columns::item::LOCATION_INVERTED_URI,
        ] {
            let file_ref = Self::create_cached_file(conn, config)?;
            complete.insert(field.to_string(), Value::Text(file_ref));
        }
        Self::insert_mapped(conn, TABLE_ITEMS, columns::ITEM_FIELDS, &complete)
    }

    fn insert_mapped(
        conn: &Connection,
        table: &str,
        fields: FieldTable,
        values: &ValueMap,
    ) -> Result<i64> {
        let mut insert_columns = Vec::new();
        let mut params_vec: Vec<Value> = Vec::new();
        for (public, value) in values {
            if let Some(column) = columns::internal(fields, public) {
                insert_columns.push(column);
                params_vec.push(value.clone());
            }
        }
        if insert_columns.is_empty() {
            return Err(StoreError::ConstraintViolation(format!(
                "no recognized fields to insert into {}",
                table
            )));
        }

        let placeholders: Vec<String> = (1..=insert_columns.len())
            .map(|i| format!("?{}", i))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            insert_columns.join(", "),
            placeholders.join(", ")
        );
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = params_vec
            .iter()
            .map(|p| p as &dyn rusqlite::types::ToSql)
            .collect();
        conn.execute(&sql, params_ref.as_slice())?;
        Ok(conn.last_insert_rowid())
    }

    /// Reserve one cached-file slot: insert the row, create the (empty)
    /// file on disk named after the row id, store the absolute path, and
    /// return the `file/{id}` reference for an item location column.
    fn create_cached_file(conn: &Connection, config: &StoreConfig) -> Result<String> {
        conn.execute("INSERT INTO files (file_data) VALUES (NULL)", [])?;
        let file_id = conn.last_insert_rowid();

        let path = config.cache_dir.join(file_id.to_string());
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Leftover from a destructive schema rebuild; reuse it.
                warn!(path = %path.display(), "cache file already exists, reusing");
            }
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "create cache file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        let path_text = path.to_string_lossy().into_owned();
        conn.execute(
            "UPDATE files SET file_data = ?1 WHERE id = ?2",
            params![path_text, file_id],
        )?;
        Ok(ResourceRef::File(file_id).to_string())
    }

    /// Partial update by reference, translating public field names.
    ///
    /// An update whose fields were all unknown (and therefore dropped)
    /// writes nothing and reports zero affected rows.
    pub fn update(&self, reference: &ResourceRef, values: &ValueMap) -> Result<usize> {
        let (table, fields, id) = match reference {
            ResourceRef::Items => (TABLE_ITEMS, columns::ITEM_FIELDS, None),
            ResourceRef::Item(id) => (TABLE_ITEMS, columns::ITEM_FIELDS, Some(*id)),
            ResourceRef::File(id) => (TABLE_FILES, columns::FILE_FIELDS, Some(*id)),
            ResourceRef::Answers => (TABLE_ANSWERS, columns::ANSWER_FIELDS, None),
            ResourceRef::Answer(id) => (TABLE_ANSWERS, columns::ANSWER_FIELDS, Some(*id)),
            ResourceRef::Checkboxes => (TABLE_CHECKBOXES, columns::CHECKBOX_FIELDS, None),
            ResourceRef::Checkbox(id) => (TABLE_CHECKBOXES, columns::CHECKBOX_FIELDS, Some(*id)),
            ResourceRef::NextItem => {
                return Err(StoreError::InvalidReference(
                    "item/next is a virtual reference; resolve it to a real item first".into(),
                ))
            }
        };

        let mut assignments = Vec::new();
        let mut params_vec: Vec<Value> = Vec::new();
        for (public, value) in values {
            if let Some(column) = columns::internal(fields, public) {
                assignments.push(format!("{} = ?", column));
                params_vec.push(value.clone());
            }
        }
        if assignments.is_empty() {
            return Ok(0);
        }

        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        if let Some(id) = id {
            sql.push_str(" WHERE id = ?");
            params_vec.push(Value::Int(id));
        }

        let affected = {
            let conn = self.lock()?;
            let params_ref: Vec<&dyn rusqlite::types::ToSql> = params_vec
                .iter()
                .map(|p| p as &dyn rusqlite::types::ToSql)
                .collect();
            conn.execute(&sql, params_ref.as_slice())?
        };
        self.request_sync();
        Ok(affected)
    }

    /// Delete by reference.
    ///
    /// Deleting an item cascades: its three cached files are removed from
    /// disk and from the files table, then its answer and checkbox rows,
    /// then the item row itself.
    pub fn delete(&self, reference: &ResourceRef) -> Result<usize> {
        let affected = {
            let conn = self.lock()?;
            match reference {
                ResourceRef::Items => {
                    let ids: Vec<i64> = {
                        let mut stmt = conn.prepare("SELECT id FROM items")?;
                        let ids = stmt
                            .query_map([], |row| row.get(0))?
                            .collect::<std::result::Result<Vec<i64>, _>>()?;
                        ids
                    };
                    let mut total = 0;
                    for id in ids {
                        total += Self::remove_item(&conn, id)?;
                    }
                    total
                }
                ResourceRef::Item(id) => Self::remove_item(&conn, *id)?,
                ResourceRef::File(id) => Self::remove_file(&conn, *id)?,
                ResourceRef::Answers => conn.execute("DELETE FROM classification_answers", [])?,
                ResourceRef::Answer(id) => conn.execute(
                    "DELETE FROM classification_answers WHERE id = ?1",
                    params![id],
                )?,
                ResourceRef::Checkboxes => {
                    conn.execute("DELETE FROM classification_checkboxes", [])?
                }
                ResourceRef::Checkbox(id) => conn.execute(
                    "DELETE FROM classification_checkboxes WHERE id = ?1",
                    params![id],
                )?,
                ResourceRef::NextItem => {
                    return Err(StoreError::InvalidReference(
                        "item/next is a virtual reference; resolve it to a real item first".into(),
                    ))
                }
            }
        };
        self.request_sync();
        Ok(affected)
    }

    fn remove_item(conn: &Connection, item_id: i64) -> Result<usize> {
        let locations: Option<(Option<String>, Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT location_standard_uri, location_thumbnail_uri, location_inverted_uri \
                 FROM items WHERE id = ?1",
                params![item_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((standard, thumbnail, inverted)) = locations else {
            return Ok(0);
        };

        for reference in [standard, thumbnail, inverted].into_iter().flatten() {
            match ResourceRef::parse(&reference) {
                Ok(ResourceRef::File(file_id)) => {
                    Self::remove_file(conn, file_id)?;
                }
                _ => {
                    warn!(item_id, reference = %reference, "item location is not a file reference");
                }
            }
        }

        // Answer and checkbox rows only exist for classified items, so zero
        // affected rows here is normal.
        conn.execute(
            "DELETE FROM classification_answers WHERE item_id = ?1",
            params![item_id],
        )?;
        conn.execute(
            "DELETE FROM classification_checkboxes WHERE item_id = ?1",
            params![item_id],
        )?;

        let affected = conn.execute("DELETE FROM items WHERE id = ?1", params![item_id])?;
        Ok(affected)
    }

    fn remove_file(conn: &Connection, file_id: i64) -> Result<usize> {
        let path: Option<Option<String>> = conn
            .query_row(
                "SELECT file_data FROM files WHERE id = ?1",
                params![file_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(Some(path)) = path {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path, error = %e, "could not delete cached file");
            }
        }

        let affected = conn.execute("DELETE FROM files WHERE id = ?1", params![file_id])?;
        Ok(affected)
    }

    // ==================== Typed reads ====================

    /// Get an item by id.
    pub fn item(&self, id: i64) -> Result<Option<Item>> {
        let conn = self.lock()?;
        let item = conn
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", ITEM_SELECT_COLUMNS),
                params![id],
                Self::row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    /// Get a cached-file record by id.
    pub fn file(&self, id: i64) -> Result<Option<CachedFile>> {
        let conn = self.lock()?;
        let file = conn
            .query_row(
                "SELECT id, file_data FROM files WHERE id = ?1",
                params![id],
                |row| {
                    Ok(CachedFile {
                        id: row.get(0)?,
                        path: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(file)
    }

    /// The oldest unclassified, fully-downloaded item in the local cache,
    /// if any.
    ///
    /// Read-only with respect to item rows, so two consecutive calls with
    /// no intervening writes return the same item. Every call emits a sync
    /// request: consuming an item means more should be pre-fetched.
    pub fn next_unclassified(&self) -> Result<Option<Item>> {
        let item = {
            let conn = self.lock()?;
            conn.query_row(
                &format!(
                    "SELECT {} FROM items WHERE {} ORDER BY id ASC LIMIT 1",
                    ITEM_SELECT_COLUMNS, WHERE_ELIGIBLE
                ),
                [],
                Self::row_to_item,
            )
            .optional()?
        };
        self.request_sync();
        Ok(item)
    }

    fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
        let flag = |value: Option<i64>| value.unwrap_or(0) != 0;
        Ok(Item {
            id: row.get(0)?,
            done: flag(row.get(1)?),
            uploaded: flag(row.get(2)?),
            subject_id: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            zooniverse_id: row.get(4)?,
            group_id: row.get(5)?,
            standard: ImageLocation {
                uri_remote: row.get(6)?,
                uri: row.get(7)?,
                downloaded: flag(row.get(8)?),
            },
            thumbnail: ImageLocation {
                uri_remote: row.get(9)?,
                uri: row.get(10)?,
                downloaded: flag(row.get(11)?),
            },
            inverted: ImageLocation {
                uri_remote: row.get(12)?,
                uri: row.get(13)?,
                downloaded: flag(row.get(14)?),
            },
            favorite: flag(row.get(15)?),
            datetime_done: row.get(16)?,
        })
    }

    // ==================== Classification batch ====================

    /// Commit one finished classification as an indivisible unit.
    ///
    /// For each answer at sequence index `i` this writes one
    /// classification_answers row and one classification_checkboxes row per
    /// selected checkbox, then marks the item done with the completion
    /// timestamp and the favorite flag. The whole batch either commits or
    /// leaves storage completely unchanged.
    ///
    /// A [`StoreError::TransactionFailed`] from this method is not
    /// recoverable: the finished classification it carried is gone, and the
    /// embedding application should stop rather than classify on top of
    /// possibly-corrupted state.
    pub fn commit_classification(&self, item_id: i64, record: &ClassificationRecord) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StoreError::TransactionFailed(format!("begin: {}", e)))?;

        let batch = (|| -> std::result::Result<(), rusqlite::Error> {
            for (sequence, answer) in record.answers.iter().enumerate() {
                tx.execute(
                    "INSERT INTO classification_answers (item_id, sequence, question_id, answer_id) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![item_id, sequence as i64, answer.question_id, answer.answer_id],
                )?;
                for checkbox_id in &answer.checkbox_ids {
                    tx.execute(
                        "INSERT INTO classification_checkboxes (item_id, sequence, question_id, checkbox_id) \
                         VALUES (?1, ?2, ?3, ?4)",
                        params![item_id, sequence as i64, answer.question_id, checkbox_id],
                    )?;
                }
            }

            let done_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
            tx.execute(
                "UPDATE items SET done = 1, datetime_done = ?1, favorite = ?2 WHERE id = ?3",
                params![done_at, record.favorite as i64, item_id],
            )?;
            Ok(())
        })();

        if let Err(e) = batch {
            error!(item_id, error = %e, "classification batch failed, rolling back");
            return Err(StoreError::TransactionFailed(e.to_string()));
        }

        tx.commit()
            .map_err(|e| StoreError::TransactionFailed(format!("commit: {}", e)))?;
        drop(conn);
        self.request_sync();
        Ok(())
    }
}
