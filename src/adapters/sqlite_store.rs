use crate::domain::model::Headquarter;
use crate::domain::ports::{DocumentStore, Filter, Projection, Update, UpdateResult};
use crate::utils::error::{StoreError, StoreResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, ToSql, TransactionBehavior};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// SQLite-backed document store: one JSON document per headquarter.
///
/// `swift_code` and `country_iso2` are copied out of the document into indexed columns; every
/// other condition of a [`Filter`] is evaluated on the decoded document. Calls run on the
/// blocking thread pool.
///
/// Dropping a call's future (a caller deadline firing, for instance) cancels it: the blocking
/// closure sees the flag before it writes or commits and rolls back instead.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        setup_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection, &Cancellation) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let cancellation = Cancellation::default();
        let _cancel_on_drop = CancelOnDrop(cancellation.clone());

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Backend {
                message: "SQLite connection mutex poisoned".to_string(),
            })?;
            cancellation.check()?;
            f(&mut *guard, &cancellation)
        })
        .await?
    }
}

/// Set once the caller stopped waiting for a call.
#[derive(Debug, Clone, Default)]
struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    fn check(&self) -> StoreResult<()> {
        if self.0.load(Ordering::SeqCst) {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }
}

/// Flags the call as cancelled when the `with_conn` future is dropped. Harmless once the
/// blocking closure has returned.
struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        (self.0).0.store(true, Ordering::SeqCst);
    }
}

fn setup_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS headquarters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            swift_code TEXT NOT NULL,
            country_iso2 TEXT NOT NULL,
            document TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_headquarters_swift_code ON headquarters(swift_code)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_headquarters_country ON headquarters(country_iso2)",
        [],
    )?;

    Ok(())
}

fn select_matching(conn: &Connection, filter: &Filter) -> StoreResult<Vec<(i64, Headquarter)>> {
    let mut sql = String::from("SELECT id, document FROM headquarters");
    let mut clauses = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(code) = &filter.swift_code {
        clauses.push("swift_code = ?");
        values.push(code);
    }
    if let Some(country) = &filter.country_iso2 {
        clauses.push("country_iso2 = ?");
        values.push(country);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(values.as_slice(), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut matching = Vec::new();
    for row in rows {
        let (id, json) = row?;
        let doc: Headquarter = serde_json::from_str(&json)?;
        if filter.matches(&doc) {
            matching.push((id, doc));
        }
    }
    Ok(matching)
}

fn insert_document(conn: &Connection, doc: &Headquarter) -> StoreResult<()> {
    let json = serde_json::to_string(doc)?;
    conn.execute(
        "INSERT INTO headquarters (swift_code, country_iso2, document) VALUES (?1, ?2, ?3)",
        params![doc.swift_code.as_str(), doc.country_iso2.as_str(), json],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::DuplicateKey {
                key: doc.swift_code.to_string(),
            }
        }
        other => StoreError::Sqlite(other),
    })?;
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn ensure_indexes(&self) -> StoreResult<()> {
        self.with_conn(|conn, _| setup_schema(conn)).await
    }

    async fn find_one(
        &self,
        filter: &Filter,
        projection: Projection,
    ) -> StoreResult<Option<Headquarter>> {
        let filter = filter.clone();
        self.with_conn(move |conn, _| {
            Ok(select_matching(conn, &filter)?
                .into_iter()
                .next()
                .map(|(_, doc)| projection.apply(&filter, doc)))
        })
        .await
    }

    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Headquarter>> {
        let filter = filter.clone();
        self.with_conn(move |conn, _| {
            Ok(select_matching(conn, &filter)?
                .into_iter()
                .map(|(_, doc)| doc)
                .collect())
        })
        .await
    }

    async fn insert_one(&self, doc: &Headquarter) -> StoreResult<()> {
        let doc = doc.clone();
        self.with_conn(move |conn, cancellation| {
            cancellation.check()?;
            insert_document(conn, &doc)
        })
        .await
    }

    async fn insert_many(&self, docs: &[Headquarter]) -> StoreResult<usize> {
        let docs = docs.to_vec();
        self.with_conn(move |conn, cancellation| {
            let tx = conn.transaction()?;
            for doc in &docs {
                cancellation.check()?;
                insert_document(&tx, doc)?;
            }
            cancellation.check()?;
            tx.commit()?;
            Ok(docs.len())
        })
        .await
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> StoreResult<UpdateResult> {
        let filter = filter.clone();
        let update = update.clone();
        self.with_conn(move |conn, cancellation| {
            // 讀取、檢查、寫回都在同一個交易內
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some((id, mut doc)) = select_matching(&tx, &filter)?.into_iter().next() else {
                return Ok(UpdateResult::default());
            };

            let modified = update.apply(&mut doc);
            if modified {
                tx.execute(
                    "UPDATE headquarters SET document = ?1 WHERE id = ?2",
                    params![serde_json::to_string(&doc)?, id],
                )?;
            }
            cancellation.check()?;
            tx.commit()?;

            Ok(UpdateResult {
                matched_count: 1,
                modified_count: u64::from(modified),
            })
        })
        .await
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<u64> {
        let filter = filter.clone();
        self.with_conn(move |conn, cancellation| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some((id, _)) = select_matching(&tx, &filter)?.into_iter().next() else {
                return Ok(0);
            };
            let deleted = tx.execute("DELETE FROM headquarters WHERE id = ?1", params![id])?;
            cancellation.check()?;
            tx.commit()?;
            Ok(deleted as u64)
        })
        .await
    }

    async fn drop_collection(&self) -> StoreResult<()> {
        self.with_conn(|conn, cancellation| {
            let tx = conn.transaction()?;
            tx.execute("DROP TABLE IF EXISTS headquarters", [])?;
            setup_schema(&tx)?;
            cancellation.check()?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.with_conn(|conn, _| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM headquarters", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
