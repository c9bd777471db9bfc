use crate::store::{check_dimensions, rank_nearest};
use crate::traits::DocumentStore;
use crate::{DocumentMetadata, StoreError, StoredDocument};
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Durable document collection in a local SQLite file.
///
/// Several collections may share one database file; every operation is scoped
/// to the collection name given at open time. Writes run in autocommit mode,
/// so each insert or clear is on disk when the call returns.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    collection: Arc<str>,
    dimensions: usize,
}

impl SqliteStore {
    pub fn open(
        db_path: impl AsRef<Path>,
        collection: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::from_connection(conn, collection.into(), dimensions)
    }

    pub fn open_in_memory(
        collection: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, collection.into(), dimensions)
    }

    fn from_connection(
        conn: Connection,
        collection: String,
        dimensions: usize,
    ) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                embedding BLOB NOT NULL,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
        ",
        )?;

        debug!(collection = %collection, dimensions, "sqlite collection ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.into(),
            dimensions,
        })
    }

    /// Runs `operation` on the blocking pool with the connection locked.
    async fn with_connection<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let collection = Arc::clone(&self.collection);

        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            operation(&guard, &collection)
        })
        .await
        .map_err(|error| StoreError::Task(error.to_string()))?
    }
}

fn insert_document(
    conn: &Connection,
    collection: &str,
    document: &StoredDocument,
) -> Result<(), StoreError> {
    let embedding = serde_json::to_vec(&document.embedding)?;
    let metadata = serde_json::to_string(&document.metadata)?;

    let inserted = conn.execute(
        "INSERT INTO documents (id, collection, embedding, text, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![document.id, collection, embedding, document.text, metadata],
    );

    match inserted {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::DuplicateId(document.id.clone()))
        }
        Err(error) => Err(error.into()),
    }
}

fn list_documents(conn: &Connection, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, embedding, text, metadata FROM documents WHERE collection = ?1 ORDER BY rowid",
    )?;
    let mut rows = stmt.query(params![collection])?;

    let mut documents = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let embedding: Vec<u8> = row.get(1)?;
        let text: String = row.get(2)?;
        let metadata: String = row.get(3)?;

        documents.push(StoredDocument {
            id,
            embedding: serde_json::from_slice(&embedding)?,
            text,
            metadata: serde_json::from_str::<DocumentMetadata>(&metadata)?,
        });
    }

    Ok(documents)
}

fn count_documents(conn: &Connection, collection: &str) -> Result<usize, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = ?1",
        params![collection],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as usize)
}

fn clear_documents(conn: &Connection, collection: &str) -> Result<usize, StoreError> {
    let deleted = conn.execute(
        "DELETE FROM documents WHERE collection = ?1",
        params![collection],
    )?;
    Ok(deleted)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn insert(&self, document: StoredDocument) -> Result<(), StoreError> {
        check_dimensions(self.dimensions, document.embedding.len())?;
        self.with_connection(move |conn, collection| insert_document(conn, collection, &document))
            .await
    }

    async fn list_all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        self.with_connection(list_documents).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.with_connection(count_documents).await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let deleted = self.with_connection(clear_documents).await?;
        debug!(collection = %self.collection, deleted, "collection cleared");
        Ok(())
    }

    async fn nearest(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<(StoredDocument, f32)>, StoreError> {
        check_dimensions(self.dimensions, query_vector.len())?;
        let documents = self.with_connection(list_documents).await?;
        Ok(rank_nearest(documents, query_vector, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::traits::DocumentStore;
    use crate::{DocumentMetadata, StoreError, StoredDocument};
    use chrono::Utc;
    use tempfile::tempdir;

    fn document(id: &str, embedding: Vec<f32>, text: &str) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            embedding,
            text: text.to_string(),
            metadata: DocumentMetadata {
                file_name: format!("{id}.txt"),
                checksum: "abc".to_string(),
                size_bytes: text.len() as u64,
                uploaded_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn insert_adds_exactly_one_record() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::open_in_memory("docs", 3)?;
        assert_eq!(store.count().await?, 0);

        store.insert(document("a", vec![1.0, 0.0, 0.0], "alpha")).await?;

        assert_eq!(store.count().await?, 1);
        let listed = store.list_all().await?;
        assert_eq!(listed.iter().filter(|doc| doc.id == "a").count(), 1);
        assert_eq!(listed[0].text, "alpha");
        assert_eq!(listed[0].embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(listed[0].metadata.file_name, "a.txt");
        Ok(())
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::open_in_memory("docs", 3)?;
        assert!(store.list_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::open_in_memory("docs", 2)?;
        store.insert(document("same", vec![1.0, 0.0], "first")).await?;

        let result = store.insert(document("same", vec![0.0, 1.0], "second")).await;
        assert!(matches!(result, Err(StoreError::DuplicateId(id)) if id == "same"));
        assert_eq!(store.count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::open_in_memory("docs", 4)?;
        let result = store.insert(document("a", vec![1.0, 0.0], "short")).await;
        assert!(matches!(
            result,
            Err(StoreError::DimensionMismatch {
                expected: 4,
                actual: 2
            })
        ));
        assert_eq!(store.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn clear_all_empties_the_collection() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::open_in_memory("docs", 2)?;
        store.insert(document("a", vec![1.0, 0.0], "alpha")).await?;
        store.insert(document("b", vec![0.0, 1.0], "beta")).await?;

        store.clear_all().await?;

        assert_eq!(store.count().await?, 0);
        assert!(store.list_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn documents_survive_reopen() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("documents.sqlite3");

        {
            let store = SqliteStore::open(&path, "docs", 2)?;
            store.insert(document("a", vec![1.0, 0.0], "persisted")).await?;
        }

        let reopened = SqliteStore::open(&path, "docs", 2)?;
        let listed = reopened.list_all().await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "persisted");
        Ok(())
    }

    #[tokio::test]
    async fn collections_are_isolated() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("documents.sqlite3");
        let first = SqliteStore::open(&path, "first", 2)?;
        let second = SqliteStore::open(&path, "second", 2)?;

        first.insert(document("a", vec![1.0, 0.0], "alpha")).await?;
        second.insert(document("b", vec![0.0, 1.0], "beta")).await?;
        first.clear_all().await?;

        assert_eq!(first.count().await?, 0);
        assert_eq!(second.count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn nearest_ranks_by_cosine() -> Result<(), Box<dyn std::error::Error>> {
        let store = SqliteStore::open_in_memory("docs", 2)?;
        store.insert(document("east", vec![1.0, 0.0], "east")).await?;
        store.insert(document("north", vec![0.0, 1.0], "north")).await?;

        let hits = store.nearest(&[0.9, 0.1], 1).await?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.id, "east");
        Ok(())
    }
}
