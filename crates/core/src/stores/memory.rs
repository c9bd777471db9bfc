use crate::store::{check_dimensions, rank_nearest};
use crate::traits::DocumentStore;
use crate::{StoreError, StoredDocument, DEFAULT_EMBEDDING_DIMENSIONS};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local document store; contents are lost on exit.
pub struct MemoryStore {
    dimensions: usize,
    documents: RwLock<Vec<StoredDocument>>,
}

impl MemoryStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            documents: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSIONS)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn insert(&self, document: StoredDocument) -> Result<(), StoreError> {
        check_dimensions(self.dimensions, document.embedding.len())?;

        let mut documents = self.documents.write().await;
        if documents.iter().any(|stored| stored.id == document.id) {
            return Err(StoreError::DuplicateId(document.id));
        }
        documents.push(document);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        Ok(self.documents.read().await.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.documents.read().await.len())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.documents.write().await.clear();
        Ok(())
    }

    async fn nearest(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<(StoredDocument, f32)>, StoreError> {
        check_dimensions(self.dimensions, query_vector.len())?;
        let documents = self.documents.read().await.clone();
        Ok(rank_nearest(documents, query_vector, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::traits::DocumentStore;
    use crate::{DocumentMetadata, StoreError, StoredDocument};
    use chrono::Utc;

    fn document(id: &str) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            embedding: vec![0.5, 0.5],
            text: format!("text of {id}"),
            metadata: DocumentMetadata {
                file_name: format!("{id}.txt"),
                checksum: String::new(),
                size_bytes: 0,
                uploaded_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn memory_store_follows_the_store_contract() {
        let store = MemoryStore::new(2);
        store.insert(document("a")).await.unwrap();
        store.insert(document("b")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        let duplicate = store.insert(document("a")).await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateId(_))));
        assert_eq!(store.count().await.unwrap(), 2);

        store.clear_all().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
