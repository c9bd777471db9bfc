use crate::{InferenceError, SearchError, StoreError, StoredDocument};
use async_trait::async_trait;

#[async_trait]
pub trait DocumentStore {
    /// Fixed embedding length every stored document must have.
    fn dimensions(&self) -> usize;

    async fn insert(&self, document: StoredDocument) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<StoredDocument>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn clear_all(&self) -> Result<(), StoreError>;

    /// Documents ordered by descending cosine similarity to `query_vector`.
    async fn nearest(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<(StoredDocument, f32)>, StoreError>;
}

#[async_trait]
pub trait WebSearch {
    /// Text snippets for the query, one per organic result.
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;
}

#[async_trait]
pub trait LanguageModel {
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, InferenceError>;
}
