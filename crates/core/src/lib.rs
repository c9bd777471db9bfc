pub mod chat;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod search;
pub mod store;
pub mod stores;
pub mod traits;

pub use chat::ChatSession;
pub use embeddings::{
    CharacterNgramEmbedder, Embedder, OllamaEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL,
};
pub use error::{
    EmbeddingError, InferenceError, IngestError, QueryError, SearchError, StoreError,
};
pub use extractor::{extract_text, join_pages, LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{discover_documents, IngestionReport, SkippedFile};
pub use llm::{OllamaClient, OllamaConfig, DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_URL};
pub use models::{
    ChatMessage, ChatRole, DocumentMetadata, FileKind, GroundedAnswer, PipelineOptions,
    RetrievalMode, StoredDocument, WebQueryOutcome,
};
pub use orchestrator::{document_prompt, web_prompt, Assistant};
pub use search::{SerpApiClient, SerpApiConfig, DEFAULT_SEARCH_ENDPOINT};
pub use store::DEFAULT_COLLECTION;
pub use stores::{MemoryStore, SqliteStore};
pub use traits::{DocumentStore, LanguageModel, WebSearch};
