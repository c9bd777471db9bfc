use crate::chat::ChatSession;
use crate::embeddings::Embedder;
use crate::extractor::extract_text;
use crate::ingest::{build_metadata, discover_documents, IngestionReport, SkippedFile};
use crate::traits::{DocumentStore, LanguageModel, WebSearch};
use crate::{
    GroundedAnswer, IngestError, PipelineOptions, QueryError, RetrievalMode, StoreError,
    StoredDocument, WebQueryOutcome,
};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub fn document_prompt(context: &str, question: &str) -> String {
    format!("Context: {context}\n\nQuestion: {question}\nAnswer:")
}

pub fn web_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion:\n{question}\nAnswer:")
}

/// Wires extraction, embedding, storage, search and generation into the
/// upload, document question, web question and chat flows.
///
/// Built once at startup; every flow borrows the same store handle.
pub struct Assistant<E, S, W, L>
where
    E: Embedder,
    S: DocumentStore,
    W: WebSearch,
    L: LanguageModel,
{
    embedder: E,
    store: S,
    search: W,
    llm: L,
    options: PipelineOptions,
}

impl<E, S, W, L> Assistant<E, S, W, L>
where
    E: Embedder + Send + Sync,
    S: DocumentStore + Send + Sync,
    W: WebSearch + Send + Sync,
    L: LanguageModel + Send + Sync,
{
    pub fn new(embedder: E, store: S, search: W, llm: L) -> Self {
        Self {
            embedder,
            store,
            search,
            llm,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Extracts, embeds and stores one uploaded file. Nothing is written unless
    /// every earlier step succeeded.
    pub async fn ingest(&self, file_name: &str, bytes: &[u8]) -> Result<StoredDocument, IngestError> {
        let text = tokio::task::spawn_blocking({
            let file_name = file_name.to_string();
            let bytes = bytes.to_vec();
            move || extract_text(&file_name, &bytes)
        })
        .await
        .map_err(|error| IngestError::Task(error.to_string()))??;
        let embedding = self.embedder.embed(&text).await?;

        let document = StoredDocument {
            id: Uuid::new_v4().to_string(),
            embedding,
            text,
            metadata: build_metadata(file_name, bytes),
        };

        self.store.insert(document.clone()).await?;
        info!(
            id = %document.id,
            file_name = %document.metadata.file_name,
            chars = document.text.len(),
            "document stored"
        );

        Ok(document)
    }

    pub async fn ingest_path(&self, path: &Path) -> Result<StoredDocument, IngestError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;
        let bytes = tokio::fs::read(path).await?;
        self.ingest(file_name, &bytes).await
    }

    /// Ingests every supported file under `folder`; a failing file is reported
    /// and skipped without affecting the others.
    pub async fn ingest_folder(&self, folder: &Path) -> Result<IngestionReport, IngestError> {
        let files = discover_documents(folder);

        if files.is_empty() {
            return Err(IngestError::InvalidArgument(format!(
                "no txt or pdf files found in {}",
                folder.display()
            )));
        }

        let mut documents = Vec::new();
        let mut skipped_files = Vec::new();

        for path in files {
            match self.ingest_path(&path).await {
                Ok(document) => documents.push(document),
                Err(error) => {
                    warn!(path = %path.display(), reason = %error, "skipped file");
                    skipped_files.push(SkippedFile {
                        path,
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(IngestionReport {
            documents,
            skipped_files,
        })
    }

    pub async fn documents(&self) -> Result<Vec<StoredDocument>, StoreError> {
        self.store.list_all().await
    }

    pub async fn document_count(&self) -> Result<usize, StoreError> {
        self.store.count().await
    }

    pub async fn clear_documents(&self) -> Result<(), StoreError> {
        self.store.clear_all().await?;
        info!("all documents deleted");
        Ok(())
    }

    pub async fn ask_documents(&self, question: &str) -> Result<GroundedAnswer, QueryError> {
        if self.store.count().await? == 0 {
            return Err(QueryError::MissingDocuments);
        }
        if question.trim().is_empty() {
            return Err(QueryError::MissingQuestion);
        }

        let documents = match self.options.retrieval {
            RetrievalMode::AllDocuments => self.store.list_all().await?,
            RetrievalMode::Nearest { top_k } => {
                let query_vector = self.embedder.embed(question).await?;
                self.store
                    .nearest(&query_vector, top_k.max(1))
                    .await?
                    .into_iter()
                    .map(|(document, score)| {
                        debug!(id = %document.id, score, "retrieved document");
                        document
                    })
                    .collect()
            }
        };

        let context = documents
            .iter()
            .map(|document| document.text.as_str())
            .collect::<Vec<_>>()
            .join(self.options.context_separator);
        let sources = documents
            .iter()
            .map(|document| document.metadata.file_name.clone())
            .collect::<Vec<_>>();

        let prompt = document_prompt(&context, question);
        let answer = self.llm.complete(&prompt).await?;
        info!(
            model = self.llm.model(),
            documents = sources.len(),
            "document question answered"
        );

        Ok(GroundedAnswer {
            context,
            prompt,
            answer,
            sources,
        })
    }

    pub async fn ask_web(&self, question: &str) -> Result<WebQueryOutcome, QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::MissingQuestion);
        }

        let snippets = match self.search.search(question).await {
            Ok(snippets) => snippets,
            Err(error) => {
                warn!(reason = %error, "web search unavailable");
                return Ok(WebQueryOutcome::SearchUnavailable(error));
            }
        };

        if snippets.is_empty() {
            return Ok(WebQueryOutcome::NoResults);
        }

        let context = snippets.join("\n");
        let prompt = web_prompt(&context, question);
        let answer = self.llm.complete(&prompt).await?;
        info!(
            model = self.llm.model(),
            snippets = snippets.len(),
            "web question answered"
        );

        Ok(WebQueryOutcome::Answered(GroundedAnswer {
            context,
            prompt,
            answer,
            sources: Vec::new(),
        }))
    }

    /// One chat turn. The model sees only `message`; the session gains the
    /// user and assistant messages only when generation succeeds.
    pub async fn chat(
        &self,
        session: &mut ChatSession,
        message: &str,
    ) -> Result<String, QueryError> {
        if message.trim().is_empty() {
            return Err(QueryError::MissingQuestion);
        }

        let reply = self.llm.complete(message).await?;
        session.record_turn(message, reply.clone());
        Ok(reply)
    }
}
