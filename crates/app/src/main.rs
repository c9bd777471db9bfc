use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use docqa_core::{
    Assistant, CharacterNgramEmbedder, ChatSession, DocumentStore, Embedder, LanguageModel,
    OllamaClient, OllamaConfig, OllamaEmbedder, PipelineOptions, RetrievalMode, SerpApiClient,
    SerpApiConfig, SqliteStore, StoredDocument, WebQueryOutcome, WebSearch, DEFAULT_COLLECTION,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_SEARCH_ENDPOINT,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docqa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite file holding the document collection
    #[arg(long, env = "DOCQA_DB_PATH", default_value = "docqa_db/documents.sqlite3")]
    db_path: PathBuf,

    /// Collection name inside the database
    #[arg(long, env = "DOCQA_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    /// Model used for answers and chat
    #[arg(long, env = "DOCQA_LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    llm_model: String,

    /// Sentence-embedding model served by Ollama
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Embedding length; must match the model and the existing collection
    #[arg(long, env = "DOCQA_EMBEDDING_DIMENSIONS", default_value = "384")]
    embedding_dimensions: usize,

    /// Use the built-in hashed n-gram embedder instead of the model.
    #[arg(long, default_value_t = false)]
    offline_embeddings: bool,

    /// Search API base URL
    #[arg(long, env = "SERPAPI_URL", default_value = DEFAULT_SEARCH_ENDPOINT)]
    search_url: String,

    /// Search API key
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    search_api_key: Option<String>,

    /// How document questions pick their context
    #[arg(long, env = "DOCQA_RETRIEVAL", value_enum, default_value = "nearest")]
    retrieval: Retrieval,

    /// Documents used as context with nearest retrieval
    #[arg(long, env = "DOCQA_TOP_K", default_value = "3")]
    top_k: usize,

    /// Maximum chat messages kept per session (unbounded when unset)
    #[arg(long, env = "DOCQA_CHAT_HISTORY_LIMIT")]
    chat_history_limit: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Retrieval {
    /// The documents closest to the question.
    Nearest,
    /// Every stored document.
    All,
}

#[derive(Subcommand)]
enum Command {
    /// Store one txt or pdf file.
    Upload {
        #[arg(long)]
        file: PathBuf,
    },
    /// Store every txt and pdf file under a folder.
    UploadFolder {
        #[arg(long)]
        folder: PathBuf,
    },
    /// List stored documents.
    Documents {
        /// Characters of each document to preview.
        #[arg(long, default_value = "1000")]
        preview_chars: usize,
    },
    /// Delete every stored document.
    Clear {
        /// Confirm deletion.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Answer a question from the stored documents.
    Ask {
        #[arg(long)]
        question: String,
    },
    /// Answer a question from web search snippets.
    Web {
        #[arg(long)]
        question: String,
    },
    /// Chat with the model; one message per line, `/exit` or EOF to quit.
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder: Box<dyn Embedder + Send + Sync> = if cli.offline_embeddings {
        Box::new(CharacterNgramEmbedder {
            dimensions: cli.embedding_dimensions,
        })
    } else {
        Box::new(OllamaEmbedder::new(
            &cli.ollama_url,
            &cli.embedding_model,
            cli.embedding_dimensions,
        ))
    };

    let store = SqliteStore::open(&cli.db_path, &cli.collection, embedder.dimensions())?;
    let search = SerpApiClient::new(
        SerpApiConfig {
            endpoint: cli.search_url.clone(),
            ..SerpApiConfig::default()
        }
        .with_api_key(cli.search_api_key.clone()),
    );
    let llm = OllamaClient::new(OllamaConfig {
        base_url: cli.ollama_url.clone(),
        model: cli.llm_model.clone(),
    });

    let retrieval = match cli.retrieval {
        Retrieval::Nearest => RetrievalMode::Nearest { top_k: cli.top_k },
        Retrieval::All => RetrievalMode::AllDocuments,
    };
    let assistant = Assistant::new(embedder, store, search, llm).with_options(PipelineOptions {
        retrieval,
        ..PipelineOptions::default()
    });

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        db_path = %cli.db_path.display(),
        collection = %cli.collection,
        "docqa boot"
    );

    match cli.command {
        Command::Upload { file } => match assistant.ingest_path(&file).await {
            Ok(document) => println!(
                "File '{}' successfully added as {}.",
                document.metadata.file_name, document.id
            ),
            Err(error) => println!("Error processing the file: {error}"),
        },
        Command::UploadFolder { folder } => match assistant.ingest_folder(&folder).await {
            Ok(report) => {
                for skipped in &report.skipped_files {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped file");
                }
                println!(
                    "{} documents added, {} skipped at {}",
                    report.documents.len(),
                    report.skipped_files.len(),
                    Utc::now().to_rfc3339()
                );
            }
            Err(error) => println!("Error processing the folder: {error}"),
        },
        Command::Documents { preview_chars } => match assistant.documents().await {
            Ok(documents) if documents.is_empty() => println!("No saved documents found."),
            Ok(documents) => print_documents(&documents, preview_chars),
            Err(error) => println!("Error reading documents: {error}"),
        },
        Command::Clear { yes } => {
            if !yes {
                println!("Refusing to delete all documents without --yes.");
            } else {
                match assistant.clear_documents().await {
                    Ok(()) => println!("deleted!"),
                    Err(error) => println!("Error deleting documents: {error}"),
                }
            }
        }
        Command::Ask { question } => match assistant.ask_documents(&question).await {
            Ok(answer) => {
                println!("AI Response:");
                println!("{}", answer.answer);
                if !answer.sources.is_empty() {
                    println!("sources: {}", answer.sources.join(", "));
                }
            }
            Err(error) if error.is_precondition() => {
                println!("Please upload a file and enter a question to proceed. ({error})")
            }
            Err(error) => println!("Error: {error}"),
        },
        Command::Web { question } => match assistant.ask_web(&question).await {
            Ok(WebQueryOutcome::Answered(answer)) => {
                println!("AI Response from Web Context:");
                println!("{}", answer.answer);
            }
            Ok(WebQueryOutcome::NoResults) => println!("No results found."),
            Ok(WebQueryOutcome::SearchUnavailable(error)) => {
                println!("Error searching the web: {error}")
            }
            Err(error) if error.is_precondition() => {
                println!("Please enter a question to proceed.")
            }
            Err(error) => println!("Error with LLM response: {error}"),
        },
        Command::Chat => run_chat(&assistant, cli.chat_history_limit).await?,
    }

    Ok(())
}

fn print_documents(documents: &[StoredDocument], preview_chars: usize) {
    for (index, document) in documents.iter().enumerate() {
        let preview = document.text.chars().take(preview_chars).collect::<String>();
        println!("### Document {}", index + 1);
        println!(
            "file_name={} id={} uploaded_at={} size_bytes={}",
            document.metadata.file_name,
            document.id,
            document.metadata.uploaded_at.to_rfc3339(),
            document.metadata.size_bytes
        );
        println!("{preview}...");
    }
}

async fn run_chat<E, S, W, L>(
    assistant: &Assistant<E, S, W, L>,
    history_limit: Option<usize>,
) -> anyhow::Result<()>
where
    E: Embedder + Send + Sync,
    S: DocumentStore + Send + Sync,
    W: WebSearch + Send + Sync,
    L: LanguageModel + Send + Sync,
{
    let mut session = match history_limit {
        Some(limit) => ChatSession::with_limit(limit),
        None => ChatSession::new(),
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message == "/exit" {
            break;
        }
        if message.is_empty() {
            continue;
        }

        match assistant.chat(&mut session, message).await {
            Ok(reply) => println!("assistant> {reply}"),
            Err(error) => println!("Error: {error}"),
        }
    }

    info!(messages = session.len(), "chat session ended");
    Ok(())
}
