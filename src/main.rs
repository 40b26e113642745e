use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use lexchat::application::ports::{
    BlobStore, ChatRepository, DocumentRepository, FileLoader, SubjectRepository,
};
use lexchat::application::services::{
    ChatService, ProcessingService, PromptAssembler, QuotaLedger,
};
use lexchat::domain::{Plan, Subject};
use lexchat::infrastructure::llm::create_completion_client;
use lexchat::infrastructure::observability::{init_tracing, TracingConfig};
use lexchat::infrastructure::persistence::{
    create_pool, MemoryChatRepository, MemoryDocumentRepository, MemorySubjectRepository,
    PgChatRepository, PgDocumentRepository, PgSubjectRepository,
};
use lexchat::infrastructure::storage::ObjectStoreBlobStore;
use lexchat::infrastructure::text_processing::CompositeFileLoader;
use lexchat::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();
    init_tracing(TracingConfig::default(), settings.server.port);

    let (documents, chats, subjects): (
        Arc<dyn DocumentRepository>,
        Arc<dyn ChatRepository>,
        Arc<dyn SubjectRepository>,
    ) = match settings.database.url.as_deref() {
        Some(url) => {
            let pool = create_pool(url, settings.database.max_connections).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            (
                Arc::new(PgDocumentRepository::new(pool.clone())),
                Arc::new(PgChatRepository::new(pool.clone())),
                Arc::new(PgSubjectRepository::new(pool)),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory repositories");
            let subjects = Arc::new(MemorySubjectRepository::new());
            let demo = Subject::new("demo@example.com".to_string(), Plan::Free);
            subjects.create(&demo).await?;
            tracing::info!(subject_id = %demo.id.as_uuid(), "Seeded demo subject");
            (
                Arc::new(MemoryDocumentRepository::new()),
                Arc::new(MemoryChatRepository::new()),
                subjects,
            )
        }
    };

    let blobs: Arc<dyn BlobStore> = Arc::new(ObjectStoreBlobStore::local(PathBuf::from(
        &settings.storage.root,
    ))?);
    let file_loader: Arc<dyn FileLoader> = Arc::new(CompositeFileLoader::with_default_adapters());
    let completion = create_completion_client(&settings.llm);
    let prompts = PromptAssembler::new(settings.prompt_settings());
    let ledger = QuotaLedger::new(settings.plan_limit_table());

    let processing_service = Arc::new(ProcessingService::new(
        Arc::clone(&documents),
        Arc::clone(&subjects),
        Arc::clone(&blobs),
        Arc::clone(&file_loader),
        Arc::clone(&completion),
        prompts.clone(),
        ledger,
        settings.processing_settings(),
    ));

    let chat_service = Arc::new(ChatService::new(
        chats,
        documents,
        subjects,
        completion,
        prompts,
        ledger,
        settings.chat_settings(),
    ));

    let state = AppState {
        processing_service,
        chat_service,
    };
    let router = create_router(state);

    let host: IpAddr = settings.server.host.parse()?;
    let addr = SocketAddr::from((host, settings.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
