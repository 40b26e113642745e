mod memory;
mod pg_chat_repository;
mod pg_document_repository;
mod pg_pool;
mod pg_subject_repository;

pub use memory::{MemoryChatRepository, MemoryDocumentRepository, MemorySubjectRepository};
pub use pg_chat_repository::PgChatRepository;
pub use pg_document_repository::PgDocumentRepository;
pub use pg_pool::create_pool;
pub use pg_subject_repository::PgSubjectRepository;
