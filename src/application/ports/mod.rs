mod blob_store;
mod chat_repository;
mod completion_client;
mod document_repository;
mod file_loader;
mod repository_error;
mod subject_repository;

pub use blob_store::{BlobStore, BlobStoreError};
pub use chat_repository::ChatRepository;
pub use completion_client::{Completion, CompletionClient, CompletionError, Turn};
pub use document_repository::DocumentRepository;
pub use file_loader::{ExtractionError, FileLoader};
pub use repository_error::RepositoryError;
pub use subject_repository::SubjectRepository;
