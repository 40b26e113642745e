use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{DocumentId, SubjectId};

/// An uploaded legal document and its processing results.
///
/// `extracted_text` and `summary` stay empty until the document reaches
/// `Processed`; a failed run never writes a partial summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub subject_id: SubjectId,
    pub title: String,
    pub storage_path: String,
    pub content_type: ContentType,
    pub size_bytes: u64,
    pub status: DocumentStatus,
    pub extracted_text: String,
    pub summary: String,
    pub summary_tokens: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(
        subject_id: SubjectId,
        title: String,
        content_type: ContentType,
        storage_path: String,
        size_bytes: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            subject_id,
            title,
            storage_path,
            content_type,
            size_bytes,
            status: DocumentStatus::Uploaded,
            extracted_text: String::new(),
            summary: String::new(),
            summary_tokens: 0,
            created_at: now,
            updated_at: now,
            processed_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Pdf,
    Docx,
    Doc,
    Text,
}

impl ContentType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/msword" => Some(Self::Doc),
            "text/plain" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Doc => "application/msword",
            Self::Text => "text/plain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Processed,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "UPLOADED",
            DocumentStatus::Processing => "PROCESSING",
            DocumentStatus::Processed => "PROCESSED",
            DocumentStatus::Error => "ERROR",
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPLOADED" => Ok(DocumentStatus::Uploaded),
            "PROCESSING" => Ok(DocumentStatus::Processing),
            "PROCESSED" => Ok(DocumentStatus::Processed),
            "ERROR" => Ok(DocumentStatus::Error),
            _ => Err(format!("Invalid document status: {}", s)),
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
