use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{ExtractionError, FileLoader};
use crate::domain::ContentType;

use super::text_sanitizer::clean_text;
use super::{DocxAdapter, PdfAdapter, PlainTextAdapter};

/// Dispatches extraction by declared media type and normalizes the result.
/// Legacy DOC uploads are rejected outright with a conversion hint.
pub struct CompositeFileLoader {
    adapters: HashMap<ContentType, Arc<dyn FileLoader>>,
}

impl CompositeFileLoader {
    pub fn new(adapters: Vec<(ContentType, Arc<dyn FileLoader>)>) -> Self {
        Self {
            adapters: adapters.into_iter().collect(),
        }
    }

    pub fn with_default_adapters() -> Self {
        Self::new(vec![
            (
                ContentType::Pdf,
                Arc::new(PdfAdapter::new()) as Arc<dyn FileLoader>,
            ),
            (
                ContentType::Docx,
                Arc::new(DocxAdapter::new()) as Arc<dyn FileLoader>,
            ),
            (
                ContentType::Text,
                Arc::new(PlainTextAdapter) as Arc<dyn FileLoader>,
            ),
        ])
    }
}

#[async_trait]
impl FileLoader for CompositeFileLoader {
    async fn extract_text(
        &self,
        data: &[u8],
        content_type: ContentType,
    ) -> Result<String, ExtractionError> {
        if content_type == ContentType::Doc {
            return Err(ExtractionError::UnsupportedFormat(
                "DOC is not supported; please convert the file to DOCX or PDF".to_string(),
            ));
        }

        let adapter = self.adapters.get(&content_type).ok_or_else(|| {
            ExtractionError::UnsupportedFormat(content_type.as_mime().to_string())
        })?;

        let raw = adapter.extract_text(data, content_type).await?;
        let cleaned = clean_text(&raw);
        if cleaned.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        Ok(cleaned)
    }
}
