use async_trait::async_trait;

use crate::application::ports::{ExtractionError, FileLoader};
use crate::domain::ContentType;

pub struct PlainTextAdapter;

#[async_trait]
impl FileLoader for PlainTextAdapter {
    async fn extract_text(
        &self,
        data: &[u8],
        content_type: ContentType,
    ) -> Result<String, ExtractionError> {
        if content_type != ContentType::Text {
            return Err(ExtractionError::UnsupportedFormat(
                content_type.as_mime().to_string(),
            ));
        }

        // UTF-8 first, then Latin-1, which accepts any byte sequence.
        match String::from_utf8(data.to_vec()) {
            Ok(text) => Ok(text),
            Err(e) => Ok(e.into_bytes().iter().map(|&b| b as char).collect()),
        }
    }
}
