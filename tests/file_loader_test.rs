use std::io::{Cursor, Write};

use lexchat::application::ports::{ExtractionError, FileLoader};
use lexchat::domain::ContentType;
use lexchat::infrastructure::text_processing::CompositeFileLoader;

fn loader() -> CompositeFileLoader {
    CompositeFileLoader::with_default_adapters()
}

fn build_docx(document_xml: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(document_xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn given_utf8_text_file_when_extracting_then_returns_cleaned_text() {
    let data = "Contract between   A and B.\n\n\nSigned today.\n".as_bytes();

    let text = loader().extract_text(data, ContentType::Text).await.unwrap();

    assert_eq!(text, "Contract between A and B.\nSigned today.");
}

#[tokio::test]
async fn given_latin1_text_file_when_extracting_then_falls_back_without_error() {
    // "café" encoded as Latin-1: 0xE9 is invalid UTF-8 on its own.
    let data = b"caf\xe9 agreement";

    let text = loader().extract_text(data, ContentType::Text).await.unwrap();

    assert_eq!(text, "café agreement");
}

#[tokio::test]
async fn given_empty_text_file_when_extracting_then_fails_with_empty_document() {
    let result = loader().extract_text(b"", ContentType::Text).await;

    assert!(matches!(result, Err(ExtractionError::EmptyDocument)));
}

#[tokio::test]
async fn given_whitespace_only_file_when_extracting_then_fails_with_empty_document() {
    let result = loader()
        .extract_text(b"  \n\n \t \n", ContentType::Text)
        .await;

    assert!(matches!(result, Err(ExtractionError::EmptyDocument)));
}

#[tokio::test]
async fn given_legacy_doc_when_extracting_then_fails_with_unsupported_format() {
    let data = [0xD0, 0xCF, 0x11, 0xE0];

    let result = loader().extract_text(&data, ContentType::Doc).await;

    assert!(matches!(result, Err(ExtractionError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn given_corrupted_pdf_bytes_when_extracting_then_fails_with_extraction_failed() {
    let data = b"not a pdf at all";

    let result = loader().extract_text(data, ContentType::Pdf).await;

    assert!(matches!(
        result,
        Err(ExtractionError::ExtractionFailed(_)) | Err(ExtractionError::EmptyDocument)
    ));
}

#[tokio::test]
async fn given_docx_with_paragraphs_and_table_when_extracting_then_body_precedes_cells() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t>First paragraph</w:t></w:r></w:p>
<w:p><w:r><w:t>Second paragraph</w:t></w:r></w:p>
<w:tbl>
<w:tr><w:tc><w:p><w:r><w:t>Cell A</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Cell B</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>Cell C</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Cell D</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>
</w:body>
</w:document>"#;
    let data = build_docx(xml);

    let text = loader()
        .extract_text(&data, ContentType::Docx)
        .await
        .unwrap();

    assert_eq!(
        text,
        "First paragraph\nSecond paragraph\nCell A Cell B\nCell C Cell D"
    );
}

#[tokio::test]
async fn given_docx_with_split_runs_when_extracting_then_runs_concatenate() {
    let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body><w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t xml:space="preserve">world &amp; peace</w:t></w:r></w:p></w:body>
</w:document>"#;
    let data = build_docx(xml);

    let text = loader()
        .extract_text(&data, ContentType::Docx)
        .await
        .unwrap();

    assert_eq!(text, "Hello world & peace");
}

#[tokio::test]
async fn given_garbage_bytes_as_docx_when_extracting_then_fails_with_extraction_failed() {
    let result = loader()
        .extract_text(b"definitely not a zip archive", ContentType::Docx)
        .await;

    assert!(matches!(result, Err(ExtractionError::ExtractionFailed(_))));
}

#[tokio::test]
async fn given_unknown_adapter_mapping_when_extracting_then_fails_with_unsupported_format() {
    let bare = CompositeFileLoader::new(vec![]);

    let result = bare.extract_text(b"some text", ContentType::Text).await;

    assert!(matches!(result, Err(ExtractionError::UnsupportedFormat(_))));
}
