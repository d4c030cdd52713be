//! Fail-fast input validation, performed before any provider call.

use switchboard_core::config::LimitsConfig;
use switchboard_core::Attachment;

/// The only media type accepted for uploads.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Input rejections, each with a distinct user-facing cause.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid file type '{0}'; please upload a PDF")]
    InvalidMediaType(String),
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },
    #[error("document has {pages} pages, exceeding the {limit} page limit")]
    TooManyPages { pages: usize, limit: usize },
    #[error("could not read the PDF file; it may be corrupted")]
    UnreadableFile,
    #[error("this endpoint requires an uploaded PDF file")]
    MissingFile,
}

/// Validate message bounds.
pub fn validate_message(message: &str, limits: &LimitsConfig) -> Result<(), ValidationError> {
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    let chars = message.chars().count();
    if chars > limits.max_message_chars {
        return Err(ValidationError::MessageTooLong(limits.max_message_chars));
    }
    Ok(())
}

/// Validate an uploaded file: media type, then size, then page count.
///
/// Checks are ordered cheapest first, so an oversize upload is never parsed.
pub fn validate_attachment(
    attachment: &Attachment,
    limits: &LimitsConfig,
) -> Result<(), ValidationError> {
    if attachment.content_type != PDF_MEDIA_TYPE {
        return Err(ValidationError::InvalidMediaType(
            attachment.content_type.clone(),
        ));
    }
    if attachment.bytes.len() > limits.max_file_bytes {
        return Err(ValidationError::FileTooLarge {
            size: attachment.bytes.len(),
            limit: limits.max_file_bytes,
        });
    }
    let pages = count_pdf_pages(&attachment.bytes)?;
    if pages > limits.max_file_pages {
        return Err(ValidationError::TooManyPages {
            pages,
            limit: limits.max_file_pages,
        });
    }
    Ok(())
}

/// Count the pages of a PDF by walking its page tree.
pub fn count_pdf_pages(bytes: &[u8]) -> Result<usize, ValidationError> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|_| ValidationError::UnreadableFile)?;
    Ok(document.get_pages().len())
}

// =============================================================================
// Test fixtures
// =============================================================================

/// Fixture PDFs for this crate's tests, synthesized with the same library
/// that backs validation.
#[cfg(test)]
pub(crate) mod testutil {
    use lopdf::{dictionary, Document, Object};

    /// Synthesize a minimal valid PDF with the given number of empty pages.
    pub(crate) fn make_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let content_id =
                    doc.add_object(lopdf::Stream::new(dictionary! {}, Vec::new()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                })
                .into()
            })
            .collect();

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("serialize fixture PDF");
        bytes
    }
}

// =============================================================================
// Tests
// =============================================================================
