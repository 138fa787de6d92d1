//! Exporters for the assembled book

mod epub;
mod html;
mod template;

pub use epub::{epub_stylesheet_path, EpubExporter};
pub use html::HtmlExporter;
pub use template::Template;

use crate::error::ExportError;
use crate::segment::Segmentation;
use crate::storage::OutputStore;
use crate::types::MergedDocument;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Descriptive metadata carried into every output format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    pub language: String,
    pub authors: Vec<String>,
}

/// Everything an exporter reads
pub struct AssembledBook<'a> {
    pub metadata: &'a BookMetadata,
    pub document: &'a MergedDocument,
    pub segmentation: &'a Segmentation,
    pub template: &'a Template,
    /// Store paths of the template's stylesheets, already copied
    pub stylesheets: &'a [String],
    /// Store paths of the assets the document references
    pub assets: &'a [String],
    /// Whether the EPUB gets a generated contents page
    pub inline_toc: bool,
}

/// Trait for exporting the assembled book to an output format
pub trait Exporter: Send + Sync {
    /// Write the book to a writer. Stored assets are read through `store`.
    fn export(
        &self,
        book: &AssembledBook<'_>,
        store: &dyn OutputStore,
        writer: &mut dyn Write,
    ) -> Result<(), ExportError>;

    /// Format name (e.g., "HTML", "EPUB")
    fn format_name(&self) -> &str;

    /// File extension for this format
    fn file_extension(&self) -> &str;

    /// MIME type for this format
    fn mime_type(&self) -> &str;
}

/// Get an exporter by format name
pub fn exporter_for_format(format: &str) -> Option<Box<dyn Exporter>> {
    match format.to_lowercase().as_str() {
        "html" | "htm" => Some(Box::new(HtmlExporter::new())),
        "epub" => Some(Box::new(EpubExporter::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        assert_eq!(exporter_for_format("EPUB").unwrap().file_extension(), "epub");
        assert_eq!(exporter_for_format("html").unwrap().mime_type(), "text/html");
        assert!(exporter_for_format("docx").is_none());
    }
}
