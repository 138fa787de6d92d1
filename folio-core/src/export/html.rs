//! Merged HTML page exporter

use super::{AssembledBook, Exporter};
use crate::error::ExportError;
use crate::storage::OutputStore;
use std::io::Write;

/// Writes the merged document into the template page
pub struct HtmlExporter;

impl HtmlExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for HtmlExporter {
    fn export(
        &self,
        book: &AssembledBook<'_>,
        _store: &dyn OutputStore,
        writer: &mut dyn Write,
    ) -> Result<(), ExportError> {
        let page = book.template.render(book.document.as_str())?;
        writer
            .write_all(page.as_bytes())
            .map_err(|e| ExportError::EncodingFailed(e.to_string()))
    }

    fn format_name(&self) -> &str {
        "HTML"
    }

    fn file_extension(&self) -> &str {
        "html"
    }

    fn mime_type(&self) -> &str {
        "text/html"
    }
}
