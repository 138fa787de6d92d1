//! EPUB exporter implementation

use super::{AssembledBook, Exporter};
use crate::assets::media_type_for_name;
use crate::error::ExportError;
use crate::storage::OutputStore;
use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use std::io::Write;
use std::path::Path;

/// Path of a template stylesheet inside the EPUB container
pub fn epub_stylesheet_path(href: &str) -> String {
    let name = Path::new(href)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| href.replace('/', "_"));
    format!("css/{}", name)
}

/// Exporter for EPUB 3 containers
pub struct EpubExporter;

impl EpubExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EpubExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn encoding_failed(e: impl std::fmt::Display) -> ExportError {
    ExportError::EncodingFailed(e.to_string())
}

impl Exporter for EpubExporter {
    fn export(
        &self,
        book: &AssembledBook<'_>,
        store: &dyn OutputStore,
        writer: &mut dyn Write,
    ) -> Result<(), ExportError> {
        let mut builder = EpubBuilder::new(ZipLibrary::new().map_err(|e| {
            ExportError::EncodingFailed(format!("Failed to create zip: {}", e))
        })?)
        .map_err(|e| ExportError::EncodingFailed(format!("Failed to create EPUB builder: {}", e)))?;

        let metadata = book.metadata;
        builder
            .metadata("title", &metadata.title)
            .map_err(encoding_failed)?;
        for author in &metadata.authors {
            builder.metadata("author", author).map_err(encoding_failed)?;
        }
        builder
            .metadata("lang", &metadata.language)
            .map_err(encoding_failed)?;

        for href in book.stylesheets {
            match store.read(href) {
                Ok(data) => {
                    builder
                        .add_resource(epub_stylesheet_path(href), data.as_slice(), "text/css")
                        .map_err(encoding_failed)?;
                }
                Err(e) => tracing::warn!(href = %href, error = %e, "stylesheet not packaged"),
            }
        }

        // Only this build's assets; the asset directory may hold older files
        let mut packaged = 0;
        for path in book.assets {
            let data = match store.read(path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "asset not packaged");
                    continue;
                }
            };
            builder
                .add_resource(path, data.as_slice(), media_type_for_name(path))
                .map_err(encoding_failed)?;
            packaged += 1;
        }

        if book.inline_toc {
            builder.inline_toc();
        }

        for unit in &book.segmentation.chapters {
            builder
                .add_content(
                    EpubContent::new(&unit.file_name, unit.html.as_bytes())
                        .title(&unit.title)
                        .level(i32::from(unit.level))
                        .reftype(ReferenceType::Text),
                )
                .map_err(encoding_failed)?;
        }

        builder.generate(writer).map_err(encoding_failed)?;

        tracing::debug!(
            chapters = book.segmentation.chapters.len(),
            assets = packaged,
            "generated EPUB"
        );
        Ok(())
    }

    fn format_name(&self) -> &str {
        "EPUB"
    }

    fn file_extension(&self) -> &str {
        "epub"
    }

    fn mime_type(&self) -> &str {
        "application/epub+zip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_path() {
        assert_eq!(epub_stylesheet_path("theme/css/book.css"), "css/book.css");
        assert_eq!(epub_stylesheet_path("plain.css"), "css/plain.css");
    }
}
