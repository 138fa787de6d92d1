//! Page templates for the merged HTML output

use crate::error::ExportError;
use crate::patterns::{BODY_RE, URL_SCHEME_RE};
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};

/// An HTML page whose `<body>` receives the merged document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    /// File the template was read from; stylesheet hrefs resolve against it
    path: Option<PathBuf>,
}

impl Template {
    /// Wrap template markup that did not come from a file
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: None,
        }
    }

    /// Read a template file
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            ExportError::InvalidTemplate(format!("{}: {}", path.display(), e))
        })?;
        Ok(Self {
            source,
            path: Some(path.to_path_buf()),
        })
    }

    /// Minimal page used when no template is configured
    pub fn builtin(title: &str, language: &str) -> Self {
        Self::from_source(format!(
            "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{}</title>\n</head>\n<body>\n</body>\n</html>\n",
            html_escape::encode_double_quoted_attribute(language),
            html_escape::encode_text(title)
        ))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Directory that relative stylesheet hrefs resolve against
    pub fn base_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// Local stylesheet hrefs linked by the template, in document order
    pub fn stylesheets(&self) -> Vec<String> {
        let document = Html::parse_document(&self.source);
        let Ok(selector) = Selector::parse("link[rel~=stylesheet][href]") else {
            return Vec::new();
        };

        let mut hrefs: Vec<String> = Vec::new();
        for link in document.select(&selector) {
            let Some(href) = link.value().attr("href") else { continue };
            let href = href.trim();
            if href.is_empty() || href.starts_with("//") || URL_SCHEME_RE.is_match(href) {
                continue;
            }
            if !hrefs.iter().any(|h| h == href) {
                hrefs.push(href.to_string());
            }
        }
        hrefs
    }

    /// Place `content` inside the template body, replacing what was there
    pub fn render(&self, content: &str) -> Result<String, ExportError> {
        let (open, close) = BODY_RE
            .captures(&self.source)
            .and_then(|caps| caps.name("open").zip(caps.name("close")))
            .ok_or_else(|| {
                ExportError::InvalidTemplate("template has no <body> element".to_string())
            })?;

        let mut page = String::with_capacity(self.source.len() + content.len() + 2);
        page.push_str(&self.source[..open.end()]);
        page.push('\n');
        page.push_str(content);
        page.push('\n');
        page.push_str(&self.source[close.start()..]);
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<html><head>
<link rel="stylesheet" href="css/book.css">
<link rel="icon" href="favicon.ico">
<link rel="stylesheet" href="https://cdn.example.com/x.css">
<link rel="alternate stylesheet" href="css/dark.css">
</head><body class="book"><p>placeholder</p></body></html>"#;

    #[test]
    fn test_stylesheet_discovery() {
        let template = Template::from_source(TEMPLATE);
        assert_eq!(template.stylesheets(), vec!["css/book.css", "css/dark.css"]);
    }

    #[test]
    fn test_render_replaces_body() {
        let template = Template::from_source(TEMPLATE);
        let page = template.render("<h1>Hi</h1>").unwrap();

        assert!(page.contains("<body class=\"book\">\n<h1>Hi</h1>\n</body>"));
        assert!(!page.contains("placeholder"));
    }

    #[test]
    fn test_template_without_body() {
        let template = Template::from_source("<html><head></head></html>");
        assert!(matches!(
            template.render("x"),
            Err(ExportError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_builtin_escapes_title() {
        let template = Template::builtin("Tom & Jerry", "en");
        assert!(template.source().contains("<title>Tom &amp; Jerry</title>"));
        assert!(template.render("x").is_ok());
    }
}
