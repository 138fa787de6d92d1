//! Markdown to HTML fragment conversion
//!
//! The grammar itself is `pulldown-cmark`'s; this module only decides how
//! headings, code blocks and list items are written, through the
//! [`RenderHooks`] capability trait.

mod markdown;

pub use markdown::MarkdownConverter;

/// Converts one chapter's Markdown text into an HTML fragment.
///
/// Implementations are shared by every pipeline worker and must not keep
/// mutable state between calls.
pub trait FragmentConverter: Send + Sync {
    fn convert(&self, markdown: &str) -> String;
}

/// Element-level rendering overrides used by the converter
pub trait RenderHooks {
    /// Render a heading. `text` is the plain text content (used for the
    /// anchor), `inner_html` the already rendered inline markup, and `id`
    /// an explicit `{#id}` attribute if the source carried one.
    fn render_heading(&self, level: u32, text: &str, inner_html: &str, id: Option<&str>) -> String;

    /// Render a fenced or indented code block
    fn render_code_block(&self, lang: Option<&str>, code: &str) -> String;

    /// Render the opening markup of a list item; `task` is `Some(checked)`
    /// for task-list items
    fn render_list_item(&self, task: Option<bool>) -> String;
}
