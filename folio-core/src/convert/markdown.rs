//! Markdown converter implementation

use super::{FragmentConverter, RenderHooks};
use crate::anchor::anchor_id;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};

/// Converter for Markdown chapter sources
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    /// Whether to enable tables extension
    enable_tables: bool,
    /// Whether to enable strikethrough extension
    enable_strikethrough: bool,
    /// Whether to enable footnotes extension
    enable_footnotes: bool,
    /// Whether to enable `- [x]` task lists
    enable_tasklists: bool,
}

impl MarkdownConverter {
    pub fn new() -> Self {
        Self {
            enable_tables: true,
            enable_strikethrough: true,
            enable_footnotes: true,
            enable_tasklists: true,
        }
    }

    /// Enable or disable tables parsing
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.enable_tables = enable;
        self
    }

    /// Enable or disable strikethrough parsing
    pub fn with_strikethrough(mut self, enable: bool) -> Self {
        self.enable_strikethrough = enable;
        self
    }

    /// Enable or disable footnotes parsing
    pub fn with_footnotes(mut self, enable: bool) -> Self {
        self.enable_footnotes = enable;
        self
    }

    /// Enable or disable task list parsing
    pub fn with_tasklists(mut self, enable: bool) -> Self {
        self.enable_tasklists = enable;
        self
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.enable_tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.enable_strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.enable_footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.enable_tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options
    }

    /// Replace headings, code blocks and list items with hook output
    fn apply_hooks<'a>(&self, events: &[Event<'a>]) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut i = 0;

        while i < events.len() {
            match &events[i] {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    let end = find_end_tag(events, i);
                    let inner = &events[i + 1..end];

                    let mut inner_html = String::new();
                    html::push_html(&mut inner_html, inner.iter().cloned());

                    let rendered = self.render_heading(
                        *level as u32,
                        &plain_text(inner),
                        &inner_html,
                        id.as_deref(),
                    );
                    out.push(Event::Html(CowStr::from(rendered)));
                    i = end + 1;
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let end = find_end_tag(events, i);
                    let code: String = events[i + 1..end]
                        .iter()
                        .filter_map(|e| match e {
                            Event::Text(text) => Some(text.as_ref()),
                            _ => None,
                        })
                        .collect();

                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split(|c: char| c.is_whitespace() || c == ',')
                            .next()
                            .filter(|l| !l.is_empty()),
                        CodeBlockKind::Indented => None,
                    };

                    out.push(Event::Html(CowStr::from(self.render_code_block(lang, &code))));
                    i = end + 1;
                }
                Event::Start(Tag::Item) => {
                    let task = match events.get(i + 1) {
                        Some(Event::TaskListMarker(checked)) => Some(*checked),
                        _ => None,
                    };
                    out.push(Event::Html(CowStr::from(self.render_list_item(task))));
                    i += if task.is_some() { 2 } else { 1 };
                }
                // Loose task items put the marker inside the item's paragraph
                Event::TaskListMarker(checked) => {
                    out.push(Event::InlineHtml(CowStr::from(task_checkbox(*checked))));
                    i += 1;
                }
                event => {
                    out.push(event.clone());
                    i += 1;
                }
            }
        }

        out
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentConverter for MarkdownConverter {
    fn convert(&self, markdown: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.parser_options()).collect();
        let events = self.apply_hooks(&events);

        let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

impl RenderHooks for MarkdownConverter {
    fn render_heading(&self, level: u32, text: &str, inner_html: &str, id: Option<&str>) -> String {
        let level = level.clamp(1, 6);
        let anchor = id.map(str::to_string).unwrap_or_else(|| anchor_id(text));
        if anchor.is_empty() {
            format!("<h{level}>{inner_html}</h{level}>\n")
        } else {
            format!(
                "<h{level} id=\"{}\">{inner_html}</h{level}>\n",
                html_escape::encode_double_quoted_attribute(&anchor)
            )
        }
    }

    fn render_code_block(&self, lang: Option<&str>, code: &str) -> String {
        let class_attr = lang
            .map(|l| {
                format!(
                    " class=\"language-{}\"",
                    html_escape::encode_double_quoted_attribute(l)
                )
            })
            .unwrap_or_default();
        format!(
            "<pre><code{}>{}</code></pre>\n",
            class_attr,
            html_escape::encode_text(code)
        )
    }

    fn render_list_item(&self, task: Option<bool>) -> String {
        match task {
            Some(checked) => format!("<li>{} ", task_checkbox(checked)),
            None => "<li>".to_string(),
        }
    }
}

fn task_checkbox(checked: bool) -> &'static str {
    if checked {
        r#"<input type="checkbox" disabled="disabled" checked="checked"/>"#
    } else {
        r#"<input type="checkbox" disabled="disabled"/>"#
    }
}

/// Find the index of the end event matching the start event at `start`
fn find_end_tag(events: &[Event], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, event) in events.iter().enumerate().skip(start) {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    events.len()
}

/// Plain text of a run of inline events
fn plain_text(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Text(text) | Event::Code(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect()
}
