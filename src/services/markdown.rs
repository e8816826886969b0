use std::collections::HashMap;

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "InspiredGitHub";

/// One heading in the rendered document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading depth, 1 through 6
    pub level: u8,
    /// Plain text of the heading
    pub title: String,
    /// Anchor id attached to the heading element
    pub anchor: String,
}

/// Result of rendering one Markdown source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedBody {
    /// The article body as HTML
    pub html: String,
    /// Flat list of headings in document order
    pub toc: Vec<TocEntry>,
    /// The table of contents as nested lists, ready for a sidebar
    pub toc_html: String,
}

/// Converts stored Markdown to HTML with tables, footnotes, task lists,
/// heading anchors and highlighted code blocks. Rendering is a pure
/// function of the source text; the store keeps Markdown only and every
/// detail read renders afresh.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, source: &str) -> RenderedBody {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        let mut parser = Parser::new_ext(source, options);
        let mut events: Vec<Event> = Vec::new();
        let mut toc: Vec<TocEntry> = Vec::new();
        let mut seen_slugs: HashMap<String, usize> = HashMap::new();

        while let Some(event) = parser.next() {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let (inner, text) = collect_heading(&mut parser, level);
                    let anchor = match &id {
                        Some(explicit) => explicit.to_string(),
                        None => unique_slug(&text, &mut seen_slugs),
                    };

                    toc.push(TocEntry {
                        level: level as u8,
                        title: text,
                        anchor: anchor.clone(),
                    });

                    events.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(anchor.into()),
                        classes,
                        attrs,
                    }));
                    events.extend(inner);
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let code = collect_code(&mut parser);
                    let token = match &kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or("").to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };

                    match highlight_code(&code, &token) {
                        Some(highlighted) => events.push(Event::Html(highlighted.into())),
                        None => {
                            // Unknown language: keep the block verbatim and
                            // let the HTML writer escape it
                            events.push(Event::Start(Tag::CodeBlock(kind)));
                            events.push(Event::Text(code.into()));
                            events.push(Event::End(TagEnd::CodeBlock));
                        }
                    }
                }
                other => events.push(other),
            }
        }

        let mut body_html = String::new();
        html::push_html(&mut body_html, events.into_iter());

        let toc_html = toc_to_html(&toc);
        RenderedBody {
            html: body_html,
            toc,
            toc_html,
        }
    }
}

/// Buffers the events inside a heading and extracts its plain text.
fn collect_heading<'a>(
    parser: &mut Parser<'a>,
    level: HeadingLevel,
) -> (Vec<Event<'a>>, String) {
    let mut inner = Vec::new();
    let mut text = String::new();

    for event in parser.by_ref() {
        match event {
            Event::End(TagEnd::Heading(l)) if l == level => break,
            Event::Text(ref t) | Event::Code(ref t) => {
                text.push_str(t);
                inner.push(event);
            }
            other => inner.push(other),
        }
    }

    (inner, text)
}

fn collect_code(parser: &mut Parser) -> String {
    let mut code = String::new();
    for event in parser.by_ref() {
        match event {
            Event::End(TagEnd::CodeBlock) => break,
            Event::Text(t) => code.push_str(&t),
            _ => {}
        }
    }
    code
}

fn highlight_code(code: &str, token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    let syntax = SYNTAX_SET.find_syntax_by_token(token)?;
    let theme = &THEME_SET.themes[CODE_THEME];
    highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme).ok()
}

/// Derives a slug from heading text and makes it unique within the
/// document by suffixing repeats with `-1`, `-2`, ...
fn unique_slug(text: &str, seen: &mut HashMap<String, usize>) -> String {
    let base = slugify(text);
    match seen.get_mut(&base) {
        Some(count) => {
            *count += 1;
            format!("{}-{}", base, count)
        }
        None => {
            seen.insert(base.clone(), 0);
            base
        }
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn toc_to_html(toc: &[TocEntry]) -> String {
    let mut html = String::new();
    let mut depth = 0usize;

    for entry in toc {
        let level = entry.level as usize;
        while depth < level {
            html.push_str("<ul>");
            depth += 1;
        }
        while depth > level {
            html.push_str("</ul>");
            depth -= 1;
        }
        html.push_str("<li><a href=\"#");
        html.push_str(&entry.anchor);
        html.push_str("\">");
        html.push_str(&escape_text(&entry.title));
        html.push_str("</a></li>");
    }
    while depth > 0 {
        html.push_str("</ul>");
        depth -= 1;
    }

    html
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
