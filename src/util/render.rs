//! Assistant message rendering.
//!
//! DESIGN
//! ======
//! Markdown mode renders HTML through `pulldown-cmark`, drops every raw HTML
//! event and blanks link and image URLs whose scheme is not http, https or
//! mailto. Relative URLs pass through. Text mode escapes the reply and
//! keeps line breaks. The mode is read at render time only; messages already
//! rendered are not touched when it changes.

use std::fmt;
use std::str::FromStr;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    Text,
    #[default]
    Markdown,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown render mode '{other}' (expected 'text' or 'markdown')")),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
        })
    }
}

/// Render assistant text as an HTML fragment in `mode`.
#[must_use]
pub fn render_assistant(text: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::Markdown => render_markdown_html(text),
        RenderMode::Text => render_plain_html(text),
    }
}

pub fn render_markdown_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).filter_map(|event| match event {
        Event::Html(_) | Event::InlineHtml(_) => None,
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Some(Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        })),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Some(Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        })),
        other => Some(other),
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_allowed_url(&url) { url } else { CowStr::Borrowed("") }
}

/// Relative URLs and http, https or mailto. Whitespace and control characters
/// are ignored when reading the scheme, as browsers do.
#[must_use]
pub fn is_allowed_url(url: &str) -> bool {
    let cleaned: String = url.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    match cleaned.find([':', '/', '?', '#']) {
        Some(at) if cleaned[at..].starts_with(':') => {
            matches!(cleaned[..at].to_ascii_lowercase().as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}

/// Escaped text with `<br>` for newlines.
#[must_use]
pub fn render_plain_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Visible text of an HTML fragment: tags dropped, common entities decoded.
/// Used to pull the ticket description out of its rendered form.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
