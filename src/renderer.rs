//! # Feature: Message Rendering
//!
//! Turns untrusted markdown into sanitized HTML bubbles and appends them to the transcript.
//! Raw HTML in a message is escaped and links with script-capable schemes are neutralised
//! before any HTML is produced, so rendered output is always safe to insert.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Sanitization is mandatory; the unsanitized markdown path is gone
//! - 1.0.0: Initial release with markdown bubbles and placeholder text

use crate::history::Role;
use crate::view::ChatView;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Shown instead of an empty bubble
pub const PLACEHOLDER_TEXT: &str = "🤖 I'm here to help.";

/// URL schemes allowed in links and images
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// A bubble ready for the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub role: Role,
    /// Source text after the placeholder fallback
    pub text: String,
    /// Sanitized HTML body of the bubble
    pub html: String,
}

impl RenderedMessage {
    /// CSS classes of the bubble container
    pub fn class_name(&self) -> String {
        format!("message {}", self.role.as_str())
    }

    /// Full bubble markup as inserted into the transcript
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="{}"><div class="bubble">{}</div></div>"#,
            self.class_name(),
            self.html
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageRenderer;

impl MessageRenderer {
    pub fn new() -> Self {
        MessageRenderer
    }

    /// Render `text` for `role`, falling back to the placeholder when empty
    pub fn render(&self, text: &str, role: Role) -> RenderedMessage {
        let text = if text.trim().is_empty() {
            PLACEHOLDER_TEXT
        } else {
            text
        };

        RenderedMessage {
            role,
            text: text.to_string(),
            html: markdown_to_html(text),
        }
    }

    /// Render and append to the transcript, keeping the newest bubble in view
    pub fn present(&self, view: &dyn ChatView, text: &str, role: Role) -> RenderedMessage {
        let message = self.render(text, role);
        view.append_message(&message);
        view.scroll_to_latest();
        message
    }
}

/// Markdown to sanitized HTML
pub fn markdown_to_html(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(input, options);

    let mut output = String::new();
    html::push_html(&mut output, parser.map(sanitize_event));
    output
}

/// Neutralise a single markdown event: raw HTML becomes escaped text and
/// links or images pointing at unsafe schemes lose their target.
pub fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed(""),
            title,
            id,
        }),
        other => other,
    }
}

/// Relative URLs and the schemes in `SAFE_SCHEMES` are safe
pub fn is_safe_url(url: &str) -> bool {
    // Browsers ignore whitespace and control characters inside a scheme
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_lowercase();

    match normalized.find(':') {
        None => true,
        Some(colon) => {
            let scheme = &normalized[..colon];
            if scheme.contains(&['/', '?', '#'][..]) {
                return true;
            }
            SAFE_SCHEMES.contains(&scheme)
        }
    }
}
