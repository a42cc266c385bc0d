//! Markdown → HTML rendering via pulldown-cmark.
//!
//! Options mirror what blog templates usually expect from a GitHub-flavoured
//! renderer. `breaks` is on by default: a single newline inside a paragraph
//! becomes `<br />` instead of collapsing into a space.

use pulldown_cmark::{Event, Options, Parser, html};
use serde::{Deserialize, Serialize};

/// Renderer switches, read from the `[render]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Render soft line breaks as `<br />`.
    pub breaks: bool,
    pub tables: bool,
    pub strikethrough: bool,
    pub footnotes: bool,
    pub tasklists: bool,
    /// Curly quotes, en/em dashes, ellipses.
    pub smart_punctuation: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            breaks: true,
            tables: true,
            strikethrough: true,
            footnotes: false,
            tasklists: false,
            smart_punctuation: false,
        }
    }
}

impl RenderOptions {
    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.set(Options::ENABLE_SMART_PUNCTUATION, self.smart_punctuation);
        options
    }
}

pub fn render(text: &str, options: &RenderOptions) -> String {
    let breaks = options.breaks;
    let parser = Parser::new_ext(text, options.parser_options()).map(|event| match event {
        Event::SoftBreak if breaks => Event::HardBreak,
        other => other,
    });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
