//! Markdown processing pipeline with custom extensions.

pub mod captions;
pub mod highlight;
pub mod inline;

use crate::frontmatter::split_frontmatter;
use pulldown_cmark::{html, Event, Options, Parser};

pub use captions::ImageCaptionRule;
pub use highlight::HighlightTransformer;
pub use inline::{InlineRule, InlineRules, InlineSpan};

/// Markdown processor with custom extensions
pub struct MarkdownProcessor {
    options: Options,
    inline_rules: InlineRules,
    highlighter: HighlightTransformer,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);

        let mut inline_rules = InlineRules::new();
        inline_rules.register(ImageCaptionRule);

        Self {
            options,
            inline_rules,
            highlighter: HighlightTransformer::new(),
        }
    }

    /// Add an inline rule to the chain, replacing one with the same name
    pub fn register_inline_rule(&mut self, rule: impl InlineRule + 'static) {
        self.inline_rules.register(rule);
    }

    pub fn inline_rules(&self) -> &InlineRules {
        &self.inline_rules
    }

    /// Convert a markdown body to HTML with all custom transforms
    pub fn convert(&self, markdown: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();

        let events = self.inline_rules.transform(events);
        let events = self.highlighter.transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Convert a whole source document, dropping its frontmatter block
    pub fn convert_document(&self, source: &str) -> String {
        let body = split_frontmatter(source)
            .map(|(_, body)| body)
            .unwrap_or(source);
        self.convert(body)
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
