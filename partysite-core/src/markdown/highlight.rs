//! Code syntax highlighting using syntect.
//!
//! Fenced blocks are highlighted with CSS classes rather than inline styles;
//! the stylesheet comes from [`css_for_theme`]. The fence language is never
//! guessed: unknown or missing languages render as plain text.

use super::html_escape;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

const CLASS_STYLE: ClassStyle = ClassStyle::Spaced;

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Whether syntect ships a theme with this name
pub fn theme_exists(name: &str) -> bool {
    theme_set().themes.contains_key(name)
}

/// Stylesheet matching the classes emitted by [`HighlightTransformer`]
pub fn css_for_theme(name: &str) -> Option<String> {
    let theme = theme_set().themes.get(name)?;
    css_for_theme_with_class_style(theme, CLASS_STYLE).ok()
}

/// Transformer for syntax highlighting code blocks
pub struct HighlightTransformer;

impl HighlightTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Transform events, adding syntax highlighting to fenced code blocks.
    ///
    /// Indented code blocks are not code: their text is rendered as a
    /// paragraph.
    pub fn transform(&self, events: Vec<Event<'_>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut block: Option<CodeBlockKind<'static>> = None;
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    block = Some(kind.into_static());
                    code_content.clear();
                }
                Event::Text(text) if block.is_some() => {
                    code_content.push_str(&text);
                }
                Event::End(TagEnd::CodeBlock) => match block.take() {
                    Some(CodeBlockKind::Fenced(info)) => {
                        let highlighted = self.highlight_code(&code_content, &info);
                        result.push(Event::Html(CowStr::from(highlighted)));
                    }
                    Some(CodeBlockKind::Indented) | None => {
                        result.push(Event::Start(Tag::Paragraph));
                        result.push(Event::Text(CowStr::from(
                            code_content.trim_end().to_string(),
                        )));
                        result.push(Event::End(TagEnd::Paragraph));
                    }
                },
                other => result.push(other.into_static()),
            }
        }

        result
    }

    fn highlight_code(&self, code: &str, info: &str) -> String {
        let lang = info.split_whitespace().next().unwrap_or("");
        let ss = syntax_set();
        let syntax = Some(lang)
            .filter(|l| !l.is_empty())
            .and_then(|l| ss.find_syntax_by_token(l))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, ss, CLASS_STYLE);
        let mut failed = None;
        for line in LinesWithEndings::from(code) {
            if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
                failed = Some(err);
                break;
            }
        }
        let body = match failed {
            None => generator.finalize(),
            Some(err) => {
                tracing::warn!("Highlighting failed for '{}' block: {}", lang, err);
                html_escape(code)
            }
        };

        let class = if lang.is_empty() {
            "highlight".to_string()
        } else {
            format!("language-{} highlight", html_escape(lang))
        };

        format!("<div class=\"{class}\"><pre><span></span><code>{body}</code></pre></div>\n")
    }
}

impl Default for HighlightTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{html, Parser};

    fn render(markdown: &str) -> String {
        let events = HighlightTransformer::new().transform(Parser::new(markdown).collect());
        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }

    #[test]
    fn test_fenced_block_uses_classes() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains(r#"<div class="language-rust highlight">"#));
        assert!(html.contains("<span class=\""));
        assert!(!html.contains("style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language_is_plain_text() {
        let html = render("```nosuchlang\n<tag> & more\n```\n");
        assert!(html.contains(r#"class="language-nosuchlang highlight""#));
        assert!(html.contains("&lt;tag&gt; &amp; more"));
    }

    #[test]
    fn test_fence_without_language() {
        let html = render("```\nplain\n```\n");
        assert!(html.contains(r#"<div class="highlight">"#));
        assert!(html.contains("plain"));
    }

    #[test]
    fn test_info_string_extras_ignored() {
        let html = render("```python title=\"x.py\"\nprint(1)\n```\n");
        assert!(html.contains(r#"<div class="language-python highlight">"#));
    }

    #[test]
    fn test_indented_block_is_paragraph() {
        let html = render("intro\n\n    not code\n");
        assert!(!html.contains("<pre>"));
        assert!(html.contains("<p>not code</p>"));
    }

    #[test]
    fn test_theme_lookup() {
        assert!(theme_exists("InspiredGitHub"));
        assert!(!theme_exists("does-not-exist"));

        let css = css_for_theme("InspiredGitHub").unwrap();
        assert!(css.contains('{'));
    }
}
