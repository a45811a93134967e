//! Image captions: `![caption](src "title")` becomes a linked figure.

use super::inline::{InlineRule, InlineSpan};
use super::html_escape;
use pulldown_cmark::{html, CowStr, Event, LinkType, Tag};

/// Above the default image rendering, below raw HTML handling
pub const IMAGE_CAPTION_PRIORITY: u32 = 151;

/// Renders inline images as `<figure>` with the description as `<figcaption>`.
///
/// The image is wrapped in a link opening the full-size file in a new tab.
pub struct ImageCaptionRule;

impl InlineRule for ImageCaptionRule {
    fn name(&self) -> &'static str {
        "imagecaption"
    }

    fn priority(&self) -> u32 {
        IMAGE_CAPTION_PRIORITY
    }

    fn handle(&self, span: &InlineSpan<'_>) -> Option<Vec<Event<'static>>> {
        let Tag::Image {
            link_type,
            dest_url,
            title,
            ..
        } = &span.tag
        else {
            return None;
        };

        let src = link_target(*link_type, dest_url)?;
        let caption = caption_html(&span.children);
        let title = (!title.is_empty()).then_some(title.as_ref());

        let html = render_figure(src, title, &caption);
        Some(vec![Event::InlineHtml(CowStr::from(html))])
    }
}

/// The image description rendered as inline HTML
fn caption_html(children: &[Event<'_>]) -> String {
    let mut caption = String::new();
    html::push_html(&mut caption, children.iter().cloned());
    caption
}

/// Only the inline `(src "title")` form carries a target; it may be empty
fn link_target<'a>(link_type: LinkType, dest_url: &'a str) -> Option<&'a str> {
    match link_type {
        LinkType::Inline => Some(dest_url),
        _ => None,
    }
}

/// `caption` is already HTML; `src` and `title` are escaped here.
pub fn render_figure(src: &str, title: Option<&str>, caption: &str) -> String {
    let src = html_escape(src);
    let title_attr = title
        .map(|t| format!(" title=\"{}\"", html_escape(t)))
        .unwrap_or_default();

    format!(
        "<figure><a href=\"{src}\" target=\"_blank\"><img src=\"{src}\"{title_attr}></a><figcaption>{caption}</figcaption></figure>"
    )
}
