//! Ordered chain of inline rewrite rules.
//!
//! Links and images are cut out of the event stream as [`InlineSpan`]s and
//! offered to every registered [`InlineRule`], highest priority first. The
//! first rule returning `Some` replaces the span; when every rule returns
//! `None` the span is emitted unchanged and rendered by pulldown-cmark.

use pulldown_cmark::{Event, Tag};

/// A link or image construct: its opening tag and the events nested inside
/// it, without the closing tag.
#[derive(Debug, Clone)]
pub struct InlineSpan<'a> {
    pub tag: Tag<'a>,
    pub children: Vec<Event<'a>>,
}

/// A rewrite rule for inline spans
pub trait InlineRule {
    /// Registry name, unique within a chain
    fn name(&self) -> &'static str;

    /// Rules with higher priority are consulted first
    fn priority(&self) -> u32;

    /// Replacement events, or `None` to defer to the next rule
    fn handle(&self, span: &InlineSpan<'_>) -> Option<Vec<Event<'static>>>;
}

/// Registered rules, kept sorted by descending priority
#[derive(Default)]
pub struct InlineRules {
    rules: Vec<Box<dyn InlineRule>>,
}

impl InlineRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any rule with the same name.
    ///
    /// Rules of equal priority keep registration order.
    pub fn register(&mut self, rule: impl InlineRule + 'static) {
        self.rules.retain(|r| r.name() != rule.name());
        let at = self
            .rules
            .iter()
            .position(|r| r.priority() < rule.priority())
            .unwrap_or(self.rules.len());
        self.rules.insert(at, Box::new(rule));
    }

    /// Rule names in consultation order
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Offer a span to each rule in turn
    pub fn apply(&self, span: &InlineSpan<'_>) -> Option<Vec<Event<'static>>> {
        self.rules.iter().find_map(|rule| {
            let replacement = rule.handle(span);
            if replacement.is_some() {
                tracing::trace!("inline rule '{}' handled span", rule.name());
            }
            replacement
        })
    }

    /// Rewrite every link and image span in `events`
    pub fn transform(&self, events: Vec<Event<'_>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut iter = events.into_iter();

        while let Some(event) = iter.next() {
            match event {
                Event::Start(tag) if is_span_tag(&tag) => {
                    let span = InlineSpan {
                        tag,
                        children: collect_children(&mut iter),
                    };
                    match self.apply(&span) {
                        Some(replacement) => result.extend(replacement),
                        None => {
                            let InlineSpan { tag, children } = span;
                            let end = tag.to_end();
                            result.push(Event::Start(tag.into_static()));
                            // Declined links may still wrap images
                            result.extend(self.transform(children));
                            result.push(Event::End(end));
                        }
                    }
                }
                other => result.push(other.into_static()),
            }
        }

        result
    }
}

fn is_span_tag(tag: &Tag<'_>) -> bool {
    matches!(tag, Tag::Image { .. } | Tag::Link { .. })
}

/// Take events up to the end tag that closes the current span, consuming it.
fn collect_children<'a>(iter: &mut impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut depth = 0usize;
    let mut children = Vec::new();

    for event in iter.by_ref() {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            _ => {}
        }
        children.push(event);
    }

    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{CowStr, Parser, TagEnd};

    struct Fixed {
        name: &'static str,
        priority: u32,
        output: Option<&'static str>,
    }

    impl InlineRule for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn handle(&self, _span: &InlineSpan<'_>) -> Option<Vec<Event<'static>>> {
            self.output
                .map(|html| vec![Event::InlineHtml(CowStr::Borrowed(html))])
        }
    }

    fn fixed(name: &'static str, priority: u32, output: Option<&'static str>) -> Fixed {
        Fixed {
            name,
            priority,
            output,
        }
    }

    #[test]
    fn test_rules_sorted_by_priority() {
        let mut rules = InlineRules::new();
        rules.register(fixed("low", 10, None));
        rules.register(fixed("high", 200, None));
        rules.register(fixed("mid", 151, None));
        rules.register(fixed("mid-later", 151, None));

        assert_eq!(rules.names(), vec!["high", "mid", "mid-later", "low"]);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut rules = InlineRules::new();
        rules.register(fixed("rule", 10, None));
        rules.register(fixed("rule", 300, Some("<b>x</b>")));

        assert_eq!(rules.names(), vec!["rule"]);
    }

    #[test]
    fn test_first_handling_rule_wins() {
        let mut rules = InlineRules::new();
        rules.register(fixed("declines", 300, None));
        rules.register(fixed("wins", 200, Some("<i>won</i>")));
        rules.register(fixed("never", 100, Some("<i>lost</i>")));

        let events: Vec<Event> = Parser::new("![alt](a.png)").collect();
        let out = rules.transform(events);

        assert!(out.contains(&Event::InlineHtml(CowStr::Borrowed("<i>won</i>"))));
        assert!(!out.contains(&Event::InlineHtml(CowStr::Borrowed("<i>lost</i>"))));
    }

    #[test]
    fn test_declined_span_passes_through() {
        let rules = InlineRules::new();
        let events: Vec<Event> = Parser::new("see [docs](https://example.com) now").collect();
        let expected: Vec<Event<'static>> =
            events.iter().cloned().map(Event::into_static).collect();

        assert_eq!(rules.transform(events), expected);
    }

    #[test]
    fn test_children_exclude_closing_tag() {
        let events: Vec<Event> = Parser::new("[*a* b](x)").collect();
        let mut iter = events.into_iter().skip_while(|e| !matches!(e, Event::Start(Tag::Link { .. })));
        iter.next();
        let children = collect_children(&mut iter);

        assert_eq!(children.first(), Some(&Event::Start(Tag::Emphasis)));
        assert_eq!(children.last(), Some(&Event::Text(CowStr::Borrowed(" b"))));
        assert_eq!(iter.next(), Some(Event::End(TagEnd::Paragraph)));
    }
}
