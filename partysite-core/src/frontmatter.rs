//! Frontmatter parsing from markdown files.
//!
//! A source document starts with a `---` line, a YAML mapping, and a closing
//! `---` (or `...`) line. The mapping is validated field by field so that a
//! broken header reports every problem at once.

use chrono::NaiveDate;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

const KNOWN_KEYS: &[&str] = &["title", "authors", "date", "template", "draft"];

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frontmatter missing or broken")]
    Missing,

    #[error("frontmatter block is not terminated")]
    Unterminated,

    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("frontmatter must be a key-value mapping")]
    NotAMapping,

    #[error("invalid frontmatter: {}", join_violations(.0))]
    Invalid(Vec<FieldViolation>),
}

/// One field that failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub problem: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.problem)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validated frontmatter of a post or index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    pub title: String,
    pub authors: Vec<String>,
    pub date: NaiveDate,
    pub template: Option<String>,
    pub draft: bool,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?(?:---|\.\.\.)[ \t]*(?:\r?\n|\z)(.*)\z")
            .unwrap()
    })
}

/// Delimiter lines may carry trailing spaces and tabs only
fn trim_delimiter(line: &str) -> &str {
    line.trim_end_matches([' ', '\t'])
}

fn is_opening(line: &str) -> bool {
    trim_delimiter(line) == "---"
}

fn is_closing(line: &str) -> bool {
    matches!(trim_delimiter(line), "---" | "...")
}

/// Split a document into its raw YAML block and markdown body.
///
/// Returns `None` when the document does not start with a complete block.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let captures = frontmatter_regex().captures(content)?;
    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());
    Some((yaml, body))
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body).
///
/// # Example
///
/// ```
/// use partysite_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\nauthors: [alice]\ndate: 2025-01-01\n---\n# Hello World\n";
///
/// let (fm, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.title, "My Post");
/// assert!(fm.draft);
/// assert!(body.starts_with("# Hello World"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let (yaml, body) = split_frontmatter(content).ok_or_else(|| {
        if content.lines().next().is_some_and(is_opening) {
            FrontmatterError::Unterminated
        } else {
            FrontmatterError::Missing
        }
    })?;
    Ok((parse_yaml_block(yaml)?, body))
}

/// Read only the frontmatter block of the file at `path`.
///
/// Reading stops at the closing delimiter; the file handle is dropped before
/// the block is parsed.
pub fn read_frontmatter(path: &Path) -> Result<Frontmatter, FrontmatterError> {
    let yaml = {
        let reader = BufReader::new(File::open(path)?);
        read_block(reader.lines())?
    };
    parse_yaml_block(&yaml)
}

fn read_block<I>(mut lines: I) -> Result<String, FrontmatterError>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    match lines.next().transpose()? {
        Some(first) if is_opening(&first) => {}
        _ => return Err(FrontmatterError::Missing),
    }

    let mut yaml = String::new();
    for line in lines {
        let line = line?;
        if is_closing(&line) {
            return Ok(yaml);
        }
        yaml.push_str(&line);
        yaml.push('\n');
    }
    Err(FrontmatterError::Unterminated)
}

fn parse_yaml_block(yaml: &str) -> Result<Frontmatter, FrontmatterError> {
    let value: Value = serde_yaml::from_str(yaml)?;
    let Value::Mapping(map) = value else {
        return Err(FrontmatterError::NotAMapping);
    };
    validate(&map)
}

fn validate(map: &Mapping) -> Result<Frontmatter, FrontmatterError> {
    for key in map.keys() {
        if let Some(key) = key.as_str() {
            if !KNOWN_KEYS.contains(&key) {
                tracing::debug!("Ignoring unknown frontmatter key '{}'", key);
            }
        }
    }

    let mut violations = Vec::new();

    let title = required::<String>(map, "title", "a string", &mut violations);
    let authors = required::<Vec<String>>(map, "authors", "a list of strings", &mut violations);
    let date = required::<NaiveDate>(map, "date", "a calendar date (YYYY-MM-DD)", &mut violations);
    let template = optional::<Option<String>>(map, "template", "a string", &mut violations)
        .flatten();
    let draft = optional::<bool>(map, "draft", "a boolean", &mut violations).unwrap_or(true);

    match (title, authors, date) {
        (Some(title), Some(authors), Some(date)) if violations.is_empty() => Ok(Frontmatter {
            title,
            authors,
            date,
            template,
            draft,
        }),
        _ => Err(FrontmatterError::Invalid(violations)),
    }
}

fn required<T: DeserializeOwned>(
    map: &Mapping,
    field: &'static str,
    expected: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<T> {
    if map.get(field).is_none() {
        violations.push(FieldViolation {
            field,
            problem: format!("is missing (expected {expected})"),
        });
        return None;
    }
    optional(map, field, expected, violations)
}

fn optional<T: DeserializeOwned>(
    map: &Mapping,
    field: &'static str,
    expected: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<T> {
    let value = map.get(field)?;
    match serde_yaml::from_value::<T>(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            violations.push(FieldViolation {
                field,
                problem: format!("must be {expected}"),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Test Post
authors:
  - alice
  - bob
date: 2024-01-01
template: longform
draft: false
---

# Hello World

This is the content."#;

        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title, "Test Post");
        assert_eq!(fm.authors, vec!["alice", "bob"]);
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(fm.template.as_deref(), Some("longform"));
        assert!(!fm.draft);
        assert!(body.contains("# Hello World"));
        assert!(!body.contains("title:"));
    }

    #[test]
    fn test_draft_defaults_to_true() {
        let content = "---\ntitle: T\nauthors: [a]\ndate: 2023-05-06\n---\nbody";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert!(fm.draft);
        assert!(fm.template.is_none());
    }

    #[test]
    fn test_explicit_draft_is_kept() {
        for (raw, expected) in [("true", true), ("false", false)] {
            let content = format!("---\ntitle: T\nauthors: [a]\ndate: 2023-05-06\ndraft: {raw}\n---\n");
            let (fm, _) = parse_frontmatter(&content).unwrap();
            assert_eq!(fm.draft, expected);
        }
    }

    #[test]
    fn test_null_template_means_default() {
        let content = "---\ntitle: T\nauthors: [a]\ndate: 2023-05-06\ntemplate: null\n---\n";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert!(fm.template.is_none());
    }

    #[test]
    fn test_dot_terminator_accepted() {
        let content = "---\ntitle: T\nauthors: [a]\ndate: 2023-05-06\n...\nbody text";
        let (_, body) = parse_frontmatter(content).unwrap();
        assert_eq!(body, "body text");
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::Missing)
        ));
    }

    #[test]
    fn test_unterminated_block() {
        let content = "---\ntitle: T\nauthors: [a]\n";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::Unterminated)
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let content = r#"---
title: Test
invalid yaml: [unclosed
---

Content."#;

        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::YamlError(_))
        ));
    }

    #[test]
    fn test_sequence_is_not_a_mapping() {
        let content = "---\n- one\n- two\n---\n";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::NotAMapping)
        ));
    }

    #[test]
    fn test_every_violation_is_reported() {
        let content = r#"---
title: 42
authors: alice
draft: maybe
---
"#;

        let result = parse_frontmatter(content);
        let Err(FrontmatterError::Invalid(violations)) = result else {
            panic!("Expected Invalid error");
        };
        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["title", "authors", "date", "draft"]);
        assert!(violations[2].problem.contains("missing"));
    }

    #[test]
    fn test_bad_date_rejected() {
        let content = "---\ntitle: T\nauthors: [a]\ndate: last tuesday\n---\n";
        let Err(FrontmatterError::Invalid(violations)) = parse_frontmatter(content) else {
            panic!("Expected Invalid error");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "date");
    }

    #[test]
    fn test_error_message_lists_fields() {
        let err = parse_frontmatter("---\nauthors: [a]\n---\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`title` is missing"));
        assert!(message.contains("`date` is missing"));
    }

    #[test]
    fn test_read_frontmatter_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "---\ntitle: From Disk\nauthors: [carol]\ndate: 2022-02-02\ndraft: false\n---\n# Body\n"
        )
        .unwrap();

        let fm = read_frontmatter(file.path()).unwrap();
        assert_eq!(fm.title, "From Disk");
        assert!(!fm.draft);
    }

    #[test]
    fn test_read_frontmatter_missing_block() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "# No header\n").unwrap();

        assert!(matches!(
            read_frontmatter(file.path()),
            Err(FrontmatterError::Missing)
        ));
    }

    #[test]
    fn test_read_frontmatter_unterminated() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "---\ntitle: Open\n").unwrap();

        assert!(matches!(
            read_frontmatter(file.path()),
            Err(FrontmatterError::Unterminated)
        ));
    }

    #[test]
    fn test_reader_and_splitter_agree_on_delimiters() {
        let header = "title: Edge\nauthors: [dave]\ndate: 2024-05-05\n";
        let cases = [
            (format!("--- \t\n{header}... \n# Body\n"), true),
            (format!("---\u{a0}\n{header}---\n# Body\n"), false),
            (format!("---\n{header}---\u{2003}\n# Body\n"), false),
        ];

        for (content, valid) in cases {
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "{content}").unwrap();

            let read = read_frontmatter(file.path());
            let split = split_frontmatter(&content);
            assert_eq!(read.is_ok(), valid, "read {content:?}");
            assert_eq!(split.is_some(), valid, "split {content:?}");
            if let Some((_, body)) = split {
                assert_eq!(body, "# Body\n");
            }
        }
    }
}
