//! Byte encoding of rendered HTML.

use partysite_core::OutputEncoding;
use std::borrow::Cow;
use std::fmt::Write;

/// Encode rendered HTML for writing.
///
/// `Ascii` replaces every non-ASCII character with a decimal numeric
/// character reference, so the page decodes the same under any
/// ASCII-compatible charset.
pub fn encode(html: &str, encoding: OutputEncoding) -> Cow<'_, [u8]> {
    match encoding {
        OutputEncoding::Utf8 => Cow::Borrowed(html.as_bytes()),
        OutputEncoding::Ascii if html.is_ascii() => Cow::Borrowed(html.as_bytes()),
        OutputEncoding::Ascii => {
            let mut out = String::with_capacity(html.len() + html.len() / 4);
            for c in html.chars() {
                if c.is_ascii() {
                    out.push(c);
                } else {
                    // Writing to a String cannot fail
                    let _ = write!(out, "&#{};", u32::from(c));
                }
            }
            Cow::Owned(out.into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_is_unchanged() {
        let html = "<p>café ✓</p>";
        assert_eq!(encode(html, OutputEncoding::Utf8).as_ref(), html.as_bytes());
    }

    #[test]
    fn test_ascii_uses_character_references() {
        let encoded = encode("<p>café ✓ 🦀</p>", OutputEncoding::Ascii);
        assert_eq!(
            std::str::from_utf8(&encoded).unwrap(),
            "<p>caf&#233; &#10003; &#129408;</p>"
        );
    }

    #[test]
    fn test_ascii_input_is_borrowed() {
        let encoded = encode("<p>plain</p>", OutputEncoding::Ascii);
        assert!(matches!(encoded, Cow::Borrowed(_)));
    }
}
