//! String literal decoding.

/// A piece of a double-quoted string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringPart {
    /// Literal text with escapes resolved.
    Text(String),
    /// An interpolated `$name` (without the sigil).
    Variable(String),
}

/// Decodes a single-quoted literal, quotes included.
///
/// Only `\'` and `\\` are escapes; any other backslash is kept.
#[must_use]
pub fn unescape_single_quoted(raw: &str) -> String {
    let inner = strip_quotes(raw);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next == '\'' || next == '\\' => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decodes a double-quoted literal, quotes included, splitting out simple
/// `$name` interpolations.
#[must_use]
pub fn unescape_double_quoted(raw: &str) -> Vec<StringPart> {
    let inner = strip_quotes(raw);
    let mut parts = Vec::new();
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some('r') => text.push('\r'),
                Some('v') => text.push('\u{0b}'),
                Some('f') => text.push('\u{0c}'),
                Some('e') => text.push('\u{1b}'),
                Some('0') => text.push('\0'),
                Some(next @ ('\\' | '"' | '$')) => text.push(next),
                Some(other) => {
                    text.push('\\');
                    text.push(other);
                }
                None => text.push('\\'),
            },
            '$' if chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') =>
            {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !text.is_empty() {
                    parts.push(StringPart::Text(std::mem::take(&mut text)));
                }
                parts.push(StringPart::Variable(name));
            }
            _ => text.push(c),
        }
    }

    if !text.is_empty() || parts.is_empty() {
        parts.push(StringPart::Text(text));
    }
    parts
}

fn strip_quotes(raw: &str) -> &str {
    if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_quoted_escapes() {
        assert_eq!(unescape_single_quoted(r"'it\'s'"), "it's");
        assert_eq!(unescape_single_quoted(r"'a\\b'"), r"a\b");
        assert_eq!(unescape_single_quoted(r"'a\nb'"), r"a\nb");
    }

    #[test]
    fn test_double_quoted_escapes() {
        assert_eq!(
            unescape_double_quoted(r#""a\tb\n\$x""#),
            vec![StringPart::Text("a\tb\n$x".to_string())]
        );
    }

    #[test]
    fn test_double_quoted_interpolation() {
        assert_eq!(
            unescape_double_quoted(r#""x=$x, y=$y_2!""#),
            vec![
                StringPart::Text("x=".to_string()),
                StringPart::Variable("x".to_string()),
                StringPart::Text(", y=".to_string()),
                StringPart::Variable("y_2".to_string()),
                StringPart::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(
            unescape_double_quoted(r#""""#),
            vec![StringPart::Text(String::new())]
        );
    }

    #[test]
    fn test_dollar_without_name_is_text() {
        assert_eq!(
            unescape_double_quoted(r#""cost: $5""#),
            vec![StringPart::Text("cost: $5".to_string())]
        );
    }
}
