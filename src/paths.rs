//! JSON Pointers (RFC 6901) locating values within schemas or validated instances.
use std::{borrow::Cow, fmt, str::FromStr};

use percent_encoding::percent_decode_str;

/// Errors that can occur while parsing a JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerError {
    /// A non-empty pointer must start with `/`.
    #[error("JSON Pointer '{pointer}' does not start with '/'")]
    MissingLeadingSlash { pointer: String },
    /// Percent-decoded bytes are not valid UTF-8.
    #[error("JSON Pointer '{pointer}' contains invalid percent-encoded data")]
    InvalidPercentEncoding { pointer: String },
}

/// A JSON Pointer represented as an ordered sequence of unescaped tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    /// Create an empty pointer, addressing the whole document.
    #[must_use]
    pub const fn new() -> Self {
        JsonPointer(Vec::new())
    }

    /// Parse a pointer from a URI fragment.
    ///
    /// The fragment may be percent-encoded, as produced by [`url::Url::fragment`].
    ///
    /// ```rust
    /// use jsonschema_vm::JsonPointer;
    ///
    /// let pointer = JsonPointer::parse("/definitions/a~1b").expect("Valid pointer");
    /// assert_eq!(pointer.tokens(), ["definitions", "a/b"]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment is neither empty nor starts with `/`, or if its
    /// percent-decoded form is not valid UTF-8.
    pub fn parse(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode_str(fragment).decode_utf8().map_err(|_| {
            PointerError::InvalidPercentEncoding {
                pointer: fragment.to_string(),
            }
        })?;
        if decoded.is_empty() {
            return Ok(JsonPointer::new());
        }
        let Some(rest) = decoded.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash {
                pointer: decoded.into_owned(),
            });
        };
        Ok(JsonPointer(
            rest.split('/')
                .map(|segment| unescape_segment(segment).into_owned())
                .collect(),
        ))
    }

    #[inline]
    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    #[inline]
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Unescaped tokens of this pointer.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonPointer::parse(s)
    }
}

impl From<Vec<String>> for JsonPointer {
    fn from(tokens: Vec<String>) -> Self {
        JsonPointer(tokens)
    }
}

impl From<&[&str]> for JsonPointer {
    fn from(tokens: &[&str]) -> Self {
        JsonPointer(tokens.iter().map(|token| (*token).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for JsonPointer {
    fn from(tokens: [&str; N]) -> Self {
        JsonPointer::from(&tokens[..])
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = String::with_capacity(self.0.iter().map(|t| t.len() + 1).sum());
        for token in &self.0 {
            buffer.push('/');
            write_escaped_str(&mut buffer, token);
        }
        f.write_str(&buffer)
    }
}

fn write_escaped_str(buffer: &mut String, value: &str) {
    let Some(mut escape_idx) = value.find(['~', '/']) else {
        buffer.push_str(value);
        return;
    };
    let mut remaining = value;
    loop {
        let (before, after) = remaining.split_at(escape_idx);
        buffer.push_str(before);
        match after.as_bytes()[0] {
            b'~' => buffer.push_str("~0"),
            b'/' => buffer.push_str("~1"),
            _ => unreachable!("Only `~` and `/` are searched for"),
        }
        remaining = &after[1..];
        if let Some(next_escape_idx) = remaining.find(['~', '/']) {
            escape_idx = next_escape_idx;
        } else {
            buffer.push_str(remaining);
            break;
        }
    }
}

/// Replace `~1` with `/` and `~0` with `~` in a single pass.
///
/// A `~` followed by anything else is kept verbatim.
fn unescape_segment(mut segment: &str) -> Cow<'_, str> {
    let Some(mut tilde_idx) = segment.find('~') else {
        return Cow::Borrowed(segment);
    };

    let mut buffer = String::with_capacity(segment.len());
    loop {
        let (before, after) = segment.split_at(tilde_idx);
        buffer.push_str(before);
        segment = &after[1..];
        let next_char_size = match segment.chars().next() {
            Some('1') => {
                buffer.push('/');
                1
            }
            Some('0') => {
                buffer.push('~');
                1
            }
            Some(next) => {
                buffer.push('~');
                buffer.push(next);
                next.len_utf8()
            }
            None => {
                buffer.push('~');
                break;
            }
        };
        segment = &segment[next_char_size..];
        let Some(next_tilde_idx) = segment.find('~') else {
            buffer.push_str(segment);
            break;
        };
        tilde_idx = next_tilde_idx;
    }
    Cow::Owned(buffer)
}
