//! Reply definitions
//!
//! Every server response decodes to exactly one [`Reply`] variant.
//!
//! Nesting depth is limited only by the size of the received frame, so
//! dropping, comparing and displaying a reply walk nested arrays with an
//! explicit stack instead of recursing. The derived `Clone` and `Debug`
//! still recurse.

use std::fmt;
use std::slice;

/// A decoded server reply
///
/// `Reply` implements `Drop`, so match on a reference (or use
/// [`Reply::into_array`] / [`Reply::into_bytes`]) to get at the contents.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `+OK\r\n`
    Status(String),

    /// `:1000\r\n`
    Integer(i64),

    /// `$3\r\nfoo\r\n`, or `$-1\r\n` for null
    Bulk(Option<Vec<u8>>),

    /// `-ERR unknown command\r\n`
    ///
    /// `message` is the whole line. `code` is its leading token when that
    /// token looks like an error code (`ERR`, `WRONGTYPE`, ...).
    Error {
        code: Option<String>,
        message: String,
    },

    /// `*2\r\n...`, or `*-1\r\n` for null
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// Create an Error reply, deriving the code from the message
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        let code = error_code(&message).map(str::to_string);
        Reply::Error { code, message }
    }

    /// True for the null bulk string and the null array
    pub fn is_null(&self) -> bool {
        matches!(self, Reply::Bulk(None) | Reply::Array(None))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error { .. })
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Payload of a Status or non-null Bulk reply
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Status(text) => Some(text.as_bytes()),
            Reply::Bulk(Some(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Elements of a non-null array
    pub fn into_array(mut self) -> Option<Vec<Reply>> {
        match &mut self {
            Reply::Array(Some(items)) => Some(std::mem::take(items)),
            _ => None,
        }
    }

    /// Payload of a Status or non-null Bulk reply
    pub fn into_bytes(mut self) -> Option<Vec<u8>> {
        match &mut self {
            Reply::Status(text) => Some(std::mem::take(text).into_bytes()),
            Reply::Bulk(Some(bytes)) => Some(std::mem::take(bytes)),
            _ => None,
        }
    }

    /// Short variant name, used in logs and errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk",
            Reply::Error { .. } => "error",
            Reply::Array(_) => "array",
        }
    }
}

/// Leading token of an error message, if it is an uppercase word
pub(crate) fn error_code(message: &str) -> Option<&str> {
    let token = message.split(' ').next()?;
    let mut chars = token.chars();
    let starts_upper = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    let rest_ok = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    (starts_upper && rest_ok).then_some(token)
}

fn has_children(reply: &Reply) -> bool {
    matches!(reply, Reply::Array(Some(items)) if !items.is_empty())
}

// =============================================================================
// Drop / PartialEq
// =============================================================================

impl Drop for Reply {
    fn drop(&mut self) {
        let Reply::Array(Some(items)) = self else {
            return;
        };
        if !items.iter().any(has_children) {
            return;
        }

        // Flatten the tree onto the heap; every element then drops with no
        // children of its own.
        let mut stack = std::mem::take(items);
        while let Some(mut item) = stack.pop() {
            if let Reply::Array(Some(children)) = &mut item {
                stack.append(children);
            }
        }
    }
}

impl PartialEq for Reply {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            let same = match (a, b) {
                (Reply::Array(Some(xs)), Reply::Array(Some(ys))) => {
                    if xs.len() != ys.len() {
                        return false;
                    }
                    stack.extend(xs.iter().zip(ys.iter()));
                    true
                }
                (Reply::Array(None), Reply::Array(None)) => true,
                (Reply::Status(x), Reply::Status(y)) => x == y,
                (Reply::Integer(x), Reply::Integer(y)) => x == y,
                (Reply::Bulk(x), Reply::Bulk(y)) => x == y,
                (
                    Reply::Error { code: c1, message: m1 },
                    Reply::Error { code: c2, message: m2 },
                ) => c1 == c2 && m1 == m2,
                _ => false,
            };
            if !same {
                return false;
            }
        }
        true
    }
}

impl Eq for Reply {}

// =============================================================================
// Display
// =============================================================================

/// Renders the reply the way interactive clients print it
///
/// ```text
/// 1) "foo"
/// 2) 1) (integer) 1
///    2) (nil)
/// ```
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !has_children(self) {
            return fmt_flat(self, f);
        }

        // (remaining items, items written so far, column of the "N) " prefixes)
        let mut open: Vec<(slice::Iter<'_, Reply>, usize, usize)> =
            vec![(slice::from_ref(self).iter(), 0, 0)];
        let mut first = true;

        while let Some((iter, written, column)) = open.last_mut() {
            let Some(item) = iter.next() else {
                open.pop();
                continue;
            };

            let column = *column;
            let child_column = if first {
                // The root itself has no prefix
                first = false;
                0
            } else {
                if *written > 0 {
                    write!(f, "\n{:width$}", "", width = column)?;
                }
                *written += 1;
                let prefix = format!("{}) ", written);
                f.write_str(&prefix)?;
                column + prefix.len()
            };

            match item {
                Reply::Array(Some(children)) if !children.is_empty() => {
                    open.push((children.iter(), 0, child_column));
                }
                other => fmt_flat(other, f)?,
            }
        }
        Ok(())
    }
}

/// Anything except a non-empty array
fn fmt_flat(reply: &Reply, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match reply {
        Reply::Status(text) => f.write_str(text),
        Reply::Integer(value) => write!(f, "(integer) {}", value),
        Reply::Bulk(None) | Reply::Array(None) => f.write_str("(nil)"),
        Reply::Bulk(Some(bytes)) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
        Reply::Error { message, .. } => write!(f, "(error) {}", message),
        Reply::Array(Some(_)) => f.write_str("(empty array)"),
    }
}
