//! Bracket escape codec
//!
//! Some catalog consumers mangle markup delimiters, so fragments can be
//! exported with angle brackets rewritten as square brackets:
//!
//! - `encode`: escape literal `[`, `]` and `\` with a backslash, then turn `<` into `[`
//!   and `>` into `]`
//! - `decode`: the exact inverse
//!
//! Decoding is a single left-to-right scan rather than a regex replacement;
//! runs of adjacent brackets such as `]]` must have every bracket converted.

use crate::error::{I18nError, I18nResult};

const ESCAPE: char = '\\';

/// Rewrite angle brackets as square brackets, escaping pre-existing square brackets
///
/// Text without any of `< > [ ] \` is returned unchanged.
///
/// # Example
/// ```ignore
/// assert_eq!(encode("<b>[1]</b>"), r"[b]\[1\][/b]");
/// ```
pub fn encode(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '[' | ']' | ESCAPE => {
                result.push(ESCAPE);
                result.push(ch);
            }
            '<' => result.push('['),
            '>' => result.push(']'),
            _ => result.push(ch),
        }
    }
    result
}

/// Invert [`encode`]
///
/// # Errors
/// `Protocol` when a backslash is followed by anything other than `[`, `]`
/// or `\`, or when the text ends with a dangling backslash.
pub fn decode(text: &str) -> I18nResult<String> {
    let mut result = String::with_capacity(text.len());
    let mut escaped = false;

    for (position, ch) in text.chars().enumerate() {
        if escaped {
            match ch {
                '[' | ']' | ESCAPE => result.push(ch),
                other => {
                    return Err(I18nError::Protocol(format!(
                        "unexpected escape '\\{}' at position {}",
                        other, position
                    )));
                }
            }
            escaped = false;
            continue;
        }

        match ch {
            ESCAPE => escaped = true,
            '[' => result.push('<'),
            ']' => result.push('>'),
            _ => result.push(ch),
        }
    }

    if escaped {
        return Err(I18nError::Protocol(
            "unexpected escape at end of text".to_string(),
        ));
    }

    Ok(result)
}
