//! Parameter string helpers.
//!
//! Workloads are described by strings like `synthetic(0.25,uniform,bernoulli,{1,8},{3,1})`.
//! The top level splits on commas outside of braces; a braced group is itself a list
//! that can be tokenized again.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Invalid integer parameter: {0:?}")]
    InvalidInt(String),
    #[error("Invalid numeric parameter: {0:?}")]
    InvalidFloat(String),
}

/// Splits `name(params)` into its name and raw parameter string.
///
/// Returns `None` if there is no opening parenthesis. The parameter string ends at the last
/// closing parenthesis, or at the end of the input if there is none.
pub fn split_call(spec: &str) -> Option<(&str, &str)> {
    let left = spec.find('(')?;
    let name = spec[..left].trim();
    let rest = &spec[left + 1..];
    let params = match rest.rfind(')') {
        Some(right) => &rest[..right],
        None => rest,
    };
    Some((name, params))
}

/// Splits a parameter string on top-level commas.
///
/// If the whole string is a single braced group, the outer braces are stripped first, so
/// `"{a,{b,c},d}"` yields `["a", "{b,c}", "d"]`. An empty (or blank) string yields no tokens.
pub fn tokenize(s: &str) -> Vec<String> {
    let s = strip_group(s.trim());
    if s.is_empty() {
        return Vec::new();
    }

    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                tokens.push(s[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(s[start..].trim().to_string());
    tokens
}

/// Tokenizes `s` and parses every token as an integer.
pub fn tokenize_int(s: &str) -> Result<Vec<i64>, ParamError> {
    tokenize(s)
        .into_iter()
        .map(|token| token.parse::<i64>().map_err(|_| ParamError::InvalidInt(token)))
        .collect()
}

/// Parses a single floating point parameter.
pub fn parse_float(s: &str) -> Result<f64, ParamError> {
    s.trim().parse::<f64>().map_err(|_| ParamError::InvalidFloat(s.to_string()))
}

/// Resizes `values` to `len`, repeating the last element to fill or truncating.
///
/// An empty vector stays empty; callers supply a default element first.
pub fn broadcast<T: Clone>(values: &mut Vec<T>, len: usize) {
    if let Some(last) = values.last().cloned() {
        values.resize(len, last);
    }
}

/// Strips the outer braces of `s` if the opening brace is closed by the final character.
fn strip_group(s: &str) -> &str {
    if !s.starts_with('{') {
        return s;
    }

    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return if i == s.len() - 1 { s[1..i].trim() } else { s };
                }
            }
            _ => {}
        }
    }

    // Unterminated group: drop the opening brace only.
    s[1..].trim()
}
