//! Session cookie extraction from login responses.

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Collect every `Set-Cookie` header into a single `Cookie` request value.
///
/// Returns `None` when the response set no usable cookie.
pub fn extract_session(headers: &HeaderMap) -> Option<String> {
    let values = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok());
    let joined = join_set_cookies(values);
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Reduce raw `Set-Cookie` values to `name=value; name2=value2`.
///
/// Attributes (`Path`, `Expires`, ...) are dropped, empty pairs skipped and
/// duplicates removed while keeping first-seen order. A single value may hold
/// several comma-folded cookies; it is split only where a comma starts a new
/// `name=` pair, so commas inside `Expires` dates are left alone.
pub fn join_set_cookies<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut pairs: Vec<&str> = Vec::new();
    for value in values {
        for cookie in split_folded(value) {
            let pair = cookie.split(';').next().unwrap_or("").trim();
            if !pair.is_empty() && !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
    }
    pairs.join("; ")
}

fn split_folded(value: &str) -> Vec<&str> {
    let bytes = value.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, b) in bytes.iter().enumerate() {
        if *b == b',' && starts_cookie_pair(&value[i + 1..]) {
            parts.push(&value[start..i]);
            start = i + 1;
        }
    }
    parts.push(&value[start..]);
    parts
}

fn starts_cookie_pair(rest: &str) -> bool {
    let rest = rest.trim_start();
    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
        .count();
    name_len > 0 && rest.as_bytes().get(name_len) == Some(&b'=')
}
