/// Most mask characters ever emitted, regardless of hidden length.
const MAX_MASK_CHARS: usize = 4;

/// Mask an email or domain for logs and reports, keeping two characters on
/// each end.
pub fn mask(value: &str) -> String {
    mask_with(value, 2, 2)
}

/// Replace the middle of `value` with up to four `*`.
///
/// Strings no longer than `visible_start + visible_end` are returned as-is.
/// Works on chars, so multibyte input is never split.
pub fn mask_with(value: &str, visible_start: usize, visible_end: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len <= visible_start + visible_end {
        return value.to_string();
    }
    let hidden = len - visible_start - visible_end;
    let mut out: String = chars[..visible_start].iter().collect();
    out.push_str(&"*".repeat(hidden.min(MAX_MASK_CHARS)));
    out.extend(&chars[len - visible_end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(mask(""), "");
    }

    #[test]
    fn test_short_unmasked() {
        assert_eq!(mask("abcd"), "abcd");
        assert_eq!(mask("ab"), "ab");
    }

    #[test]
    fn test_mask_caps_at_four() {
        assert_eq!(mask("user@example.com"), "us****om");
    }

    #[test]
    fn test_mask_short_middle() {
        assert_eq!(mask("abcdef"), "ab**ef");
    }

    #[test]
    fn test_custom_visibility() {
        assert_eq!(mask_with("https://ikuuu.nl", 4, 3), "http****.nl");
    }

    #[test]
    fn test_multibyte_safe() {
        assert_eq!(mask("账户名称测试"), "账户**测试");
    }
}
