//! String utilities for the domain layer.

/// Truncate a string to at most `max_len` bytes, appending `...` when cut.
///
/// Truncation never splits a UTF-8 character.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3).min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Lowercase and collapse every run of non-alphanumeric characters into `-`.
///
/// Used to derive branch names and directory names from free text.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_is_unchanged() {
        assert_eq!(truncate("merge", 10), "merge");
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("resolve conflict", 10), "resolve...");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // 'é' is two bytes; cutting inside it must back off
        assert_eq!(truncate("éééé", 6), "é...");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Fix: Auth/Login Flow!"), "fix-auth-login-flow");
        assert_eq!(slugify("--task 42--"), "task-42");
        assert_eq!(slugify(""), "");
    }
}
