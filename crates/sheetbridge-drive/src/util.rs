//! Helpers for safe display of tokens and remote error text

/// Minimum token length to display a partial token
const MIN_TOKEN_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of a masked token
const TOKEN_MASK_VISIBLE_CHARS: usize = 4;

/// Longest remote message surfaced to callers
const MAX_ERROR_LEN: usize = 300;

/// Mask a token for safe display in logs
///
/// # Examples
/// ```
/// use sheetbridge_drive::util::mask_token;
/// assert_eq!(mask_token("ya29.1234567890abcdef"), "ya29...cdef");
/// assert_eq!(mask_token("short"), "****");
/// ```
#[must_use]
pub fn mask_token(token: &str) -> String {
    if token.len() <= MIN_TOKEN_LENGTH_FOR_PARTIAL_DISPLAY || !token.is_ascii() {
        return "****".to_string();
    }
    format!(
        "{}...{}",
        &token[..TOKEN_MASK_VISIBLE_CHARS],
        &token[token.len() - TOKEN_MASK_VISIBLE_CHARS..]
    )
}

/// Truncate to at most `max` bytes without splitting a character
#[must_use]
pub fn truncate_safe(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Sanitize remote error text before it leaves this crate
///
/// Messages mentioning credentials are replaced; long bodies are truncated.
#[must_use]
pub fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("bearer")
        || lower.contains("access_token")
        || lower.contains("invalid credentials")
        || lower.contains("unauthenticated")
    {
        return "Authentication error. Please check the configured access token.".to_string();
    }

    if error.len() > MAX_ERROR_LEN {
        format!("{}...(truncated)", truncate_safe(error, MAX_ERROR_LEN))
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("ya29.a0AfH6SMBxyz"), "ya29...Bxyz");
        assert_eq!(mask_token("12345678"), "****");
        assert_eq!(mask_token(""), "****");
    }

    #[test]
    fn test_truncate_safe_respects_char_boundary() {
        let s = "héllo";
        assert_eq!(truncate_safe(s, 2), "h");
        assert_eq!(truncate_safe(s, 100), s);
    }

    #[test]
    fn test_sanitize_api_error() {
        assert_eq!(
            sanitize_api_error("Request had invalid credentials"),
            "Authentication error. Please check the configured access token."
        );
        assert_eq!(sanitize_api_error("File not found: abc"), "File not found: abc");

        let long = "x".repeat(400);
        let sanitized = sanitize_api_error(&long);
        assert!(sanitized.ends_with("...(truncated)"));
        assert!(sanitized.len() < 400);
    }
}
