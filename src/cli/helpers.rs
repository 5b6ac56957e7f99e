//! Shared helper functions for CLI commands.

/// Truncate a string for display, appending an ellipsis (UTF-8 safe).
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title here", 10), "a very ...");
        // Counts characters, not bytes.
        assert_eq!(truncate("한글 제목", 10), "한글 제목");
    }
}
