/// Truncate a string to a maximum character count (UTF-8 safe), appending
/// "..." when anything was cut. Used to bound prompt-document excerpts
/// embedded into completion prompts.
#[inline]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Truncate at a word boundary with "..." suffix, falling back to a plain
/// character cut when no boundary exists in range. Used for table output.
#[inline]
pub fn truncate_at_boundary(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    let cut = kept
        .rfind(|c: char| c.is_whitespace() || c == '.' || c == ',')
        .unwrap_or(kept.len());
    format!("{}...", &kept[..cut])
}
