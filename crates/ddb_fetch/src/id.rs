use std::sync::LazyLock;

use regex::Regex;

static PROFILE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)dndbeyond\.com/characters/(\d+)").expect("valid regex")
});

/// A trimmed all-digit input is the id itself; otherwise the id is taken
/// from the first `dndbeyond.com/characters/<digits>` link in the input.
pub fn extract_character_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Some(trimmed.to_string());
    }
    PROFILE_LINK_RE
        .captures(trimmed)
        .map(|caps| caps[1].to_string())
}
