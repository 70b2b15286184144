//! Project-specific utilities live here.

/// Whether the value carries at least one non-whitespace character.
pub fn non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Escape `LIKE` wildcards so the value matches literally with `ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
