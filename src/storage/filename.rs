//! Upload filename sanitising.

const MAX_FILENAME_LEN: usize = 128;
const FALLBACK_FILENAME: &str = "file";

/// Reduces a client-supplied filename to a flat, safe object name.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`, runs of dots collapse to
/// one, and leading `.`, `_` or `-` are stripped, so the result can never
/// contain a path separator or `..`. Empty results become `"file"`.
pub fn sanitize_filename(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            ch
        } else {
            '_'
        };
        if ch == '.' && cleaned.ends_with('.') {
            continue;
        }
        cleaned.push(ch);
    }

    let trimmed = cleaned.trim_start_matches(['.', '_', '-']);
    let truncated: String = trimmed.chars().take(MAX_FILENAME_LEN).collect();

    if truncated.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        truncated
    }
}
