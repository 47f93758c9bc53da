use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize free text for keyword matching: NFD decomposition with
/// combining marks dropped (so "amanhã" matches "amanha"), lowercased and
/// trimmed. Idempotent.
pub fn normalize(raw: &str) -> String {
    raw.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}
