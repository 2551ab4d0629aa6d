//! Filename sanitization for artifact names and object-storage keys.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]").expect("valid regex");
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
///
/// Idempotent: sanitizing an already-sanitized string returns it
/// unchanged. Accents and multi-byte characters are replaced per
/// character, not per byte.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_spaces_and_punctuation() {
        assert_eq!(sanitize_filename("Aide Locale"), "Aide_Locale");
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
    }

    #[test]
    fn test_accented_product_name() {
        let out = sanitize_filename("Démarches & Co");
        assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        assert_eq!(out, "D_marches___Co");
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize_filename("Démarches & Co");
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn test_keeps_safe_characters() {
        assert_eq!(sanitize_filename("Avis_2024-01"), "Avis_2024-01");
    }
}
