use unicode_normalization::UnicodeNormalization;

/// Apply NFC normalization to text.
///
/// Used when the active input language declares a combining spec: keys
/// that emit a base letter followed by a combining mark are folded into
/// the precomposed code point before the word is looked up.
pub fn normalize_nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Apply NFKC normalization to text.
///
/// Lexicon keys are stored in this form so that full-width ASCII and
/// compatibility ligatures (`ﬁ`) match their plain spellings.
pub fn normalize_nfkc(text: &str) -> String {
    text.nfkc().collect()
}

/// Lookup key for a word: NFKC-normalized and lowercased.
pub fn fold_case(text: &str) -> String {
    normalize_nfkc(text).to_lowercase()
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character, leaving the rest untouched.
pub fn decapitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Uppercase every character.
pub fn to_all_caps(text: &str) -> String {
    text.to_uppercase()
}

/// Whether more than one character is uppercase.
///
/// Words like "NASA" or "iOS" should not be learned in a decapitalized
/// form even if auto-caps was active when they were typed.
pub fn is_mostly_caps(text: &str) -> bool {
    text.chars().filter(|c| c.is_uppercase()).take(2).count() > 1
}

/// Whether the first character is uppercase.
pub fn is_first_char_upper(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_nfc() {
        // e + combining acute -> é
        assert_eq!(normalize_nfc("e\u{0301}"), "\u{00e9}");
        assert_eq!(normalize_nfc("cafe\u{0301}"), "caf\u{00e9}");
        // Already composed text is unchanged
        assert_eq!(normalize_nfc("hello"), "hello");
    }

    #[test]
    fn test_normalize_nfkc() {
        assert_eq!(normalize_nfkc("Ａｂｃ"), "Abc");
        assert_eq!(normalize_nfkc("\u{fb01}ne"), "fine");
    }

    #[test]
    fn test_fold_case() {
        assert_eq!(fold_case("Hello"), "hello");
        assert_eq!(fold_case("ＨＥＬＬＯ"), "hello");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("hello"), "Hello");
        assert_eq!(capitalize_first("élan"), "Élan");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_decapitalize_first() {
        assert_eq!(decapitalize_first("Hello"), "hello");
        assert_eq!(decapitalize_first("NASA"), "nASA");
        assert_eq!(decapitalize_first(""), "");
    }

    #[test]
    fn test_is_mostly_caps() {
        assert!(is_mostly_caps("NASA"));
        assert!(is_mostly_caps("iOS"));
        assert!(!is_mostly_caps("Hello"));
        assert!(!is_mostly_caps("hello"));
        assert!(!is_mostly_caps(""));
    }

    #[test]
    fn test_is_first_char_upper() {
        assert!(is_first_char_upper("Hello"));
        assert!(!is_first_char_upper("hello"));
        assert!(!is_first_char_upper(""));
    }
}
