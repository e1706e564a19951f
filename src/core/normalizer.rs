//! Text Normalizer
//!
//! Folds every text source of a notification into one canonical string:
//! NFKC (fullwidth digits, ligatures, math alphanumerics → ASCII) followed by
//! a homoglyph pass that maps Cyrillic/Greek look-alikes onto the Latin
//! letters of the Base58 alphabet.

use unicode_normalization::UnicodeNormalization;

/// Separator placed between fragments so an address never straddles two sources
const FRAGMENT_SEPARATOR: &str = "\n";

/// Confusable → Latin. Only letters that render identically in common fonts.
const HOMOGLYPHS: &[(char, char)] = &[
    // Cyrillic uppercase
    ('А', 'A'),
    ('В', 'B'),
    ('Е', 'E'),
    ('К', 'K'),
    ('М', 'M'),
    ('Н', 'H'),
    ('О', 'O'),
    ('Р', 'P'),
    ('С', 'C'),
    ('Т', 'T'),
    ('Х', 'X'),
    ('У', 'Y'),
    ('Ѕ', 'S'),
    ('І', 'I'),
    ('Ј', 'J'),
    ('Ԛ', 'Q'),
    ('Ԝ', 'W'),
    // Cyrillic lowercase
    ('а', 'a'),
    ('с', 'c'),
    ('ԁ', 'd'),
    ('е', 'e'),
    ('һ', 'h'),
    ('і', 'i'),
    ('ј', 'j'),
    ('о', 'o'),
    ('р', 'p'),
    ('ԛ', 'q'),
    ('ѕ', 's'),
    ('ԝ', 'w'),
    ('х', 'x'),
    ('у', 'y'),
    // Greek uppercase
    ('Α', 'A'),
    ('Β', 'B'),
    ('Ε', 'E'),
    ('Ζ', 'Z'),
    ('Η', 'H'),
    ('Ι', 'I'),
    ('Κ', 'K'),
    ('Μ', 'M'),
    ('Ν', 'N'),
    ('Ο', 'O'),
    ('Ρ', 'P'),
    ('Τ', 'T'),
    ('Υ', 'Y'),
    ('Χ', 'X'),
    // Greek lowercase
    ('ο', 'o'),
    ('ν', 'v'),
    ('ι', 'i'),
    ('κ', 'k'),
    ('υ', 'u'),
];

/// Latin equivalent of a confusable character, if any
#[inline]
fn latin_equivalent(c: char) -> Option<char> {
    HOMOGLYPHS
        .iter()
        .find_map(|&(glyph, latin)| (glyph == c).then_some(latin))
}

/// Normalize a single string
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .nfkc()
        .map(|c| latin_equivalent(c).unwrap_or(c))
        .collect();
    // Second NFKC pass keeps the function idempotent when a substituted
    // letter is followed by a combining mark
    folded.nfkc().collect()
}

/// Join all present, non-empty fragments and normalize the result
pub fn normalize_fragments<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let joined = fragments
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR);
    normalize_text(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyrillic_homoglyphs_become_latin() {
        // "Eq" with Cyrillic Е and "Cat" with Cyrillic С, а
        assert_eq!(normalize_text("Еq Сat"), "Eq Cat");
    }

    #[test]
    fn test_greek_homoglyphs_become_latin() {
        assert_eq!(normalize_text("ΑΒΚΜ"), "ABKM");
    }

    #[test]
    fn test_fullwidth_forms_fold_to_ascii() {
        assert_eq!(normalize_text("ＡＢＣ１２３"), "ABC123");
    }

    #[test]
    fn test_unmapped_characters_survive() {
        assert_eq!(normalize_text("gm 🚀 ñ"), "gm 🚀 ñ");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "check out THIS token Еq1vW",
            "ＦＵＬＬ width ﬁ ligature",
            "",
            "Ѕolana ΑΒ 漢字",
        ];
        for input in inputs {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_fragments_skip_missing_and_blank() {
        let out = normalize_fragments([Some("first"), None, Some("  "), Some("second")]);
        assert_eq!(out, "first\nsecond");
    }

    #[test]
    fn test_no_fragments_yields_empty() {
        assert_eq!(normalize_fragments([None, None]), "");
    }
}
