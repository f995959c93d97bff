// 🔑 Key Normalizer - canonical identifier strings for every join
//
// Client, product and municipality codes arrive from spreadsheets and legacy
// text rosters with stray quotes, padding and a "-" placeholder. Every join in
// the pipeline compares codes through normalize_key().

use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Set of normalized codes (ordered, so reports and extracts are deterministic)
pub type KeySet = BTreeSet<String>;

/// Replacement for the hyphen placeholder in codes.
/// Es una máscara, no una negación: "-15" → "99915".
pub const HYPHEN_SENTINEL: &str = "999";

const QUOTES: [char; 2] = ['"', '\''];

/// Canonicalize an identifier: strip quote characters, trim, mask hyphens.
///
/// Idempotent: `normalize_key(&normalize_key(x)) == normalize_key(x)`.
pub fn normalize_key(raw: &str) -> String {
    let unquoted: String = raw.chars().filter(|c| !QUOTES.contains(c)).collect();
    mask_hyphens(unquoted.trim())
}

/// Only the hyphen substitution (what the Sales extract keeps)
pub fn mask_hyphens(raw: &str) -> String {
    raw.replace('-', HYPHEN_SENTINEL)
}

/// Product codes read from numeric spreadsheet cells come as "12345.0"
pub fn strip_decimal_suffix(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.split_once('.') {
        Some((head, _)) => head.to_string(),
        None => trimmed.to_string(),
    }
}

/// Fold Spanish accents for text-keyed lookups (typology codes)
pub fn fold_accents(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'ñ' => 'n',
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Order codes numerically when both are integers, lexically otherwise
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Build a KeySet from raw codes, normalizing each one
pub fn key_set<'a, I>(codes: I) -> KeySet
where
    I: IntoIterator<Item = &'a str>,
{
    codes
        .into_iter()
        .map(normalize_key)
        .filter(|code| !code.is_empty())
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_strips_and_masks() {
        assert_eq!(normalize_key("  12345 "), "12345");
        assert_eq!(normalize_key("\"12345\""), "12345");
        assert_eq!(normalize_key("'-77'"), "99977");
        assert_eq!(normalize_key("A-1-B"), "A9991999B");
    }

    #[test]
    fn test_normalize_key_is_idempotent() {
        let samples = [
            "",
            "   ",
            "-",
            "' -12 '",
            "\" 'x' \"",
            "  \"'-'\"  ",
            "ABC-123",
            "999",
            "\t44\n",
        ];

        for s in samples {
            let once = normalize_key(s);
            assert_eq!(normalize_key(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_mask_hyphens_keeps_quotes_and_padding() {
        assert_eq!(mask_hyphens(" '-5' "), " '9995' ");
    }

    #[test]
    fn test_strip_decimal_suffix() {
        assert_eq!(strip_decimal_suffix(" 23001.0 "), "23001");
        assert_eq!(strip_decimal_suffix("23001"), "23001");
    }

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents(" Droguería Ñapa "), "Drogueria Napa");
    }

    #[test]
    fn test_compare_codes_numeric_aware() {
        assert_eq!(compare_codes("9", "10"), Ordering::Less);
        assert_eq!(compare_codes("B1", "A9"), Ordering::Greater);
    }

    #[test]
    fn test_key_set_drops_empty_codes() {
        let keys = key_set(["1", " 1", "\"\"", "-2"]);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("1"));
        assert!(keys.contains("9992"));
    }
}
