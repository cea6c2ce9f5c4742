//! Spanish-aware string comparison.
//!
//! Strings are compared in three passes. The first ignores case and accents and places `ñ` between
//! `n` and `o`. Ties are broken by accents (unaccented first), then by case (lowercase first), so
//! the ordering is total and only byte-identical strings compare equal.

use std::cmp::Ordering;

/// The primary collation weight of one character: its lowercase base letter, plus whether it is
/// an `ñ` (which sorts after every other `n`).
fn primary(c: char) -> (char, bool) {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match lower {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => ('a', false),
        'é' | 'è' | 'ê' | 'ë' => ('e', false),
        'í' | 'ì' | 'î' | 'ï' => ('i', false),
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => ('o', false),
        'ú' | 'ù' | 'û' | 'ü' => ('u', false),
        'ç' => ('c', false),
        'ñ' => ('n', true),
        other => (other, false),
    }
}

fn is_accented(c: char) -> bool {
    let lower = c.to_lowercase().next().unwrap_or(c);
    lower != 'ñ' && primary(c).0 != lower
}

/// Compares two strings the way a Spanish-speaking reader expects a list to be ordered.
///
/// ```
/// use minimarket_views::view::collate;
/// use std::cmp::Ordering;
///
/// assert_eq!(collate("Ñandú", "Oca"), Ordering::Less);
/// assert_eq!(collate("Ñandú", "Nube"), Ordering::Greater);
/// assert_eq!(collate("árbol", "Barco"), Ordering::Less);
/// ```
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary_cmp = a.chars().map(primary).cmp(b.chars().map(primary));
    if primary_cmp != Ordering::Equal {
        return primary_cmp;
    }
    let accent_cmp = a.chars().map(is_accented).cmp(b.chars().map(is_accented));
    if accent_cmp != Ordering::Equal {
        return accent_cmp;
    }
    let case_cmp = a
        .chars()
        .map(char::is_uppercase)
        .cmp(b.chars().map(char::is_uppercase));
    case_cmp.then_with(|| a.cmp(b))
}
