//! Header normalization.
//!
//! Turns a raw spreadsheet header into a token that can be compared against
//! the canonical vocabulary: accents are removed, `.` and `-` act as word
//! separators, whitespace runs collapse into a single `_`, and the result is
//! upper-cased. `"Saldo Ind. Dias"` becomes `"SALDO_IND_DIAS"`.

use itertools::Itertools;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

pub const TOKEN_JOINER: &str = "_";

/// Normalizes a raw header. Total: any input, including the empty string,
/// produces a (possibly empty) token.
pub fn normalize_header(raw: &str) -> String {
    let stripped = strip_accents(raw.trim());
    let separated = stripped.replace(['.', '-'], " ");
    separated
        .split_whitespace()
        .join(TOKEN_JOINER)
        .to_uppercase()
}

/// Removes diacritical marks by decomposing to NFD and dropping combining
/// characters.
pub fn strip_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
