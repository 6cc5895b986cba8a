//! Engineering-suffix value parsing.
//!
//! Capital `M` means mega in this dialect — it does **not** fall back to
//! the lowercase-SPICE convention where `m` means milli. `MEG` is also
//! mega, checked first since it is the longer match. This is a fixed
//! dialect choice; it is not configurable.

use crate::error::{Error, Result};

/// Parse a value string like `"1k"`, `"2.2u"`, `"3.3m"`, `"1MEG"`, `"1M"`,
/// or a bare number, into its `f64` value.
pub fn parse_value(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let (numeric, suffix) = split_numeric_suffix(trimmed);
    if numeric.is_empty() {
        return Err(Error::Parse {
            context: "engineering value",
            message: "no numeric prefix found".to_string(),
            input: input.to_string(),
        });
    }
    let base: f64 = numeric.parse().map_err(|_| Error::Parse {
        context: "engineering value",
        message: format!("invalid number {numeric:?}"),
        input: input.to_string(),
    })?;
    Ok(base * suffix_multiplier(suffix))
}

/// Split `"1MEG"` into `("1", "MEG")`, `"2.2u"` into `("2.2", "u")`,
/// `"-1.5e-3m"` into `("-1.5e-3", "m")`.
fn split_numeric_suffix(s: &str) -> (&str, &str) {
    let bytes = s.as_bytes();
    let n = bytes.len();
    let mut i = 0;
    if i < n && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    while i < n && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < n && bytes[i] == b'.' {
        i += 1;
        while i < n && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < n && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < n && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_digits_start = j;
        while j < n && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_digits_start {
            i = j;
        }
    }
    (&s[..i], &s[i..])
}

/// Map a suffix to its multiplier. `MEG`/mega-case-insensitive variants are
/// checked first (longest match); then the single-character SI prefixes
/// from spec.md's exact table `{T,G,MEG,M,K,k,m,u,µ,n,p,f}` — only `K`/`k`
/// fold case, and `M` stays mega-only (case-sensitive against `m` milli).
/// `n`, `p`, `f`, `u`/`µ` are lowercase-only per that table: an uppercase
/// `N`, `P`, `F`, or `U` is not a recognized suffix, so it falls through to
/// the bare-unit-letter case below. Any other leading character (a bare
/// unit letter like `V`, `A`, `Hz`, `Ohm`, or an unlisted capital like `F`
/// for Farad) is treated as no multiplier at all.
fn suffix_multiplier(suffix: &str) -> f64 {
    if suffix.is_empty() {
        return 1.0;
    }
    if suffix.len() >= 3 && suffix[..3].eq_ignore_ascii_case("meg") {
        return 1e6;
    }
    match suffix.chars().next().unwrap() {
        'T' => 1e12,
        'G' => 1e9,
        'M' => 1e6,
        'K' | 'k' => 1e3,
        'm' => 1e-3,
        'u' | 'µ' => 1e-6,
        'n' => 1e-9,
        'p' => 1e-12,
        'f' => 1e-15,
        _ => 1.0,
    }
}
