//! Cache size normalization (`46080 KB`, `512K`, `8 MB`) to kilobytes.

use super::reader::is_c_space;

/// Unit characters and the step to the next unit, smallest first.
///
/// A unit's scale is the product of its own step and every step below it,
/// so `G` applies the `M` and `K` steps as well.
const UNIT_LADDER: [(u8, f64); 3] = [(b'K', 1.0), (b'M', 1024.0), (b'G', 1024.0)];

/// Parse a cache size into whole kilobytes.
///
/// Accepts `<number><optional spaces><unit>` where the unit is `K`, `M`,
/// `G` (optionally followed by `B`) or a bare `B` for bytes. A missing unit
/// means kilobytes. Fractions of a kilobyte are truncated.
pub fn parse_cache_size(text: &str) -> Option<u32> {
    let (mut value, consumed) = float_prefix(text)?;
    let mut rest = &text.as_bytes()[consumed..];

    while rest.first().is_some_and(|&b| is_c_space(b)) {
        rest = &rest[1..];
    }

    if let Some(unit) = rest.first().map(u8::to_ascii_uppercase) {
        if let Some(pos) = UNIT_LADDER.iter().position(|&(c, _)| c == unit) {
            value *= UNIT_LADDER[..=pos].iter().map(|&(_, step)| step).product::<f64>();
            rest = &rest[1..];
        } else if unit == b'B' {
            // Left in place: it also satisfies the suffix check below.
            value /= 1024.0;
        }
    }

    match rest.first().map(u8::to_ascii_uppercase) {
        None | Some(b'B') => Some(value as u32),
        _ => None,
    }
}

/// Longest decimal floating-point prefix of `text`, as `strtod` reads it.
///
/// Returns the value and the number of bytes consumed, or `None` when no
/// digits were found.
fn float_prefix(text: &str) -> Option<(f64, usize)> {
    let b = text.as_bytes();
    let mut i = 0;

    while i < b.len() && is_c_space(b[i]) {
        i += 1;
    }
    let start = i;

    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }

    if digits == 0 {
        return None;
    }

    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    text[start..i].parse::<f64>().ok().map(|v| (v, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kilobytes() {
        assert_eq!(parse_cache_size("46080 KB"), Some(46080));
        assert_eq!(parse_cache_size("512K"), Some(512));
        assert_eq!(parse_cache_size("512 k"), Some(512));
        assert_eq!(parse_cache_size("512 KiB"), None);
    }

    #[test]
    fn test_megabytes_and_gigabytes() {
        assert_eq!(parse_cache_size("8 MB"), Some(8192));
        assert_eq!(parse_cache_size("1 MB"), Some(1024));
        assert_eq!(parse_cache_size("1.5M"), Some(1536));
        assert_eq!(parse_cache_size("2 GB"), Some(2 * 1024 * 1024));
        assert_eq!(parse_cache_size("1g"), Some(1024 * 1024));
    }

    #[test]
    fn test_bytes() {
        assert_eq!(parse_cache_size("1048576 B"), Some(1024));
        assert_eq!(parse_cache_size("2048b"), Some(2));
        // Fractions of a kilobyte are truncated.
        assert_eq!(parse_cache_size("1500 B"), Some(1));
        assert_eq!(parse_cache_size("512 B"), Some(0));
    }

    #[test]
    fn test_no_unit_means_kilobytes() {
        assert_eq!(parse_cache_size("256"), Some(256));
        assert_eq!(parse_cache_size("256   "), Some(256));
    }

    #[test]
    fn test_unrecognized_unit_fails() {
        assert_eq!(parse_cache_size("512 X"), None);
        assert_eq!(parse_cache_size("512 T"), None);
        // Anything other than B straight after the unit is rejected.
        assert_eq!(parse_cache_size("512 K B"), None);
        assert_eq!(parse_cache_size("512KX"), None);
    }

    #[test]
    fn test_suffix_after_b_is_ignored() {
        assert_eq!(parse_cache_size("512 KBytes"), Some(512));
    }

    #[test]
    fn test_no_digits_fails() {
        assert_eq!(parse_cache_size(""), None);
        assert_eq!(parse_cache_size("KB"), None);
        assert_eq!(parse_cache_size("unknown"), None);
        assert_eq!(parse_cache_size("."), None);
    }

    #[test]
    fn test_fraction_truncated() {
        assert_eq!(parse_cache_size("0.75 MB"), Some(768));
        assert_eq!(parse_cache_size("1.9"), Some(1));
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(parse_cache_size("-5 KB"), Some(0));
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(float_prefix("42 KB"), Some((42.0, 2)));
        assert_eq!(float_prefix("1e3K"), Some((1000.0, 3)));
        // A dangling exponent marker is not consumed.
        assert_eq!(float_prefix("3eK"), Some((3.0, 1)));
        assert_eq!(float_prefix(".5M"), Some((0.5, 2)));
        assert_eq!(float_prefix("abc"), None);
    }
}
