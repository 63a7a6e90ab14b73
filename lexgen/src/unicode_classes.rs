//! Range tables backing the `\L`, `\w`, `\d`, `\s` escapes (spec §4.2). `\L` is computed from
//! `char::is_alphabetic` over the whole scalar-value space; the rest are small fixed ASCII
//! tables, same as every regex engine's "shorthand" classes.

use crate::cp::Range;

/// The Unicode-letter class (`\L`): every scalar value for which `char::is_alphabetic` holds,
/// compressed into maximal runs. Computed once and cached, since scanning all ~0x110000 code
/// points is not free enough to redo per rule.
pub fn letter_ranges() -> &'static [Range] {
    static RANGES: std::sync::OnceLock<Vec<Range>> = std::sync::OnceLock::new();
    RANGES.get_or_init(compute_letter_ranges)
}

fn compute_letter_ranges() -> Vec<Range> {
    let mut ranges = Vec::new();
    let mut run_start: Option<u32> = None;

    for cp in 0u32..=0x10FFFF {
        let is_letter = char::from_u32(cp).is_some_and(char::is_alphabetic);
        match (is_letter, run_start) {
            (true, None) => run_start = Some(cp),
            (false, Some(start)) => {
                ranges.push(Range::new(start, cp));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        ranges.push(Range::new(start, 0x110000));
    }
    ranges
}

/// `\w`: ASCII word characters, `[A-Za-z0-9_]`.
pub fn word_ranges() -> Vec<Range> {
    vec![
        Range::new(b'0' as u32, b'9' as u32 + 1),
        Range::new(b'A' as u32, b'Z' as u32 + 1),
        Range::new(b'_' as u32, b'_' as u32 + 1),
        Range::new(b'a' as u32, b'z' as u32 + 1),
    ]
}

/// `\d`: ASCII digits, `[0-9]`.
pub fn digit_ranges() -> Vec<Range> {
    vec![Range::new(b'0' as u32, b'9' as u32 + 1)]
}

/// `\s`: ASCII whitespace, `[ \t\n\r\x0B\x0C]`.
pub fn space_ranges() -> Vec<Range> {
    vec![
        Range::new(0x09, 0x0D + 1),
        Range::new(b' ' as u32, b' ' as u32 + 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_ranges_are_sorted_and_disjoint() {
        let ranges = letter_ranges();
        for w in ranges.windows(2) {
            assert!(w[0].hi <= w[1].lo);
        }
    }

    #[test]
    fn letter_ranges_include_ascii_letters() {
        let ranges = letter_ranges();
        assert!(ranges.iter().any(|r| r.contains(b'a' as u32)));
        assert!(ranges.iter().any(|r| r.contains(b'Z' as u32)));
        assert!(!ranges.iter().any(|r| r.contains(b'5' as u32)));
    }

    #[test]
    fn digit_ranges_cover_only_digits() {
        let ranges = digit_ranges();
        assert!(ranges.iter().any(|r| r.contains(b'0' as u32)));
        assert!(!ranges.iter().any(|r| r.contains(b'a' as u32)));
    }
}
