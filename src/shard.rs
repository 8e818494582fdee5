//! Visitor-to-shard assignment.
//!
//! The queue writer places a request set by the first character of its
//! sharding key (a lowercase hex string). Hex digits map to their numeric
//! value, anything else falls back to its code point.

/// Numeric value of each lowercase hex digit, indexed by position.
const HEX_DIGITS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// Lowercased first character of a sharding key, if any.
pub fn starting_letter(identifier: &str) -> Option<char> {
    identifier.chars().next().map(|c| {
        // Multi-char lowercase forms (e.g. 'İ') keep their first char
        c.to_lowercase().next().unwrap_or(c)
    })
}

/// Compute the shard an identifier lands in for `shard_count` shards.
///
/// `shard_count` must be at least 1. An empty identifier maps to shard 0.
pub fn compute_shard(identifier: &str, shard_count: usize) -> usize {
    debug_assert!(shard_count >= 1);
    let Some(letter) = starting_letter(identifier) else {
        return 0;
    };

    let value = HEX_DIGITS
        .iter()
        .position(|&d| d == letter)
        .unwrap_or(letter as usize);

    value % shard_count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_letters_map_to_their_value() {
        assert_eq!(compute_shard("a", 16), 10);
        assert_eq!(compute_shard("f", 16), 15);
        assert_eq!(compute_shard("0", 16), 0);
        assert_eq!(compute_shard("9abc", 16), 9);
    }

    #[test]
    fn test_non_hex_uses_code_point() {
        assert_eq!(compute_shard("z", 16), ('z' as usize) % 16);
        assert_eq!(compute_shard("g", 5), ('g' as usize) % 5);
    }

    #[test]
    fn test_uppercase_is_folded() {
        assert_eq!(compute_shard("F00", 16), 15);
        assert_eq!(compute_shard("Z", 16), compute_shard("z", 16));
    }

    #[test]
    fn test_result_within_range() {
        let ids = ["", "0", "abc", "ffff", "zz", "Ω", "192.168.0.1", "\u{1F600}"];
        for n in 1..=40 {
            for id in ids {
                let shard = compute_shard(id, n);
                assert!(shard < n, "{id:?} with {n} shards gave {shard}");
                assert_eq!(shard, compute_shard(id, n));
            }
        }
    }

    #[test]
    fn test_single_shard_always_zero() {
        assert_eq!(compute_shard("e", 1), 0);
        assert_eq!(compute_shard("x", 1), 0);
    }
}
