//! Plain-text formatting of counters and distributions.

use std::cmp::Ordering;
use std::fmt::Display;

/// How [`format_counts`] orders its entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOrder {
    /// Keep the caller's order
    Insertion,
    /// Natural order of the rendered keys
    Sorted,
}

/// Render key/count pairs as `"key: value"` strings.
pub fn format_counts<K, V, I>(entries: I, order: KeyOrder) -> Vec<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Display,
    V: Display,
{
    let mut rendered: Vec<(String, String)> = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if order == KeyOrder::Sorted {
        rendered.sort_by(|a, b| natural_cmp(&a.0, &b.0));
    }

    rendered
        .into_iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect()
}

/// `a + b + c` rendering of a per-shard distribution.
pub fn join_distribution(counts: &[u64]) -> String {
    counts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Integer with `,` thousands separators.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Compare strings treating runs of ASCII digits as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                // Compare by magnitude first, then by length so "01" > "1"
                let trimmed_l = left.trim_start_matches('0');
                let trimmed_r = right.trim_start_matches('0');
                let ord = trimmed_l
                    .len()
                    .cmp(&trimmed_r.len())
                    .then_with(|| trimmed_l.cmp(trimmed_r))
                    .then_with(|| left.len().cmp(&right.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let lines = format_counts([("zeta", 1), ("alpha", 2)], KeyOrder::Insertion);
        assert_eq!(lines, vec!["zeta: 1", "alpha: 2"]);
    }

    #[test]
    fn test_sorted_order_is_natural() {
        let lines = format_counts(
            [("b", 1u64), ("10", 2), ("2", 3), ("a", 4)],
            KeyOrder::Sorted,
        );
        assert_eq!(lines, vec!["2: 3", "10: 2", "a: 4", "b: 1"]);
    }

    #[test]
    fn test_natural_cmp_mixed() {
        assert_eq!(natural_cmp("file2", "file10"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
        assert_eq!(natural_cmp("9", "a"), Ordering::Less);
        assert_eq!(natural_cmp("1", "01"), Ordering::Less);
    }

    #[test]
    fn test_join_distribution() {
        assert_eq!(join_distribution(&[3, 0, 12]), "3 + 0 + 12");
        assert_eq!(join_distribution(&[]), "");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}
