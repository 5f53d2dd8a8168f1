//! UTF-16 offset helpers.
//!
//! Text offsets in paths use UTF-16 code units, the unit of DOM `Range` and
//! `Selection` offsets. Strings are stored as UTF-8, so every edit converts.

/// Length of `s` in UTF-16 code units
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte index of the UTF-16 `offset`, or `None` when the offset is past the
/// end or falls between the two halves of a surrogate pair.
pub fn byte_index(s: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in s.char_indices() {
        if units == offset {
            return Some(byte);
        }
        units += ch.len_utf16();
        if units > offset {
            return None;
        }
    }
    (units == offset).then_some(s.len())
}

/// Byte index of the last char boundary at or before the UTF-16 `offset`,
/// clamped to the string length.
pub fn byte_index_floor(s: &str, offset: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in s.char_indices() {
        let next = units + ch.len_utf16();
        if next > offset {
            return byte;
        }
        units = next;
    }
    s.len()
}

/// Clamp `offset` to the text and snap it back onto a char boundary.
pub fn clamp_offset(s: &str, offset: usize) -> usize {
    let byte = byte_index_floor(s, offset);
    utf16_len(&s[..byte])
}

/// UTF-16 offset of the char boundary before `offset` (0 stays 0).
pub fn prev_boundary(s: &str, offset: usize) -> usize {
    let mut units = 0;
    let mut previous = 0;
    for ch in s.chars() {
        if units >= offset {
            break;
        }
        previous = units;
        units += ch.len_utf16();
    }
    previous
}

/// UTF-16 offset of the char boundary after `offset`, capped at the length.
pub fn next_boundary(s: &str, offset: usize) -> usize {
    let mut units = 0;
    for ch in s.chars() {
        units += ch.len_utf16();
        if units > offset {
            return units;
        }
    }
    units
}

/// Insert `insert` at UTF-16 `offset`. `None` if the offset is not a boundary.
pub fn insert_at(s: &str, offset: usize, insert: &str) -> Option<String> {
    let byte = byte_index(s, offset)?;
    let mut out = String::with_capacity(s.len() + insert.len());
    out.push_str(&s[..byte]);
    out.push_str(insert);
    out.push_str(&s[byte..]);
    Some(out)
}

/// Remove the UTF-16 range `start..end`, snapping both ends to char boundaries.
pub fn remove_range(s: &str, start: usize, end: usize) -> String {
    let start = byte_index_floor(s, start);
    let end = byte_index_floor(s, end).max(start);
    let mut out = String::with_capacity(s.len() - (end - start));
    out.push_str(&s[..start]);
    out.push_str(&s[end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets() {
        assert_eq!(utf16_len("hello"), 5);
        assert_eq!(byte_index("hello", 2), Some(2));
        assert_eq!(byte_index("hello", 5), Some(5));
        assert_eq!(byte_index("hello", 6), None);
    }

    #[test]
    fn test_surrogate_pairs() {
        // U+1F600 is two UTF-16 units and four UTF-8 bytes
        let s = "a\u{1F600}b";
        assert_eq!(utf16_len(s), 4);
        assert_eq!(byte_index(s, 1), Some(1));
        assert_eq!(byte_index(s, 2), None);
        assert_eq!(byte_index(s, 3), Some(5));
        assert_eq!(byte_index_floor(s, 2), 1);
        assert_eq!(clamp_offset(s, 2), 1);
        assert_eq!(prev_boundary(s, 3), 1);
        assert_eq!(next_boundary(s, 1), 3);
    }

    #[test]
    fn test_insert_and_remove() {
        assert_eq!(insert_at("ho", 2, "j").as_deref(), Some("hoj"));
        assert_eq!(insert_at("ho", 0, "e").as_deref(), Some("eho"));
        assert_eq!(insert_at("ho", 3, "x"), None);
        assert_eq!(remove_range("hello", 1, 3), "hlo");
        assert_eq!(remove_range("hello", 3, 99), "hel");
    }

    #[test]
    fn test_boundaries_at_edges() {
        assert_eq!(prev_boundary("abc", 0), 0);
        assert_eq!(next_boundary("abc", 3), 3);
        assert_eq!(clamp_offset("abc", 10), 3);
    }
}
