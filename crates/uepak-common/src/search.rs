//! Byte pattern search.
//!
//! Thin wrappers over `memchr`, which already picks the best SIMD
//! implementation for the running CPU.

/// Find a multi-byte pattern in a slice.
#[inline]
pub fn find_pattern(needle: &[u8], haystack: &[u8]) -> Option<usize> {
    memchr::memmem::find(haystack, needle)
}

/// Find a multi-byte pattern in a slice, searching from the end.
#[inline]
pub fn find_pattern_reverse(needle: &[u8], haystack: &[u8]) -> Option<usize> {
    memchr::memmem::rfind(haystack, needle)
}

/// Find the last occurrence of a little-endian u32 within the final `window`
/// bytes of `data`, returning its absolute offset.
pub fn rfind_u32_in_tail(value: u32, data: &[u8], window: usize) -> Option<usize> {
    let start = data.len().saturating_sub(window);
    find_pattern_reverse(&value.to_le_bytes(), &data[start..]).map(|pos| start + pos)
}

/// Iterate every occurrence of a little-endian u32 within the final `window`
/// bytes of `data`, last occurrence first, as absolute offsets.
pub fn rfind_all_u32_in_tail(value: u32, data: &[u8], window: usize) -> Vec<usize> {
    let start = data.len().saturating_sub(window);
    let needle = value.to_le_bytes();
    let mut hits: Vec<usize> = memchr::memmem::find_iter(&data[start..], &needle)
        .map(|pos| start + pos)
        .collect();
    hits.reverse();
    hits
}

/// Check if a slice contains only zero bytes.
#[inline]
pub fn is_all_zeros(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pattern() {
        let data = b"hello world hello";
        assert_eq!(find_pattern(b"world", data), Some(6));
        assert_eq!(find_pattern_reverse(b"hello", data), Some(12));
        assert_eq!(find_pattern(b"xyz", data), None);
    }

    #[test]
    fn test_rfind_u32_in_tail() {
        let mut data = vec![0u8; 64];
        data[10..14].copy_from_slice(&0x5A6F12E1u32.to_le_bytes());
        data[50..54].copy_from_slice(&0x5A6F12E1u32.to_le_bytes());

        assert_eq!(rfind_u32_in_tail(0x5A6F12E1, &data, 64), Some(50));
        assert_eq!(rfind_u32_in_tail(0x5A6F12E1, &data, 10), None);
        assert_eq!(rfind_all_u32_in_tail(0x5A6F12E1, &data, 64), vec![50, 10]);
    }

    #[test]
    fn test_is_all_zeros() {
        assert!(is_all_zeros(&[0; 100]));
        assert!(!is_all_zeros(&[0, 0, 1]));
    }
}
