/// Stable bucket index for `key` in `[0, max_index)`.
///
/// A 32-bit polynomial string hash (`h * 31 + c`, wrapping). It must never
/// change: bundle readers recompute it to find the chunk holding a result.
pub fn hash_key(key: &str, max_index: usize) -> usize {
    let mut hash: i32 = 0;
    for c in key.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(c as i32);
    }

    hash.unsigned_abs() as usize % max_index.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(hash_key("", 10), 0);
        // 'a' = 97
        assert_eq!(hash_key("a", 1000), 97);
        // 31 * 49 + 50 = 1569
        assert_eq!(hash_key("12", 1000), 569);
    }

    #[test]
    fn test_always_in_range() {
        for max in [1usize, 2, 7, 1000] {
            for id in 0..5_000u64 {
                assert!(hash_key(&id.to_string(), max) < max);
            }
        }
        // Long keys overflow i32 repeatedly
        let long = "9".repeat(200);
        assert!(hash_key(&long, 13) < 13);
    }

    #[test]
    fn test_stable() {
        assert_eq!(hash_key("123456", 97), hash_key("123456", 97));
    }
}
