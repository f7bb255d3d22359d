//! Bloom filters over the identifiers a dump imports from a package.

use probabilistic_collections::SipHasherBuilder;
use probabilistic_collections::bloom::BloomFilter;

use crate::correlation::error::{CorrelateError, CorrelateResult};

// Fixed seeds keep filters byte-identical across runs
const HASHER_SEEDS: [(u64, u64); 2] = [(0x6c73_6966, 0x636f_7272), (0x6275_6e64, 0x6c65_7321)];

fn hashers() -> [SipHasherBuilder; 2] {
    HASHER_SEEDS.map(|(k0, k1)| SipHasherBuilder::from_seed(k0, k1))
}

/// Build and serialize a filter containing every identifier.
pub fn create_filter(identifiers: &[String], false_positive_rate: f64) -> CorrelateResult<Vec<u8>> {
    if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
        return Err(CorrelateError::BloomFilter {
            reason: format!("false positive rate {false_positive_rate} is outside (0, 1)"),
        });
    }

    let mut filter: BloomFilter<String> =
        BloomFilter::with_hashers(identifiers.len().max(1), false_positive_rate, hashers());
    for identifier in identifiers {
        filter.insert(identifier);
    }

    serde_json::to_vec(&filter).map_err(|e| CorrelateError::BloomFilter {
        reason: e.to_string(),
    })
}

/// A decoded filter, for answering "might this dump reference X".
pub struct IdentifierFilter {
    inner: BloomFilter<String>,
}

impl IdentifierFilter {
    pub fn decode(bytes: &[u8]) -> CorrelateResult<Self> {
        let inner = serde_json::from_slice(bytes).map_err(|e| CorrelateError::BloomFilter {
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// `false` means definitely absent; `true` means possibly present.
    pub fn contains(&self, identifier: &str) -> bool {
        self.inner.contains(&identifier.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifiers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_false_negatives() {
        let ids: Vec<String> = (0..500).map(|i| format!("pkg.Symbol{i}")).collect();
        let bytes = create_filter(&ids, 0.01).unwrap();
        let filter = IdentifierFilter::decode(&bytes).unwrap();

        for id in &ids {
            assert!(filter.contains(id), "missing {id}");
        }
    }

    #[test]
    fn test_false_positive_rate() {
        let ids: Vec<String> = (0..1000).map(|i| format!("in{i}")).collect();
        let filter = IdentifierFilter::decode(&create_filter(&ids, 0.01).unwrap()).unwrap();

        let false_positives = (0..10_000)
            .filter(|i| filter.contains(&format!("out{i}")))
            .count();
        assert!(false_positives < 500, "too many false positives: {false_positives}");
    }

    #[test]
    fn test_deterministic_bytes() {
        let ids = identifiers(&["fmt.Println", "os.Exit"]);
        assert_eq!(create_filter(&ids, 0.01).unwrap(), create_filter(&ids, 0.01).unwrap());
    }

    #[test]
    fn test_empty_filter() {
        let filter = IdentifierFilter::decode(&create_filter(&[], 0.01).unwrap()).unwrap();
        assert!(!filter.contains("anything"));
    }

    #[test]
    fn test_invalid_rate_is_an_error() {
        let ids = identifiers(&["a"]);
        assert!(matches!(
            create_filter(&ids, 0.0),
            Err(CorrelateError::BloomFilter { .. })
        ));
        assert!(create_filter(&ids, 1.5).is_err());
    }
}
