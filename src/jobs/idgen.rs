//! Job identifier generation.
//!
//! Jobs are keyed by ULIDs: 26-character Crockford base32, millisecond
//! timestamp prefix, monotonic within a millisecond. Sorting ids
//! lexicographically sorts jobs by creation time, which is what the claim
//! ordering relies on to break `created_at` ties deterministically.

use std::sync::Mutex;

use ulid::Generator;

/// Monotonic ULID generator, safe to share across request handlers.
pub struct IdGenerator {
    inner: Mutex<Generator>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Generator::new()),
        }
    }

    /// Returns a fresh 26-character ULID string.
    ///
    /// Monotonicity can only fail if the intra-millisecond random component
    /// overflows, which requires ~2^80 ids in one millisecond; falls back to
    /// a non-monotonic id rather than failing the caller.
    pub fn generate(&self) -> String {
        let mut generator = self.inner.lock().expect("id generator mutex poisoned");
        match generator.generate() {
            Ok(id) => id.to_string(),
            Err(_) => ulid::Ulid::new().to_string(),
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn format_is_26_char_base32() {
        let generator = IdGenerator::new();
        let id = generator.generate();
        assert_eq!(id.len(), 26);
        assert!(id
            .chars()
            .all(|c| "0123456789ABCDEFGHJKMNPQRSTVWXYZ".contains(c)));
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let generator = IdGenerator::new();
        let ids: Vec<String> = (0..1000).map(|_| generator.generate()).collect();

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, ids, "generation order must be lexicographic order");
    }
}
