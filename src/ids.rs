//! Id generation, injectable so tests can assert against deterministic ids.
//!
//! The only entity id this store ever generates on a caller's behalf is a chain id
//! left unset; every other entity id is supplied by the caller. The scheme is
//! `prefix-<8 hex chars>`, the first 8 hex digits of a fresh 128-bit value.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid7::uuid7;

/// A source of fresh ids. Generators must be statistically unique within a run --
/// a collision becomes an `append-only-violation`, caller error rather than
/// corruption.
pub trait IdGenerator: Send + Sync {
    fn gen_id(&self, prefix: &str) -> String;
}

/// The real generator, backed by a uuid7 value's leading hex digits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Uuid7IdGenerator;

impl IdGenerator for Uuid7IdGenerator {
    fn gen_id(&self, prefix: &str) -> String {
        let id = uuid7();
        let bytes = id.as_bytes();
        let hex: String = bytes.iter().take(4).map(|b| format!("{b:02x}")).collect();
        format!("{prefix}-{hex}")
    }
}

/// A deterministic generator for tests: `{prefix}-{counter:08x}`, counting up from
/// zero so assertions can name the exact id a call will produce.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn gen_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}-{n:08x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid7_generator_produces_prefixed_eight_hex_chars() {
        let gen = Uuid7IdGenerator;
        let id = gen.gen_id("chain");
        let (prefix, suffix) = id.split_once('-').unwrap();
        assert_eq!(prefix, "chain");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn uuid7_generator_is_statistically_unique() {
        let gen = Uuid7IdGenerator;
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| gen.gen_id("x")).collect();
        assert!(ids.len() > 990);
    }

    #[test]
    fn sequential_generator_counts_up() {
        let gen = SequentialIdGenerator::new();
        assert_eq!(gen.gen_id("chain"), "chain-00000000");
        assert_eq!(gen.gen_id("chain"), "chain-00000001");
    }
}
