use derive_more::Display;
use std::{
    sync::{LazyLock, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use ulid::Ulid;

///
/// GENERATOR is lazily initiated with a Mutex
/// it has to keep state so identifiers stay monotonic within a process
///

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

///
/// QueryId
///
/// Opaque identifier correlating one federated query handle to its set of
/// per-shard slots. Unique per handle, immutable for the handle's lifetime.
/// Equality is identity.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct QueryId(Ulid);

impl QueryId {
    /// Generate a fresh identifier from the process-local generator.
    #[must_use]
    pub fn generate() -> Self {
        let mut generator = GENERATOR.lock().expect("query id generator mutex poisoned");

        Self(generator.generate())
    }

    #[must_use]
    pub const fn nil() -> Self {
        Self(Ulid::nil())
    }
}

///
/// Generator
///
/// Monotonic ULID generation without the `rand` stack: a xorshift state
/// seeded from the clock supplies randomness, and generation within the
/// same millisecond increments the previous value instead.
///

struct Generator {
    previous: Ulid,
    state: u64,
}

impl Generator {
    fn new() -> Self {
        // seed must be non-zero for xorshift
        let seed = now_nanos() | 1;

        Self {
            previous: Ulid::nil(),
            state: seed,
        }
    }

    fn generate(&mut self) -> Ulid {
        let last_ts = self.previous.timestamp_ms();
        let ts = now_millis();

        // maybe time went backward, or it is the same ms.
        // increment instead of generating a new random so that it is monotonic
        if ts <= last_ts {
            let next = self
                .previous
                .increment()
                .unwrap_or_else(|| Ulid::from_parts(last_ts.saturating_add(1), 0));
            self.previous = next;

            return self.previous;
        }

        let rand = self.next_u128();
        self.previous = Ulid::from_parts(ts, rand);

        self.previous
    }

    fn next_u128(&mut self) -> u128 {
        let hi = self.next_u64();
        let lo = self.next_u64();

        (u128::from(hi) << 64) | u128::from(lo)
    }

    // xorshift64*
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;

        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_nanos() & u128::from(u64::MAX)).unwrap_or(u64::MAX))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_monotonic() {
        let a = QueryId::generate();
        let b = QueryId::generate();

        assert!(a < b);
    }

    #[test]
    fn generated_ids_are_distinct() {
        let ids: Vec<QueryId> = (0..64).map(|_| QueryId::generate()).collect();

        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
