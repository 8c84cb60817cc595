//! Outcome sources for the round draw.
//!
//! The engine draws one digit per round through the [`OutcomeSource`] trait
//! so the randomness is pluggable: the thread RNG in production, a seeded
//! ChaCha stream for reproducible simulation runs, and fixed sequences in
//! tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::rules::{Outcome, OUTCOME_SPACE};

/// Source of drawn digits, one per resolved round
pub trait OutcomeSource: Send + Sync {
    fn next_outcome(&self) -> Outcome;
}

/// Uniform draws from the thread-local RNG
#[derive(Debug, Default)]
pub struct ThreadRngOutcomes;

impl OutcomeSource for ThreadRngOutcomes {
    fn next_outcome(&self) -> Outcome {
        Outcome::new_unchecked(rand::thread_rng().gen_range(0..OUTCOME_SPACE))
    }
}

/// Deterministic draws from a seeded ChaCha8 stream
pub struct SeededOutcomes {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededOutcomes {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl OutcomeSource for SeededOutcomes {
    fn next_outcome(&self) -> Outcome {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Outcome::new_unchecked(rng.gen_range(0..OUTCOME_SPACE))
    }
}

/// Cycles through a fixed digit sequence
pub struct FixedOutcomes {
    sequence: Vec<Outcome>,
    position: AtomicUsize,
}

impl FixedOutcomes {
    pub fn new(digits: Vec<u8>) -> Result<Self> {
        if digits.is_empty() {
            return Err(Error::InvalidState(
                "outcome sequence must not be empty".into(),
            ));
        }
        let sequence = digits
            .into_iter()
            .map(Outcome::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            sequence,
            position: AtomicUsize::new(0),
        })
    }
}

impl OutcomeSource for FixedOutcomes {
    fn next_outcome(&self) -> Outcome {
        let index = self.position.fetch_add(1, Ordering::Relaxed) % self.sequence.len();
        self.sequence[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_stays_in_range() {
        let source = ThreadRngOutcomes;
        for _ in 0..1000 {
            assert!(source.next_outcome().digit() < OUTCOME_SPACE);
        }
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let a = SeededOutcomes::new(42);
        let b = SeededOutcomes::new(42);
        let draws_a: Vec<u8> = (0..20).map(|_| a.next_outcome().digit()).collect();
        let draws_b: Vec<u8> = (0..20).map(|_| b.next_outcome().digit()).collect();
        assert_eq!(draws_a, draws_b);

        let c = SeededOutcomes::new(43);
        let draws_c: Vec<u8> = (0..20).map(|_| c.next_outcome().digit()).collect();
        assert_ne!(draws_a, draws_c);
    }

    #[test]
    fn test_fixed_sequence_cycles() {
        let source = FixedOutcomes::new(vec![7, 4, 0]).unwrap();
        let draws: Vec<u8> = (0..7).map(|_| source.next_outcome().digit()).collect();
        assert_eq!(draws, vec![7, 4, 0, 7, 4, 0, 7]);
    }

    #[test]
    fn test_fixed_sequence_rejects_bad_input() {
        assert!(FixedOutcomes::new(vec![]).is_err());
        assert!(FixedOutcomes::new(vec![4, 12]).is_err());
    }
}
