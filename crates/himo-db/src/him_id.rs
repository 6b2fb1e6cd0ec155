//! HIM ID allocation.
//!
//! A HIM ID is the user-facing identifier (`HIM` + six digits). Candidates
//! come from a [`HimIdGenerator`] and are checked against the store a bounded
//! number of times, so collision and exhaustion paths can be driven by a
//! scripted generator in tests.

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

/// Number of candidates tried before registration gives up.
pub const HIM_ID_ATTEMPTS: u32 = 100;

pub trait HimIdGenerator {
    /// Candidate for the given attempt. Attempts are numbered from zero.
    fn candidate(&mut self, username: &str, attempt: u32) -> String;
}

impl<F> HimIdGenerator for F
where
    F: FnMut(&str, u32) -> String,
{
    fn candidate(&mut self, username: &str, attempt: u32) -> String {
        self(username, attempt)
    }
}

/// Production generator: SHA-256 over username, request id and attempt.
pub struct HashedHimIds {
    request_id: Uuid,
}

impl HashedHimIds {
    pub fn new(request_id: Uuid) -> Self {
        Self { request_id }
    }
}

impl HimIdGenerator for HashedHimIds {
    fn candidate(&mut self, username: &str, attempt: u32) -> String {
        let digest = Sha256::new()
            .chain_update(username.as_bytes())
            .chain_update(self.request_id.as_bytes())
            .chain_update(attempt.to_be_bytes())
            .finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        format_him_id(u64::from_be_bytes(prefix) % 1_000_000)
    }
}

pub fn format_him_id(n: u64) -> String {
    format!("HIM{:06}", n)
}

/// Return the first candidate `is_taken` rejects, or `None` once
/// `max_attempts` candidates have all been taken.
pub fn allocate_him_id<G, F>(
    generator: &mut G,
    username: &str,
    max_attempts: u32,
    mut is_taken: F,
) -> Result<Option<String>>
where
    G: HimIdGenerator + ?Sized,
    F: FnMut(&str) -> Result<bool>,
{
    for attempt in 0..max_attempts {
        let candidate = generator.candidate(username, attempt);
        if !is_taken(&candidate)? {
            return Ok(Some(candidate));
        }
        debug!("HIM ID {} already taken (attempt {})", candidate, attempt);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_candidates_are_well_formed_and_vary_by_attempt() {
        let mut ids = HashedHimIds::new(Uuid::new_v4());
        let first = ids.candidate("alice", 0);
        let second = ids.candidate("alice", 1);

        for id in [&first, &second] {
            assert_eq!(id.len(), 9);
            assert!(id.starts_with("HIM"));
            assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
        }
        assert_eq!(first, ids.candidate("alice", 0));
        assert_ne!(first, second);
    }

    #[test]
    fn skips_taken_candidates() {
        let mut scripted = |_: &str, attempt: u32| format_him_id(attempt as u64);
        let taken = ["HIM000000", "HIM000001"];

        let id = allocate_him_id(&mut scripted, "bob", HIM_ID_ATTEMPTS, |c| {
            Ok(taken.contains(&c))
        })
        .unwrap();

        assert_eq!(id.as_deref(), Some("HIM000002"));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut lookups = 0;
        let mut constant = |_: &str, _: u32| "HIM123456".to_string();

        let id = allocate_him_id(&mut constant, "bob", HIM_ID_ATTEMPTS, |_| {
            lookups += 1;
            Ok(true)
        })
        .unwrap();

        assert!(id.is_none());
        assert_eq!(lookups, HIM_ID_ATTEMPTS);
    }

    #[test]
    fn store_errors_propagate() {
        let mut constant = |_: &str, _: u32| "HIM123456".to_string();
        let result = allocate_him_id(&mut constant, "bob", 3, |_| {
            Err(anyhow::anyhow!("disk on fire"))
        });
        assert!(result.is_err());
    }
}
