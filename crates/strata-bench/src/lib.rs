//! Benchmark workloads for the Strata memory resource framework.
//!
//! - [`mixed_requests`]: deterministic allocation requests of varied size
//!   and alignment, drawn from a seed
//! - [`Request`]: one `(bytes, alignment)` pair
//! - [`arena_profile`]: the arena configuration the benches run against

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_arena::ArenaConfig;

/// Alignments drawn by [`mixed_requests`].
pub const ALIGNMENTS: [usize; 4] = [1, 8, 16, 64];

/// Largest request size drawn by [`mixed_requests`].
pub const MAX_REQUEST: usize = 512;

/// One allocation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Requested size in bytes, never zero.
    pub bytes: usize,
    /// Requested alignment, a power of two.
    pub alignment: usize,
}

/// Generate `count` deterministic requests from `seed`.
///
/// Sizes fall in `1..=MAX_REQUEST` and alignments cycle through
/// [`ALIGNMENTS`] using a simple LCG, so every run of a bench sees the
/// same sequence.
pub fn mixed_requests(count: usize, seed: u64) -> Vec<Request> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let bits = state >> 33;
            Request {
                bytes: (bits as usize % MAX_REQUEST) + 1,
                alignment: ALIGNMENTS[(bits >> 16) as usize % ALIGNMENTS.len()],
            }
        })
        .collect()
}

/// Arena configuration used by the benches: 64 KiB first block, 4 MiB cap.
pub fn arena_profile() -> ArenaConfig {
    ArenaConfig::new(64 * 1024).with_max_block_size(4 * 1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_requests_deterministic() {
        assert_eq!(mixed_requests(100, 7), mixed_requests(100, 7));
        assert_ne!(mixed_requests(100, 7), mixed_requests(100, 8));
    }

    #[test]
    fn mixed_requests_in_range() {
        for r in mixed_requests(1000, 42) {
            assert!(r.bytes >= 1 && r.bytes <= MAX_REQUEST);
            assert!(r.alignment.is_power_of_two());
        }
    }

    #[test]
    fn arena_profile_validates() {
        arena_profile().validate().unwrap();
    }
}
