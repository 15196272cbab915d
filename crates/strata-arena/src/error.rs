//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors from [`ArenaConfig::validate`](crate::ArenaConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `initial_block_size` is zero.
    ZeroBlockSize,
    /// `initial_block_size` plus the block header cannot be described by
    /// a `Layout`.
    BlockSizeTooLarge {
        /// The configured block size.
        requested: usize,
        /// Largest accepted block size.
        max: usize,
    },
    /// `max_block_size` is smaller than `initial_block_size`.
    CapBelowInitial {
        /// The configured first-block size.
        initial: usize,
        /// The configured cap.
        cap: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockSize => write!(f, "arena block size must be non-zero"),
            Self::BlockSizeTooLarge { requested, max } => {
                write!(
                    f,
                    "arena block size {requested} bytes exceeds maximum {max} bytes"
                )
            }
            Self::CapBelowInitial { initial, cap } => {
                write!(
                    f,
                    "arena block size cap {cap} bytes is below initial block size {initial} bytes"
                )
            }
        }
    }
}

impl Error for ConfigError {}
