//! Arena configuration parameters.

use crate::block::HEADER_SIZE;
use crate::error::ConfigError;

/// Configuration for an [`ArenaResource`](crate::ArenaResource).
///
/// Controls block sizing and the large-allocation threshold. Validated at
/// construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Payload size of the first block in bytes.
    ///
    /// Default: 262_144 (256 KiB). This is also the large-allocation
    /// threshold: requests strictly larger than it bypass the block chain
    /// and go straight to the upstream resource. The threshold stays fixed
    /// while later blocks grow.
    pub initial_block_size: usize,

    /// Upper bound for the doubling block-size policy in bytes.
    ///
    /// Default: 67_108_864 (64 MiB). Each block acquisition doubles the
    /// size of the next block until this cap is reached. Must be at least
    /// `initial_block_size`.
    pub max_block_size: usize,
}

impl ArenaConfig {
    /// Default first-block payload: 256 KiB.
    pub const DEFAULT_INITIAL_BLOCK_SIZE: usize = 256 * 1024;

    /// Default block-size cap: 64 MiB.
    pub const DEFAULT_MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

    /// Largest block payload the arena can request from its upstream.
    pub const MAX_REPRESENTABLE_BLOCK: usize = isize::MAX as usize - HEADER_SIZE;

    /// Create a config with the given first-block size.
    ///
    /// The cap is the default, raised to `initial_block_size` if that is
    /// larger.
    pub fn new(initial_block_size: usize) -> Self {
        Self {
            initial_block_size,
            max_block_size: Self::DEFAULT_MAX_BLOCK_SIZE.max(initial_block_size),
        }
    }

    /// Set the block-size cap.
    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    /// Size above which allocations are forwarded upstream untracked.
    pub fn large_threshold(&self) -> usize {
        self.initial_block_size
    }

    /// Check the config for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.initial_block_size > Self::MAX_REPRESENTABLE_BLOCK {
            return Err(ConfigError::BlockSizeTooLarge {
                requested: self.initial_block_size,
                max: Self::MAX_REPRESENTABLE_BLOCK,
            });
        }
        if self.max_block_size < self.initial_block_size {
            return Err(ConfigError::CapBelowInitial {
                initial: self.initial_block_size,
                cap: self.max_block_size,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_BLOCK_SIZE)
    }
}
