//! Monotonic (bump) memory resource.
//!
//! [`ArenaResource`] carves sequential, aligned ranges out of large blocks
//! obtained from an upstream resource and never frees individual
//! allocations. Memory goes back upstream only in bulk, on
//! [`release`](ArenaResource::release) or drop.
//!
//! # Allocation
//!
//! ```text
//! bytes > threshold ──► upstream.allocate(bytes, align)        (untracked)
//! fits current block ──► bump current_offset                   (no upstream call)
//! otherwise ──► push new block (max(bytes, next_block_size)), then bump
//! ```
//!
//! The threshold is the configured `initial_block_size` and never changes,
//! so `deallocate` can tell a standalone allocation from a chained one by
//! its size alone.

use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

use strata_core::{align_up, default_resource, AllocError, MemoryResource, ResourceId};
use tracing::{debug, trace};

use crate::block::{Block, BlockList, HEADER_ALIGN};
use crate::config::ArenaConfig;
use crate::error::ConfigError;

/// Bump-allocating memory resource over a borrowed upstream resource.
///
/// Single-threaded: state lives in `Cell`s, so the arena is neither `Send`
/// nor `Sync`. Callers needing shared access across threads must wrap it
/// in their own synchronisation.
pub struct ArenaResource<'u> {
    id: ResourceId,
    upstream: &'u dyn MemoryResource,
    config: ArenaConfig,
    /// Payload size of the next block to acquire.
    next_block_size: Cell<usize>,
    blocks: BlockList,
    /// Block currently being filled; always the list head when set.
    current: Cell<Option<Block>>,
    /// Bytes already handed out from `current`.
    current_offset: Cell<usize>,
}

impl<'u> ArenaResource<'u> {
    /// Create an arena over `upstream` with the default configuration.
    pub fn new(upstream: &'u dyn MemoryResource) -> Self {
        Self::build(ArenaConfig::default(), upstream)
    }

    /// Create an arena whose first block (and large-allocation threshold)
    /// is `initial_block_size` bytes.
    pub fn with_block_size(
        initial_block_size: usize,
        upstream: &'u dyn MemoryResource,
    ) -> Result<Self, ConfigError> {
        Self::with_config(ArenaConfig::new(initial_block_size), upstream)
    }

    /// Create an arena with an explicit configuration.
    pub fn with_config(
        config: ArenaConfig,
        upstream: &'u dyn MemoryResource,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, upstream))
    }

    fn build(config: ArenaConfig, upstream: &'u dyn MemoryResource) -> Self {
        Self {
            id: ResourceId::next(),
            upstream,
            next_block_size: Cell::new(config.initial_block_size),
            config,
            blocks: BlockList::new(),
            current: Cell::new(None),
            current_offset: Cell::new(0),
        }
    }

    /// The resource blocks and large allocations are obtained from.
    pub fn upstream_resource(&self) -> &'u dyn MemoryResource {
        self.upstream
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Number of blocks currently owned.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Payload bytes across all owned blocks (headers excluded).
    pub fn memory_bytes(&self) -> usize {
        self.blocks.payload_bytes()
    }

    /// Bytes consumed in the current block, including alignment padding.
    pub fn used_bytes(&self) -> usize {
        self.current_offset.get()
    }

    /// Bytes still free at the end of the current block.
    pub fn remaining(&self) -> usize {
        self.current
            .get()
            .map_or(0, |block| block.size() - self.current_offset.get())
    }

    /// Payload size the next acquired block will have (before any
    /// enlargement for the request that triggers it).
    pub fn next_block_size(&self) -> usize {
        self.next_block_size.get()
    }

    /// Return every block to the upstream resource and reset the arena.
    ///
    /// Large allocations forwarded upstream are not tracked and are not
    /// affected. Calling `release` on an empty arena does nothing, and the
    /// arena may be used again afterwards.
    pub fn release(&mut self) {
        let count = self.blocks.len();
        if count > 0 {
            debug!(
                blocks = count,
                payload_bytes = self.blocks.payload_bytes(),
                "arena releasing blocks"
            );
        }
        // SAFETY: every block was pushed with `self.upstream`, and `&mut
        // self` guarantees no handle still borrows this arena.
        unsafe { self.blocks.release(self.upstream) };
        self.current.set(None);
        self.current_offset.set(0);
        self.next_block_size.set(self.config.initial_block_size);
    }

    /// Try to carve `bytes` at `alignment` out of the current block.
    fn bump(&self, bytes: usize, alignment: usize) -> Option<NonNull<u8>> {
        let block = self.current.get()?;
        let base = block.base() as usize;
        let position = base.checked_add(self.current_offset.get())?;
        let start = align_up(position, alignment)? - base;
        let end = start.checked_add(bytes)?;
        if end > block.size() {
            return None;
        }
        self.current_offset.set(end);
        // SAFETY: `start <= end <= size`, so the address lies inside the
        // block's payload.
        NonNull::new(unsafe { block.base().add(start) })
    }

    /// Push a block big enough for `bytes` at `alignment` and make it
    /// current.
    fn acquire_block(&self, bytes: usize, alignment: usize) -> Result<(), AllocError> {
        // Payload starts header-aligned; stricter alignments may need padding.
        let slack = alignment.saturating_sub(HEADER_ALIGN);
        let needed = bytes
            .checked_add(slack)
            .ok_or(AllocError::AllocationFailure { bytes, alignment })?;
        let payload = needed.max(self.next_block_size.get());

        let block = self.blocks.push(self.upstream, payload)?;
        self.current.set(Some(block));
        self.current_offset.set(0);

        let grown = self
            .next_block_size
            .get()
            .saturating_mul(2)
            .min(self.config.max_block_size);
        self.next_block_size.set(grown);

        debug!(
            payload,
            combined = block.combined_size(),
            blocks = self.blocks.len(),
            next_block_size = grown,
            "arena acquired block"
        );
        Ok(())
    }
}

impl ArenaResource<'static> {
    /// Create an arena over the process-wide default resource.
    pub fn on_default_resource() -> Self {
        Self::new(default_resource())
    }
}

impl MemoryResource for ArenaResource<'_> {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn do_allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        if bytes > self.config.large_threshold() {
            trace!(bytes, alignment, "arena forwarding large allocation upstream");
            let ptr = self.upstream.allocate(bytes, alignment)?;
            return NonNull::new(ptr).ok_or(AllocError::AllocationFailure { bytes, alignment });
        }

        if let Some(ptr) = self.bump(bytes, alignment) {
            return Ok(ptr);
        }

        self.acquire_block(bytes, alignment)?;
        // A fresh block is sized for `bytes` plus worst-case padding.
        self.bump(bytes, alignment)
            .ok_or(AllocError::AllocationFailure { bytes, alignment })
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, bytes: usize, alignment: usize) {
        // Chained allocations are reclaimed only with their block.
        if bytes > self.config.large_threshold() {
            trace!(bytes, alignment, "arena returning large allocation upstream");
            // SAFETY: allocations above the threshold came straight from
            // the upstream with the same size and alignment.
            unsafe { self.upstream.deallocate(ptr.as_ptr(), bytes, alignment) };
        }
    }
}

impl Drop for ArenaResource<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ArenaResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaResource")
            .field("id", &self.id)
            .field("upstream", &self.upstream.resource_id())
            .field("config", &self.config)
            .field("blocks", &self.blocks.len())
            .field("used_bytes", &self.current_offset.get())
            .field("next_block_size", &self.next_block_size.get())
            .finish()
    }
}
