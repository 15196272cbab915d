//! Upstream-backed memory blocks and the chain that owns them.
//!
//! Each [`Block`] is one upstream allocation holding a [`BlockHeader`]
//! followed immediately by the payload the arena bumps through:
//!
//! ```text
//! ┌──────────────┬───────────────────────────────┐
//! │ BlockHeader  │ payload (size bytes)          │
//! └──────────────┴───────────────────────────────┘
//! ^ upstream ptr ^ base()
//! ```
//!
//! Blocks are chained newest-first through the header's `next` link and
//! are only ever freed all at once by [`BlockList::release`].

use std::cell::Cell;
use std::mem;
use std::ptr::NonNull;

use strata_core::{AllocError, MemoryResource};

/// Header written at the start of every block allocation.
#[repr(C)]
pub(crate) struct BlockHeader {
    /// Payload size in bytes (excludes the header).
    size: usize,
    /// The block allocated before this one.
    next: Option<NonNull<BlockHeader>>,
}

/// Size of [`BlockHeader`]; the payload starts this many bytes in.
pub(crate) const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

/// Alignment every block allocation is requested at.
pub(crate) const HEADER_ALIGN: usize = mem::align_of::<BlockHeader>();

/// A live block in the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Block {
    header: NonNull<BlockHeader>,
}

impl Block {
    /// First byte of the payload.
    pub(crate) fn base(self) -> *mut u8 {
        // SAFETY: the payload directly follows the header inside the same
        // upstream allocation.
        unsafe { self.header.as_ptr().cast::<u8>().add(HEADER_SIZE) }
    }

    /// Payload size in bytes.
    pub(crate) fn size(self) -> usize {
        // SAFETY: the header was initialised by `BlockList::push` and stays
        // valid until `BlockList::release`.
        unsafe { (*self.header.as_ptr()).size }
    }

    /// Header plus payload: the size the block was allocated with.
    pub(crate) fn combined_size(self) -> usize {
        HEADER_SIZE + self.size()
    }

    fn next(self) -> Option<Block> {
        // SAFETY: as in `size`.
        unsafe { (*self.header.as_ptr()).next }.map(|header| Block { header })
    }
}

/// Singly linked, newest-first list of blocks owned by one arena.
pub(crate) struct BlockList {
    head: Cell<Option<Block>>,
    count: Cell<usize>,
    payload_bytes: Cell<usize>,
}

impl BlockList {
    pub(crate) fn new() -> Self {
        Self {
            head: Cell::new(None),
            count: Cell::new(0),
            payload_bytes: Cell::new(0),
        }
    }

    /// Allocate a block with `payload` bytes from `upstream` and push it
    /// onto the head of the list.
    ///
    /// On failure the list is unchanged and the upstream error is
    /// returned as is.
    pub(crate) fn push(
        &self,
        upstream: &dyn MemoryResource,
        payload: usize,
    ) -> Result<Block, AllocError> {
        let combined = payload
            .checked_add(HEADER_SIZE)
            .ok_or(AllocError::AllocationFailure {
                bytes: payload,
                alignment: HEADER_ALIGN,
            })?;
        let raw = upstream.allocate(combined, HEADER_ALIGN)?;
        let header = NonNull::new(raw.cast::<BlockHeader>()).ok_or(
            AllocError::AllocationFailure {
                bytes: combined,
                alignment: HEADER_ALIGN,
            },
        )?;
        // SAFETY: `header` is a fresh allocation of at least HEADER_SIZE
        // bytes aligned for `BlockHeader`.
        unsafe {
            header.as_ptr().write(BlockHeader {
                size: payload,
                next: self.head.get().map(|b| b.header),
            });
        }
        let block = Block { header };
        self.head.set(Some(block));
        self.count.set(self.count.get() + 1);
        self.payload_bytes.set(self.payload_bytes.get() + payload);
        Ok(block)
    }

    /// Return every block to `upstream`, newest first, and empty the list.
    ///
    /// Calling this on an empty list does nothing.
    ///
    /// # Safety
    ///
    /// `upstream` must be the resource (or one equal to it) every block
    /// was pushed with, and no pointer into any payload may be used
    /// afterwards.
    pub(crate) unsafe fn release(&self, upstream: &dyn MemoryResource) {
        let mut cursor = self.head.take();
        while let Some(block) = cursor {
            cursor = block.next();
            let combined = block.combined_size();
            // SAFETY: the block was allocated from `upstream` with exactly
            // this size and alignment in `push`.
            unsafe { upstream.deallocate(block.header.as_ptr().cast(), combined, HEADER_ALIGN) };
        }
        self.count.set(0);
        self.payload_bytes.set(0);
    }

    /// Number of blocks in the list.
    pub(crate) fn len(&self) -> usize {
        self.count.get()
    }

    /// Total payload bytes across all blocks.
    pub(crate) fn payload_bytes(&self) -> usize {
        self.payload_bytes.get()
    }

    /// Iterate from newest to oldest.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = Block> {
        std::iter::successors(self.head.get(), |b| b.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::SystemResource;

    #[test]
    fn header_is_pointer_aligned() {
        assert!(HEADER_ALIGN >= mem::align_of::<usize>());
        assert_eq!(HEADER_SIZE % HEADER_ALIGN, 0);
    }

    #[test]
    fn push_links_newest_first() {
        let sys = SystemResource::new();
        let list = BlockList::new();
        let a = list.push(&sys, 64).unwrap();
        let b = list.push(&sys, 128).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.payload_bytes(), 192);
        let order: Vec<_> = list.iter().collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(a.size(), 64);
        assert_eq!(b.combined_size(), 128 + HEADER_SIZE);
        unsafe { list.release(&sys) };
    }

    #[test]
    fn payload_follows_header() {
        let sys = SystemResource::new();
        let list = BlockList::new();
        let block = list.push(&sys, 32).unwrap();
        let base = block.base() as usize;
        assert_eq!(base - block.header.as_ptr() as usize, HEADER_SIZE);
        assert_eq!(base % HEADER_ALIGN, 0);
        unsafe {
            block.base().write_bytes(0xCD, 32);
            list.release(&sys);
        }
    }

    #[test]
    fn release_empties_list_and_is_repeatable() {
        let sys = SystemResource::new();
        let list = BlockList::new();
        list.push(&sys, 16).unwrap();
        unsafe {
            list.release(&sys);
            list.release(&sys);
        }
        assert_eq!(list.len(), 0);
        assert_eq!(list.payload_bytes(), 0);
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn failed_push_leaves_list_unchanged() {
        let null = strata_core::NullResource::new();
        let list = BlockList::new();
        assert!(list.push(&null, 64).is_err());
        assert_eq!(list.len(), 0);
        assert!(list.iter().next().is_none());
    }
}
