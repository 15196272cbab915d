//! Resources backed by the process-wide global allocator.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::AllocError;
use crate::id::ResourceId;
use crate::resource::MemoryResource;

/// Memory resource that delegates to the global allocator.
///
/// Requests are forwarded to [`std::alloc::alloc`] with a [`Layout`] built
/// from the requested size and alignment. The global allocator serves
/// alignments up to its natural guarantee with a plain allocation and
/// switches to an aligned-allocation call above it, so every address
/// returned honours the requested alignment.
///
/// Stateless apart from its identity, which makes it safe to keep in a
/// `static` (see [`system_resource`](crate::system_resource)).
#[derive(Debug)]
pub struct SystemResource {
    id: ResourceId,
}

impl SystemResource {
    /// Create a new system resource with a fresh identity.
    ///
    /// Distinct instances hand out memory from the same heap but compare
    /// unequal, matching the identity rule for all resources.
    pub fn new() -> Self {
        Self {
            id: ResourceId::next(),
        }
    }
}

impl Default for SystemResource {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the layout for a request, mapping unrepresentable sizes to an
/// allocation failure.
fn layout_for(bytes: usize, alignment: usize) -> Result<Layout, AllocError> {
    Layout::from_size_align(bytes, alignment)
        .map_err(|_| AllocError::AllocationFailure { bytes, alignment })
}

impl MemoryResource for SystemResource {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn do_allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        let layout = layout_for(bytes, alignment)?;
        // SAFETY: `bytes > 0` is guaranteed by `MemoryResource::allocate`.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::AllocationFailure { bytes, alignment })
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, bytes: usize, alignment: usize) {
        // The layout was valid when the block was allocated.
        let Ok(layout) = Layout::from_size_align(bytes, alignment) else {
            debug_assert!(false, "deallocate with a layout that was never allocatable");
            return;
        };
        // SAFETY: caller guarantees `ptr` came from `do_allocate` with this layout.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// Memory resource that fails every allocation.
///
/// Useful as the upstream of an arena that must never grow past memory it
/// was seeded with, and in tests that exercise failure propagation.
/// Deallocation is a no-op since nothing was ever handed out.
#[derive(Debug)]
pub struct NullResource {
    id: ResourceId,
}

impl NullResource {
    /// Create a new null resource with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: ResourceId::next(),
        }
    }
}

impl Default for NullResource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResource for NullResource {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn do_allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        Err(AllocError::AllocationFailure { bytes, alignment })
    }

    unsafe fn do_deallocate(&self, _ptr: NonNull<u8>, _bytes: usize, _alignment: usize) {}
}
