//! The memory resource capability.
//!
//! [`MemoryResource`] is the contract every allocation strategy satisfies:
//! hand out raw, aligned memory, take it back, and report whether another
//! resource is interchangeable with this one. Callers go through the
//! provided [`allocate`](MemoryResource::allocate) and
//! [`deallocate`](MemoryResource::deallocate) methods; strategies implement
//! the `do_*` hooks.

use std::fmt;
use std::ptr::{self, NonNull};

use crate::error::AllocError;
use crate::id::ResourceId;

/// Alignment used when a caller has no particular requirement.
///
/// Suitable for any fundamental scalar type, including 128-bit integers.
pub const MAX_ALIGN: usize = std::mem::align_of::<u128>();

/// An allocation strategy behind a uniform byte-oriented interface.
///
/// Implementors provide [`resource_id`](Self::resource_id),
/// [`do_allocate`](Self::do_allocate) and
/// [`do_deallocate`](Self::do_deallocate). The provided `allocate`,
/// `deallocate` and `is_equal` methods apply the framework-wide rules
/// (zero-byte requests, null pointers, alignment validation) and should
/// not be overridden.
///
/// Resources are single-threaded unless a concrete type says otherwise:
/// there is no internal synchronisation in the trait contract.
pub trait MemoryResource {
    /// Stable identity of this instance.
    fn resource_id(&self) -> ResourceId;

    /// Allocate `bytes` bytes aligned to `alignment`.
    ///
    /// Only called with `bytes > 0` and a power-of-two `alignment`. The
    /// returned pointer must satisfy `ptr % alignment == 0`. Failing to
    /// provide the memory is an error, never a smaller or less aligned
    /// block.
    fn do_allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, AllocError>;

    /// Return memory previously obtained from [`do_allocate`](Self::do_allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this resource (or one equal to it)
    /// for the same `bytes` and `alignment`, and must not have been
    /// deallocated since.
    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, bytes: usize, alignment: usize);

    /// Whether memory from `self` can be released through `other` and vice
    /// versa. Defaults to instance identity.
    fn do_is_equal(&self, other: &dyn MemoryResource) -> bool {
        self.resource_id() == other.resource_id()
    }

    /// Allocate `bytes` bytes aligned to `alignment`.
    ///
    /// A zero-byte request returns a null pointer without reaching the
    /// strategy. A zero or non-power-of-two alignment is rejected with
    /// [`AllocError::InvalidAlignment`].
    fn allocate(&self, bytes: usize, alignment: usize) -> Result<*mut u8, AllocError> {
        if bytes == 0 {
            return Ok(ptr::null_mut());
        }
        check_alignment(alignment)?;
        self.do_allocate(bytes, alignment).map(NonNull::as_ptr)
    }

    /// Return memory obtained from [`allocate`](Self::allocate).
    ///
    /// A null `ptr` or a zero `bytes` is a no-op, mirroring the zero-byte
    /// rule of `allocate`.
    ///
    /// # Safety
    ///
    /// Same contract as [`do_deallocate`](Self::do_deallocate): the
    /// `(ptr, bytes, alignment)` triple must match a live allocation from
    /// this resource. Mismatches are undefined behaviour.
    unsafe fn deallocate(&self, ptr: *mut u8, bytes: usize, alignment: usize) {
        let Some(ptr) = NonNull::new(ptr) else {
            return;
        };
        if bytes == 0 {
            return;
        }
        // SAFETY: forwarded caller contract.
        unsafe { self.do_deallocate(ptr, bytes, alignment) }
    }

    /// Whether `self` and `other` produce interchangeable memory.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        self.do_is_equal(other)
    }
}

/// Compare two resources with [`MemoryResource::is_equal`].
pub fn resources_equal(a: &dyn MemoryResource, b: &dyn MemoryResource) -> bool {
    a.is_equal(b)
}

impl<'b> PartialEq<dyn MemoryResource + 'b> for dyn MemoryResource + '_ {
    fn eq(&self, other: &(dyn MemoryResource + 'b)) -> bool {
        self.is_equal(other)
    }
}

impl fmt::Debug for dyn MemoryResource + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryResource({})", self.resource_id())
    }
}

/// Reject alignments that are zero or not a power of two.
pub fn check_alignment(alignment: usize) -> Result<(), AllocError> {
    if alignment.is_power_of_two() {
        Ok(())
    } else {
        Err(AllocError::InvalidAlignment { alignment })
    }
}

/// Round `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. Returns `None` on overflow.
pub fn align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    let mask = alignment - 1;
    value.checked_add(mask).map(|v| v & !mask)
}
