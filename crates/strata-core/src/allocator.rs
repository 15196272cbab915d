//! Polymorphic allocator handle.
//!
//! A [`PolymorphicAllocator`] is a `Copy` view of a borrowed
//! [`MemoryResource`] with typed convenience operations layered on top of
//! the byte interface. It never owns the resource: the borrow ties every
//! handle (and every container holding one) to the resource's lifetime.
//!
//! Allocation and construction are deliberately separate steps:
//!
//! ```text
//! allocate_object ──► construct ──► (use) ──► destroy ──► deallocate_object
//! └────────── new_object ──────────┘          └──────── delete_object ────────┘
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use crate::error::AllocError;
use crate::global::default_resource;
use crate::resource::MemoryResource;

/// Typed, copyable handle to a memory resource.
///
/// `T` is the element type used by [`allocate`](Self::allocate) and
/// [`deallocate`](Self::deallocate). It is a type-safety convenience only:
/// handles for different `T` over the same resource compare equal, and
/// [`rebind`](Self::rebind) converts between them freely.
pub struct PolymorphicAllocator<'a, T = u8> {
    resource: &'a dyn MemoryResource,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> PolymorphicAllocator<'a, T> {
    /// Create a handle referencing `resource`.
    pub fn new(resource: &'a dyn MemoryResource) -> Self {
        Self {
            resource,
            _marker: PhantomData,
        }
    }

    /// The referenced resource.
    pub fn resource(&self) -> &'a dyn MemoryResource {
        self.resource
    }

    /// A handle over the same resource for a different element type.
    pub fn rebind<U>(&self) -> PolymorphicAllocator<'a, U> {
        PolymorphicAllocator::new(self.resource)
    }

    /// Allocate `n` bytes at `alignment` from the resource.
    pub fn allocate_bytes(&self, n: usize, alignment: usize) -> Result<*mut u8, AllocError> {
        self.resource.allocate(n, alignment)
    }

    /// Return bytes obtained from [`allocate_bytes`](Self::allocate_bytes).
    ///
    /// # Safety
    ///
    /// `(ptr, n, alignment)` must match a live allocation from this
    /// handle's resource.
    pub unsafe fn deallocate_bytes(&self, ptr: *mut u8, n: usize, alignment: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { self.resource.deallocate(ptr, n, alignment) }
    }

    /// Allocate uninitialised storage for `count` values of `V`.
    ///
    /// The byte size is checked for overflow before the resource is
    /// consulted. A zero byte size (zero `count` or zero-sized `V`)
    /// returns null.
    pub fn allocate_object<V>(&self, count: usize) -> Result<*mut V, AllocError> {
        let bytes = array_bytes::<V>(count)?;
        self.allocate_bytes(bytes, mem::align_of::<V>())
            .map(|p| p.cast::<V>())
    }

    /// Return storage obtained from [`allocate_object`](Self::allocate_object).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_object::<V>(count)` on a handle
    /// whose resource equals this one. Any values in the storage must
    /// already have been destroyed or moved out.
    pub unsafe fn deallocate_object<V>(&self, ptr: *mut V, count: usize) {
        // The size was representable when allocated.
        let bytes = count.wrapping_mul(mem::size_of::<V>());
        // SAFETY: forwarded caller contract.
        unsafe { self.deallocate_bytes(ptr.cast::<u8>(), bytes, mem::align_of::<V>()) }
    }

    /// Allocate uninitialised storage for `n` values of `T`.
    pub fn allocate(&self, n: usize) -> Result<*mut T, AllocError> {
        self.allocate_object::<T>(n)
    }

    /// Return storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// Same contract as [`deallocate_object`](Self::deallocate_object).
    pub unsafe fn deallocate(&self, ptr: *mut T, n: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { self.deallocate_object::<T>(ptr, n) }
    }

    /// Move `value` into the uninitialised storage at `ptr`.
    ///
    /// Does not allocate.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes and aligned for `V`. Any value
    /// previously at `ptr` is overwritten without being dropped.
    pub unsafe fn construct<V>(&self, ptr: *mut V, value: V) {
        // SAFETY: caller guarantees `ptr` is writable and aligned.
        unsafe { ptr::write(ptr, value) }
    }

    /// Run `V`'s destructor in place, leaving the storage allocated.
    ///
    /// `V` may be a slice, destroying every element in order.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live, initialised `V` that is not used again
    /// until it is reconstructed.
    pub unsafe fn destroy<V: ?Sized>(&self, ptr: *mut V) {
        // SAFETY: caller guarantees `ptr` holds a live value.
        unsafe { ptr::drop_in_place(ptr) }
    }

    /// Allocate storage for one `V` and move `value` into it.
    pub fn new_object<V>(&self, value: V) -> Result<NonNull<V>, AllocError> {
        let ptr = self.object_storage::<V>()?;
        // SAFETY: freshly allocated storage sized and aligned for `V`.
        unsafe { self.construct(ptr.as_ptr(), value) };
        Ok(ptr)
    }

    /// Allocate storage for one `V`, then build the value with `init`.
    ///
    /// If `init` panics the storage is leaked, not returned to the
    /// resource.
    pub fn new_object_with<V, F>(&self, init: F) -> Result<NonNull<V>, AllocError>
    where
        F: FnOnce() -> V,
    {
        let ptr = self.object_storage::<V>()?;
        // SAFETY: freshly allocated storage sized and aligned for `V`.
        unsafe { self.construct(ptr.as_ptr(), init()) };
        Ok(ptr)
    }

    /// Destroy the value at `ptr` and release its storage.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`new_object`](Self::new_object) (or
    /// `new_object_with`) on a handle whose resource equals this one, and
    /// must not be used afterwards.
    pub unsafe fn delete_object<V>(&self, ptr: NonNull<V>) {
        // SAFETY: forwarded caller contract.
        unsafe {
            self.destroy(ptr.as_ptr());
            self.deallocate_object(ptr.as_ptr(), 1);
        }
    }

    fn object_storage<V>(&self) -> Result<NonNull<V>, AllocError> {
        let ptr = self.allocate_object::<V>(1)?;
        // Zero-sized values get no storage from the resource.
        Ok(NonNull::new(ptr).unwrap_or(NonNull::dangling()))
    }
}

/// Byte size of `count` values of `V`, or [`AllocError::SizeOverflow`].
pub fn array_bytes<V>(count: usize) -> Result<usize, AllocError> {
    let element_size = mem::size_of::<V>();
    count
        .checked_mul(element_size)
        .ok_or(AllocError::SizeOverflow {
            count,
            element_size,
        })
}

impl<T> Clone for PolymorphicAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PolymorphicAllocator<'_, T> {}

impl<T> Default for PolymorphicAllocator<'_, T> {
    /// A handle over the process-wide [`default_resource`].
    fn default() -> Self {
        Self::new(default_resource())
    }
}

impl<'a, T> From<&'a dyn MemoryResource> for PolymorphicAllocator<'a, T> {
    fn from(resource: &'a dyn MemoryResource) -> Self {
        Self::new(resource)
    }
}

impl<'a, T, U> From<&PolymorphicAllocator<'a, U>> for PolymorphicAllocator<'a, T> {
    fn from(other: &PolymorphicAllocator<'a, U>) -> Self {
        other.rebind()
    }
}

impl<T, U> PartialEq<PolymorphicAllocator<'_, U>> for PolymorphicAllocator<'_, T> {
    fn eq(&self, other: &PolymorphicAllocator<'_, U>) -> bool {
        self.resource.is_equal(other.resource)
    }
}

impl<T> Eq for PolymorphicAllocator<'_, T> {}

impl<T> fmt::Debug for PolymorphicAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicAllocator")
            .field("resource", &self.resource.resource_id())
            .field("value_type", &std::any::type_name::<T>())
            .finish()
    }
}
