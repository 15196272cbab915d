//! Growable array over a polymorphic allocator.
//!
//! [`Vector`] stores its elements in one contiguous region obtained from a
//! [`PolymorphicAllocator`]. Growth is geometric: when a push finds the
//! region full, a new region of `max(4, 2 * capacity)` elements is
//! allocated, the elements are moved across in order, and the old region
//! is returned to the allocator.
//!
//! ```text
//! push #1 ──► allocate(4)     push #5 ──► allocate(8), move 4, deallocate(4)
//! push #9 ──► allocate(16), move 8, deallocate(8)   ...
//! ```
//!
//! Over a monotonic arena the deallocations are no-ops and the allocations
//! are bumps inside one block, so growth makes no system calls.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use strata_core::{AllocError, PolymorphicAllocator};

/// Capacity of the first allocation made by a push.
pub const MIN_NON_ZERO_CAPACITY: usize = 4;

/// Contiguous growable array whose storage comes from a
/// [`PolymorphicAllocator`].
///
/// The borrow inside the allocator handle ties the vector to its memory
/// resource: the resource cannot be dropped or released while the vector
/// is alive. Zero-sized element types never allocate and report a
/// capacity of `usize::MAX`.
pub struct Vector<'a, T> {
    alloc: PolymorphicAllocator<'a, T>,
    ptr: NonNull<T>,
    cap: usize,
    len: usize,
    _owns: PhantomData<T>,
}

impl<T> Vector<'static, T> {
    /// An empty vector over the process-wide default resource.
    pub fn new() -> Self {
        Self::new_in(PolymorphicAllocator::default())
    }
}

impl<'a, T> Vector<'a, T> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// An empty vector that will allocate from `alloc`. Does not allocate.
    pub fn new_in(alloc: PolymorphicAllocator<'a, T>) -> Self {
        Self {
            alloc,
            ptr: NonNull::dangling(),
            cap: if Self::IS_ZST { usize::MAX } else { 0 },
            len: 0,
            _owns: PhantomData,
        }
    }

    /// An empty vector with room for exactly `capacity` elements.
    pub fn with_capacity_in(
        capacity: usize,
        alloc: PolymorphicAllocator<'a, T>,
    ) -> Result<Self, AllocError> {
        let mut v = Self::new_in(alloc);
        v.try_reserve(capacity)?;
        Ok(v)
    }

    /// A vector holding `count` clones of `value`.
    pub fn from_elem_in(
        count: usize,
        value: T,
        alloc: PolymorphicAllocator<'a, T>,
    ) -> Result<Self, AllocError>
    where
        T: Clone,
    {
        let mut v = Self::with_capacity_in(count, alloc)?;
        v.try_resize(count, value)?;
        Ok(v)
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current region can hold.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// The allocator handle this vector draws from.
    pub fn allocator(&self) -> PolymorphicAllocator<'a, T> {
        self.alloc
    }

    /// Raw pointer to the first element (dangling when nothing is
    /// allocated).
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is aligned and non-null, and the first `len`
        // elements are initialised.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, with unique access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Bounds-checked element access.
    pub fn at(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Bounds-checked mutable element access.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Append `value`, growing the region if it is full.
    ///
    /// # Panics
    ///
    /// Panics if the allocator cannot provide the larger region. Use
    /// [`try_push`](Self::try_push) to handle the error instead.
    pub fn push(&mut self, value: T) {
        if let Err(err) = self.try_push(value) {
            alloc_failed(err);
        }
    }

    /// Append `value`, returning the allocator's error if growth fails.
    ///
    /// On failure the vector is unchanged and `value` is dropped.
    pub fn try_push(&mut self, value: T) -> Result<(), AllocError> {
        if self.len == self.cap {
            self.grow()?;
        }
        // SAFETY: `len < cap`, so the slot is inside the region and
        // currently uninitialised.
        unsafe { self.alloc.construct(self.ptr.as_ptr().add(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was initialised and is now outside `len`, so it
        // will not be read or dropped again.
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Ensure room for at least `additional` more elements.
    ///
    /// Allocates exactly `len + additional` when growth is needed; use
    /// `push` for geometric growth.
    ///
    /// # Panics
    ///
    /// Panics if the allocator fails.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            alloc_failed(err);
        }
    }

    /// Fallible [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(AllocError::SizeOverflow {
                count: additional,
                element_size: mem::size_of::<T>(),
            })?;
        if required <= self.cap {
            return Ok(());
        }
        self.relocate(required)
    }

    /// Drop every element, keeping the region.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Drop the elements past `len`, keeping the region.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(
            // SAFETY: `len < self.len <= cap`.
            unsafe { self.ptr.as_ptr().add(len) },
            self.len - len,
        );
        // Shrink first so a panicking destructor cannot cause a double drop.
        self.len = len;
        // SAFETY: the tail holds initialised elements no longer covered by `len`.
        unsafe { self.alloc.destroy(tail) };
    }

    /// Resize to `new_len`, cloning `value` into new slots or dropping
    /// surplus elements.
    ///
    /// # Panics
    ///
    /// Panics if the allocator fails.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        if let Err(err) = self.try_resize(new_len, value) {
            alloc_failed(err);
        }
    }

    /// Fallible [`resize`](Self::resize).
    pub fn try_resize(&mut self, new_len: usize, value: T) -> Result<(), AllocError>
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }
        self.try_reserve(new_len - self.len)?;
        while self.len + 1 < new_len {
            // SAFETY: `len < new_len <= cap`; the slot is uninitialised.
            unsafe {
                self.alloc
                    .construct(self.ptr.as_ptr().add(self.len), value.clone())
            };
            self.len += 1;
        }
        // SAFETY: as above; the last slot takes `value` itself.
        unsafe { self.alloc.construct(self.ptr.as_ptr().add(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Exchange contents and allocators with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Clone the elements into a new vector drawing from `alloc`.
    pub fn try_clone_in<'b>(
        &self,
        alloc: PolymorphicAllocator<'b, T>,
    ) -> Result<Vector<'b, T>, AllocError>
    where
        T: Clone,
    {
        let mut out = Vector::with_capacity_in(self.len, alloc)?;
        for item in self.iter() {
            out.try_push(item.clone())?;
        }
        Ok(out)
    }

    fn grow(&mut self) -> Result<(), AllocError> {
        // A saturated capacity is rejected by the byte-size check in `allocate`.
        let new_cap = self.cap.saturating_mul(2).max(MIN_NON_ZERO_CAPACITY);
        self.relocate(new_cap)
    }

    /// Move the elements into a fresh region of `new_cap` and release the
    /// old one.
    fn relocate(&mut self, new_cap: usize) -> Result<(), AllocError> {
        debug_assert!(!Self::IS_ZST, "zero-sized elements never relocate");
        debug_assert!(new_cap >= self.len);
        let raw = self.alloc.allocate(new_cap)?;
        let new_ptr = NonNull::new(raw).ok_or(AllocError::AllocationFailure {
            bytes: new_cap * mem::size_of::<T>(),
            alignment: mem::align_of::<T>(),
        })?;
        // SAFETY: both regions hold at least `len` elements and come from
        // separate allocations. A move leaves nothing in the old slots to
        // destroy.
        unsafe { ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len) };
        if self.cap > 0 {
            // SAFETY: the old region came from `allocate(self.cap)` on this handle.
            unsafe { self.alloc.deallocate(self.ptr.as_ptr(), self.cap) };
        }
        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }
}

#[cold]
fn alloc_failed(err: AllocError) -> ! {
    panic!("Vector allocation failed: {err}")
}

impl<T> Drop for Vector<'_, T> {
    fn drop(&mut self) {
        self.clear();
        if !Self::IS_ZST && self.cap > 0 {
            // SAFETY: the region came from `allocate(self.cap)` and is now empty.
            unsafe { self.alloc.deallocate(self.ptr.as_ptr(), self.cap) };
        }
    }
}

impl<T> Default for Vector<'_, T> {
    fn default() -> Self {
        Self::new_in(PolymorphicAllocator::default())
    }
}

impl<T> Deref for Vector<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Vector<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone> Clone for Vector<'_, T> {
    /// Clone into the same allocator.
    ///
    /// # Panics
    ///
    /// Panics if the allocator fails.
    fn clone(&self) -> Self {
        match self.try_clone_in(self.alloc) {
            Ok(v) => v,
            Err(err) => alloc_failed(err),
        }
    }
}

impl<T> Extend<T> for Vector<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> FromIterator<T> for Vector<'_, T> {
    /// Collect into a vector over the default resource.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::default();
        v.extend(iter);
        v
    }
}

impl<'v, T> IntoIterator for &'v Vector<'_, T> {
    type Item = &'v T;
    type IntoIter = slice::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'v, T> IntoIterator for &'v mut Vector<'_, T> {
    type Item = &'v mut T;
    type IntoIter = slice::IterMut<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: PartialEq> PartialEq for Vector<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq> PartialEq<[T]> for Vector<'_, T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq> Eq for Vector<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Vector<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{NullResource, SystemResource};
    use strata_test_utils::{CountingResource, DropCounter};

    #[test]
    fn new_does_not_allocate() {
        let counting = CountingResource::system();
        let v: Vector<'_, u64> = Vector::new_in(PolymorphicAllocator::new(&counting));
        assert_eq!(v.capacity(), 0);
        assert!(v.is_empty());
        drop(v);
        assert_eq!(counting.allocate_count(), 0);
        assert_eq!(counting.deallocate_count(), 0);
    }

    #[test]
    fn push_grows_geometrically() {
        let counting = CountingResource::system();
        let mut v = Vector::new_in(PolymorphicAllocator::new(&counting));
        let mut caps = Vec::new();
        for i in 0..17u32 {
            v.push(i);
            if caps.last() != Some(&v.capacity()) {
                caps.push(v.capacity());
            }
        }
        assert_eq!(caps, vec![4, 8, 16, 32]);
        assert_eq!(v.as_slice(), (0..17).collect::<Vec<_>>().as_slice());
        // Every region but the current one has been returned.
        assert_eq!(counting.allocate_count(), 4);
        assert_eq!(counting.deallocate_count(), 3);
        drop(v);
        assert_eq!(counting.live_count(), 0);
    }

    #[test]
    fn pop_returns_in_reverse() {
        let mut v = Vector::new();
        v.extend([1, 2, 3]);
        assert_eq!(v.pop(), Some(3));
        assert_eq!(v.pop(), Some(2));
        assert_eq!(v.len(), 1);
        assert_eq!(v.pop(), Some(1));
        assert_eq!(v.pop(), None);
    }

    #[test]
    fn drop_destroys_every_element_once() {
        let drops = DropCounter::new();
        {
            let mut v = Vector::new();
            for i in 0..10 {
                v.push(drops.track(i));
            }
            // Relocations move elements without dropping them.
            assert_eq!(drops.count(), 0);
        }
        assert_eq!(drops.count(), 10);
    }

    #[test]
    fn truncate_and_clear_drop_tail() {
        let drops = DropCounter::new();
        let mut v = Vector::new();
        for i in 0..6 {
            v.push(drops.track(i));
        }
        let cap = v.capacity();
        v.truncate(4);
        assert_eq!(drops.count(), 2);
        assert_eq!(v.len(), 4);
        v.truncate(10);
        assert_eq!(v.len(), 4);
        v.clear();
        assert_eq!(drops.count(), 6);
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn resize_clones_and_shrinks() {
        let mut v = Vector::new();
        v.resize(3, String::from("x"));
        assert_eq!(v.as_slice(), ["x", "x", "x"]);
        v.resize(1, String::new());
        assert_eq!(v.len(), 1);
        v.resize(1, String::from("unused"));
        assert_eq!(v[0], "x");
    }

    #[test]
    fn reserve_is_exact() {
        let counting = CountingResource::system();
        let mut v: Vector<'_, u16> = Vector::new_in(PolymorphicAllocator::new(&counting));
        v.reserve(10);
        assert_eq!(v.capacity(), 10);
        v.reserve(5);
        assert_eq!(counting.allocate_count(), 1);
        assert_eq!(counting.allocations(), vec![(20, 2)]);
    }

    #[test]
    fn from_elem_in_fills() {
        let sys = SystemResource::new();
        let v = Vector::from_elem_in(5, 7u8, PolymorphicAllocator::new(&sys)).unwrap();
        assert_eq!(v.as_slice(), &[7; 5]);
        assert_eq!(v.capacity(), 5);
        assert!(v.allocator().resource().is_equal(&sys));
    }

    #[test]
    fn allocation_failure_surfaces_from_try_push() {
        let null = NullResource::new();
        let mut v = Vector::new_in(PolymorphicAllocator::new(&null));
        let err = v.try_push(1u32).unwrap_err();
        assert_eq!(
            err,
            AllocError::AllocationFailure {
                bytes: 16,
                alignment: 4
            }
        );
        assert!(v.is_empty());
        assert_eq!(v.capacity(), 0);
    }

    #[test]
    fn reserve_overflow_reports_requested_count() {
        let sys = SystemResource::new();
        let mut v: Vector<'_, u32> = Vector::new_in(PolymorphicAllocator::new(&sys));
        assert_eq!(
            v.try_reserve(usize::MAX / 2).unwrap_err(),
            AllocError::SizeOverflow {
                count: usize::MAX / 2,
                element_size: 4
            }
        );
        v.push(1);
        assert_eq!(
            v.try_reserve(usize::MAX).unwrap_err(),
            AllocError::SizeOverflow {
                count: usize::MAX,
                element_size: 4
            }
        );
        assert_eq!(v.as_slice(), &[1]);
        assert_eq!(v.capacity(), 4);
    }

    #[test]
    #[should_panic(expected = "Vector allocation failed")]
    fn push_panics_on_failure() {
        let null = NullResource::new();
        let mut v = Vector::new_in(PolymorphicAllocator::new(&null));
        v.push(1u8);
    }

    #[test]
    fn zero_sized_elements_never_allocate() {
        let counting = CountingResource::system();
        let mut v = Vector::new_in(PolymorphicAllocator::new(&counting));
        for _ in 0..100 {
            v.push(());
        }
        assert_eq!(v.len(), 100);
        assert_eq!(v.capacity(), usize::MAX);
        assert_eq!(v.pop(), Some(()));
        drop(v);
        assert_eq!(counting.allocate_count(), 0);
    }

    #[test]
    fn clone_uses_same_allocator() {
        let sys = SystemResource::new();
        let mut v = Vector::new_in(PolymorphicAllocator::new(&sys));
        v.extend(["a".to_string(), "b".to_string()]);
        let w = v.clone();
        assert_eq!(v, w);
        assert_eq!(v.allocator(), w.allocator());
    }

    #[test]
    fn try_clone_in_switches_allocator() {
        let a = SystemResource::new();
        let b = SystemResource::new();
        let v = Vector::from_elem_in(3, 1i64, PolymorphicAllocator::new(&a)).unwrap();
        let w = v.try_clone_in(PolymorphicAllocator::new(&b)).unwrap();
        assert_eq!(v, w);
        assert_ne!(v.allocator(), w.allocator());
    }

    #[test]
    fn swap_exchanges_contents_and_allocators() {
        let a = SystemResource::new();
        let b = SystemResource::new();
        let mut v = Vector::from_elem_in(2, 1u8, PolymorphicAllocator::new(&a)).unwrap();
        let mut w = Vector::from_elem_in(3, 2u8, PolymorphicAllocator::new(&b)).unwrap();
        v.swap(&mut w);
        assert_eq!(v.as_slice(), &[2, 2, 2]);
        assert_eq!(w.as_slice(), &[1, 1]);
        assert!(v.allocator().resource().is_equal(&b));
    }

    #[test]
    fn slice_access_and_iteration() {
        let mut v: Vector<'_, i32> = (1..=4).collect();
        assert_eq!(v.first(), Some(&1));
        assert_eq!(v.last(), Some(&4));
        assert_eq!(v.get(10), None);
        assert_eq!(v.at(2), Some(&3));
        assert_eq!(v.at(4), None);
        if let Some(x) = v.at_mut(0) {
            *x = 0;
        }
        assert_eq!(v[0], 0);
        v[0] = 1;
        for x in &mut v {
            *x *= 10;
        }
        let total: i32 = (&v).into_iter().sum();
        assert_eq!(total, 100);
        assert_eq!(format!("{v:?}"), "[10, 20, 30, 40]");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn matches_std_vec(ops in proptest::collection::vec(proptest::option::of(0i32..1000), 0..200)) {
                let counting = CountingResource::system();
                let mut ours = Vector::new_in(PolymorphicAllocator::new(&counting));
                let mut reference = Vec::new();
                for op in ops {
                    match op {
                        Some(x) => {
                            ours.push(x);
                            reference.push(x);
                        }
                        None => {
                            prop_assert_eq!(ours.pop(), reference.pop());
                        }
                    }
                    prop_assert_eq!(ours.as_slice(), reference.as_slice());
                    prop_assert!(ours.capacity() >= ours.len());
                }
                drop(ours);
                prop_assert_eq!(counting.live_count(), 0);
            }
        }
    }
}
