//! Test utilities and mock resources for Strata development.
//!
//! Provides instrumented [`MemoryResource`] implementations for observing
//! the traffic a component sends upstream ([`CountingResource`]) and for
//! injecting failures ([`FailingResource`]), plus drop-tracking values
//! in [`fixtures`].

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

use indexmap::IndexMap;
use strata_core::{system_resource, AllocError, MemoryResource, ResourceId};

pub use fixtures::{DropCounter, Tracked};

/// One call observed by a [`CountingResource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Allocate { bytes: usize, alignment: usize },
    Deallocate { bytes: usize, alignment: usize },
}

/// Pass-through resource that records every allocate/deallocate call.
///
/// Live allocations are tracked by address. A deallocation whose size or
/// alignment does not match the allocation, or whose address was never
/// handed out, panics: the caller broke the pairing contract.
pub struct CountingResource<'a> {
    id: ResourceId,
    upstream: &'a dyn MemoryResource,
    events: RefCell<Vec<Event>>,
    live: RefCell<IndexMap<usize, (usize, usize)>>,
}

impl<'a> CountingResource<'a> {
    pub fn new(upstream: &'a dyn MemoryResource) -> Self {
        Self {
            id: ResourceId::next(),
            upstream,
            events: RefCell::new(Vec::new()),
            live: RefCell::new(IndexMap::new()),
        }
    }

    /// Every recorded call, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// `(bytes, alignment)` of every allocate call, in order.
    pub fn allocations(&self) -> Vec<(usize, usize)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Allocate { bytes, alignment } => Some((bytes, alignment)),
                Event::Deallocate { .. } => None,
            })
            .collect()
    }

    /// `(bytes, alignment)` of every deallocate call, in order.
    pub fn deallocations(&self) -> Vec<(usize, usize)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Deallocate { bytes, alignment } => Some((bytes, alignment)),
                Event::Allocate { .. } => None,
            })
            .collect()
    }

    pub fn allocate_count(&self) -> usize {
        self.allocations().len()
    }

    pub fn deallocate_count(&self) -> usize {
        self.deallocations().len()
    }

    /// Allocations handed out and not yet returned.
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Bytes handed out and not yet returned.
    pub fn live_bytes(&self) -> usize {
        self.live.borrow().values().map(|&(bytes, _)| bytes).sum()
    }

    /// Forget recorded events. Live allocations stay tracked.
    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}

impl CountingResource<'static> {
    /// Counting wrapper over the process-wide system resource.
    pub fn system() -> Self {
        Self::new(system_resource())
    }
}

impl MemoryResource for CountingResource<'_> {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn do_allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.upstream.allocate(bytes, alignment)?;
        let ptr = NonNull::new(ptr).ok_or(AllocError::AllocationFailure { bytes, alignment })?;
        self.events
            .borrow_mut()
            .push(Event::Allocate { bytes, alignment });
        self.live
            .borrow_mut()
            .insert(ptr.as_ptr() as usize, (bytes, alignment));
        Ok(ptr)
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, bytes: usize, alignment: usize) {
        let addr = ptr.as_ptr() as usize;
        match self.live.borrow_mut().shift_remove(&addr) {
            Some(recorded) if recorded == (bytes, alignment) => {}
            Some((b, a)) => panic!(
                "contract violation: {addr:#x} allocated as ({b}, {a}), freed as ({bytes}, {alignment})"
            ),
            None => panic!("contract violation: {addr:#x} was not allocated by this resource"),
        }
        self.events
            .borrow_mut()
            .push(Event::Deallocate { bytes, alignment });
        // SAFETY: the address was allocated upstream with this size and alignment.
        unsafe { self.upstream.deallocate(ptr.as_ptr(), bytes, alignment) }
    }
}

/// Pass-through resource that starts failing after a fixed number of
/// successful allocations.
pub struct FailingResource<'a> {
    id: ResourceId,
    upstream: &'a dyn MemoryResource,
    remaining: Cell<usize>,
    attempts: Cell<usize>,
}

impl<'a> FailingResource<'a> {
    /// Allow `successes` allocations, then fail every further request.
    pub fn new(upstream: &'a dyn MemoryResource, successes: usize) -> Self {
        Self {
            id: ResourceId::next(),
            upstream,
            remaining: Cell::new(successes),
            attempts: Cell::new(0),
        }
    }

    /// Total allocate calls received, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }
}

impl MemoryResource for FailingResource<'_> {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn do_allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        self.attempts.set(self.attempts.get() + 1);
        let remaining = self.remaining.get();
        if remaining == 0 {
            return Err(AllocError::AllocationFailure { bytes, alignment });
        }
        self.remaining.set(remaining - 1);
        let ptr = self.upstream.allocate(bytes, alignment)?;
        NonNull::new(ptr).ok_or(AllocError::AllocationFailure { bytes, alignment })
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, bytes: usize, alignment: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { self.upstream.deallocate(ptr.as_ptr(), bytes, alignment) }
    }
}
