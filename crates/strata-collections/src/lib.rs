//! Allocator-aware containers for Strata.
//!
//! Containers here take a
//! [`PolymorphicAllocator`](strata_core::PolymorphicAllocator) at
//! construction and route every allocation, construction, destruction and
//! deallocation through it. Swapping the resource behind the handle (the
//! system heap, an arena, an instrumented test resource) changes where the
//! memory comes from without changing the container type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod vector;

pub use vector::Vector;
