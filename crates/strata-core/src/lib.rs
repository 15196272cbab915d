//! Core memory resource abstractions for Strata.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! capability every allocation strategy implements and the typed handle
//! callers use to reach it:
//!
//! ```text
//! container ──► PolymorphicAllocator ──► &dyn MemoryResource
//!                                          ├── SystemResource (global heap)
//!                                          ├── NullResource   (always fails)
//!                                          └── ArenaResource  (strata-arena)
//! ```
//!
//! Resources compare by identity ([`ResourceId`]), never by value.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod allocator;
pub mod error;
pub mod global;
pub mod id;
pub mod resource;
pub mod slot;
pub mod system;

// Public re-exports for the primary API surface.
pub use allocator::PolymorphicAllocator;
pub use error::AllocError;
pub use global::{default_resource, null_resource, system_resource};
pub use id::ResourceId;
pub use resource::{align_up, check_alignment, resources_equal, MemoryResource, MAX_ALIGN};
pub use slot::Slot;
pub use system::{NullResource, SystemResource};
