//! Strata: pluggable memory resources for Rust.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Strata sub-crates. For most users, adding `strata` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! // An arena over the system heap, 4 KiB first block.
//! let arena = ArenaResource::with_block_size(4096, system_resource()).unwrap();
//!
//! // A vector whose growth is served by the arena.
//! let mut v = Vector::new_in(PolymorphicAllocator::new(&arena));
//! for i in 0..100 {
//!     v.push(i);
//! }
//! assert_eq!(v.len(), 100);
//! assert_eq!(arena.block_count(), 1);
//!
//! // Handles compare equal when they share a resource.
//! let a: PolymorphicAllocator<'_, u8> = PolymorphicAllocator::new(&arena);
//! assert_eq!(a, v.allocator());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`resource`] | `strata-core` | `MemoryResource`, system/null resources, `PolymorphicAllocator`, `Slot` |
//! | [`arena`] | `strata-arena` | `ArenaResource`, `ArenaConfig` |
//! | [`collections`] | `strata-collections` | `Vector` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Resource trait, built-in resources and the allocator handle (`strata-core`).
///
/// Implement [`resource::MemoryResource`] to add a strategy; wrap any
/// resource in a [`resource::PolymorphicAllocator`] to hand it to a container.
pub use strata_core as resource;

/// Monotonic arena resource (`strata-arena`).
///
/// [`arena::ArenaResource`] bumps through blocks from an upstream resource
/// and frees them all at once.
pub use strata_arena as arena;

/// Allocator-aware containers (`strata-collections`).
pub use strata_collections as collections;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Resources
    pub use strata_core::{
        default_resource, null_resource, system_resource, MemoryResource, NullResource,
        SystemResource,
    };

    // Handle and errors
    pub use strata_core::{AllocError, PolymorphicAllocator};

    // Arena
    pub use strata_arena::{ArenaConfig, ArenaResource, ConfigError};

    // Containers
    pub use strata_collections::Vector;
}
