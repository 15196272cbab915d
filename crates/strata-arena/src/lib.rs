//! Monotonic arena memory resource for Strata.
//!
//! Provides [`ArenaResource`], a bump allocator that implements
//! [`MemoryResource`](strata_core::MemoryResource) on top of any upstream
//! resource. This crate contains `unsafe` code for block header layout and
//! pointer arithmetic; every block is owned by exactly one arena.
//!
//! # Architecture
//!
//! ```text
//! ArenaResource (MemoryResource)
//! ├── &dyn MemoryResource (upstream, borrowed)
//! ├── ArenaConfig (initial block size = large threshold, growth cap)
//! └── BlockList → Block[] (header + payload, one upstream allocation each)
//!     └── current block + offset (bump pointer)
//! ```
//!
//! # Block lifecycle
//!
//! - **Acquire:** on demand inside `allocate`, pushed at the list head.
//! - **Fill:** sequential aligned bumps; individual frees are ignored.
//! - **Release:** all blocks at once, on `release()` or drop.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
mod block;
pub mod config;
pub mod error;

// Public re-exports for the primary API surface.
pub use arena::ArenaResource;
pub use config::ArenaConfig;
pub use error::ConfigError;
