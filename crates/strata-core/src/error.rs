//! Error types for memory resources and allocator handles.
//!
//! Every error is surfaced synchronously to the immediate caller. Nothing
//! in the framework retries, falls back to a smaller request, or swallows
//! a failure.

use std::error::Error;
use std::fmt;

/// Errors returned by [`MemoryResource::allocate`](crate::MemoryResource::allocate)
/// and the typed operations of [`PolymorphicAllocator`](crate::PolymorphicAllocator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The underlying strategy could not satisfy the request: the
    /// system allocator is out of memory, the request exceeds what a
    /// `Layout` can describe, or an upstream resource failed.
    AllocationFailure {
        /// Number of bytes requested.
        bytes: usize,
        /// Requested alignment in bytes.
        alignment: usize,
    },
    /// `count * element_size` does not fit in `usize`. Detected before
    /// any allocation is attempted.
    SizeOverflow {
        /// Number of elements requested.
        count: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// The requested alignment is zero or not a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailure { bytes, alignment } => {
                write!(
                    f,
                    "allocation failed: {bytes} bytes at alignment {alignment}"
                )
            }
            Self::SizeOverflow {
                count,
                element_size,
            } => {
                write!(
                    f,
                    "size overflow: {count} elements of {element_size} bytes exceed usize::MAX"
                )
            }
            Self::InvalidAlignment { alignment } => {
                write!(f, "invalid alignment {alignment}: must be a power of two")
            }
        }
    }
}

impl Error for AllocError {}
