//! Resource identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ResourceId`] allocation.
static RESOURCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a memory resource.
///
/// Allocated from a monotonic atomic counter via [`ResourceId::next`].
/// Two distinct resource instances always have different IDs, even if
/// they are of the same concrete type and hold identical configuration.
/// Resource equality is defined as ID equality, so a zero-sized resource
/// or one that has been moved before being borrowed keeps a well-defined
/// identity where an address comparison would not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Allocate a fresh, unique resource ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(RESOURCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = ResourceId::next();
        let b = ResourceId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn display_is_raw_value() {
        let id = ResourceId::next();
        assert_eq!(id.to_string(), id.get().to_string());
    }
}
