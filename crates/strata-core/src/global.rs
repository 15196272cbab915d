//! Process-wide resource slots.
//!
//! The default resource is created lazily on first use and lives for the
//! rest of the process. It is never torn down: handles created from it
//! hold `&'static` references.

use std::sync::OnceLock;

use crate::resource::MemoryResource;
use crate::system::{NullResource, SystemResource};

static SYSTEM: OnceLock<SystemResource> = OnceLock::new();
static NULL: OnceLock<NullResource> = OnceLock::new();

/// The process-wide [`SystemResource`].
///
/// Every call returns the same instance, so handles built on it compare
/// equal to each other.
pub fn system_resource() -> &'static SystemResource {
    SYSTEM.get_or_init(SystemResource::new)
}

/// The process-wide [`NullResource`].
pub fn null_resource() -> &'static NullResource {
    NULL.get_or_init(NullResource::new)
}

/// The resource used by default-constructed allocator handles.
///
/// Always the process-wide [`system_resource`].
pub fn default_resource() -> &'static dyn MemoryResource {
    system_resource()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_resource_is_a_singleton() {
        let a = default_resource();
        let b = default_resource();
        assert!(a.is_equal(b));
        assert_eq!(a.resource_id(), system_resource().resource_id());
    }

    #[test]
    fn default_differs_from_fresh_system_resource() {
        let fresh = SystemResource::new();
        assert!(!default_resource().is_equal(&fresh));
    }

    #[test]
    fn null_resource_is_a_singleton() {
        assert!(null_resource().is_equal(null_resource()));
        assert!(!null_resource().is_equal(default_resource()));
    }

    #[test]
    fn default_resource_allocates() {
        let r = default_resource();
        let p = r.allocate(24, 8).unwrap();
        assert_eq!(p as usize % 8, 0);
        unsafe { r.deallocate(p, 24, 8) };
    }
}
