//! Storage with an explicit constructed/unconstructed state.
//!
//! [`Slot`] keeps construction and destruction decoupled from the
//! lifetime of the storage itself, the same split the allocator handle
//! makes between `construct`/`destroy` and `allocate`/`deallocate`, but
//! with the state tracked so misuse cannot double-drop.

use std::fmt;
use std::mem::MaybeUninit;

/// Inline storage for one `T` that may or may not hold a value.
pub struct Slot<T> {
    storage: MaybeUninit<T>,
    constructed: bool,
}

impl<T> Slot<T> {
    /// An empty, unconstructed slot.
    pub const fn new() -> Self {
        Self {
            storage: MaybeUninit::uninit(),
            constructed: false,
        }
    }

    /// Whether the slot currently holds a value.
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Construct `value` in place and return a reference to it.
    ///
    /// Constructing over a live value is a contract violation: debug
    /// builds panic, release builds drop the previous value first.
    pub fn construct(&mut self, value: T) -> &mut T {
        debug_assert!(!self.constructed, "Slot::construct over a live value");
        self.drop_value();
        self.constructed = true;
        self.storage.write(value)
    }

    /// Drop the held value in place. Returns `false` if the slot was
    /// already empty.
    ///
    /// Destroying an empty slot is a contract violation: debug builds
    /// panic, release builds do nothing.
    pub fn destroy(&mut self) -> bool {
        debug_assert!(self.constructed, "Slot::destroy of an empty slot");
        self.drop_value()
    }

    fn drop_value(&mut self) -> bool {
        if !self.constructed {
            return false;
        }
        self.constructed = false;
        // SAFETY: `constructed` was set, so the storage holds a live value,
        // and clearing the flag first prevents a second drop.
        unsafe { self.storage.assume_init_drop() };
        true
    }

    /// Move the held value out, leaving the slot empty.
    pub fn take(&mut self) -> Option<T> {
        if !self.constructed {
            return None;
        }
        self.constructed = false;
        // SAFETY: the value is live and ownership moves to the caller.
        Some(unsafe { self.storage.assume_init_read() })
    }

    /// Shared access to the held value.
    pub fn get(&self) -> Option<&T> {
        if self.constructed {
            // SAFETY: storage is initialised while `constructed` is set.
            Some(unsafe { self.storage.assume_init_ref() })
        } else {
            None
        }
    }

    /// Mutable access to the held value.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.constructed {
            // SAFETY: storage is initialised while `constructed` is set.
            Some(unsafe { self.storage.assume_init_mut() })
        } else {
            None
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        self.drop_value();
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Slot").field(value).finish(),
            None => f.write_str("Slot(<unconstructed>)"),
        }
    }
}
