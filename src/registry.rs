//! Fixed-capacity table of per-peripheral records keyed by [`PeripheralId`].
//!
//! Port implementations keep one record per physical peripheral (pins, latched
//! ticks, interrupt flags). The registry owns those records and hands them out
//! through bounds-checked lookups instead of raw indexing into a global array.

use crate::port::{PeripheralId, PortError};

/// Owned table of peripheral records.
///
/// # Type Parameters
/// * `T` - Record type
/// * `MAX` - Number of slots; valid identifiers are `0..MAX`
pub struct Registry<T, const MAX: usize> {
    slots: [Option<T>; MAX],
}

impl<T, const MAX: usize> Registry<T, MAX> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Registers a record under the given identifier.
    ///
    /// # Errors
    /// * `DuplicateId` - A record with this ID already exists
    /// * `IdOutOfBounds` - The ID exceeds the registry's capacity
    pub fn insert(&mut self, id: PeripheralId, record: T) -> Result<(), PortError> {
        let idx = usize::from(id);

        if idx >= MAX {
            return Err(PortError::IdOutOfBounds { id, capacity: MAX });
        }

        if self.slots[idx].is_some() {
            return Err(PortError::DuplicateId(id));
        }

        self.slots[idx] = Some(record);
        Ok(())
    }

    /// Returns the record registered under `id`.
    ///
    /// # Errors
    /// Returns `InvalidId` if nothing is registered under this ID.
    pub fn get(&self, id: PeripheralId) -> Result<&T, PortError> {
        self.slots
            .get(usize::from(id))
            .and_then(Option::as_ref)
            .ok_or(PortError::InvalidId(id))
    }

    /// Returns the record registered under `id` for modification.
    ///
    /// # Errors
    /// Returns `InvalidId` if nothing is registered under this ID.
    pub fn get_mut(&mut self, id: PeripheralId) -> Result<&mut T, PortError> {
        self.slots
            .get_mut(usize::from(id))
            .and_then(Option::as_mut)
            .ok_or(PortError::InvalidId(id))
    }

    /// Returns true if a record is registered under `id`.
    pub fn contains(&self, id: PeripheralId) -> bool {
        self.get(id).is_ok()
    }

    /// Returns the number of registered records.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns true if no record is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity of the registry.
    pub const fn capacity(&self) -> usize {
        MAX
    }
}

impl<T, const MAX: usize> Default for Registry<T, MAX> {
    fn default() -> Self {
        Self::new()
    }
}
