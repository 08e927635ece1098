//! # Entity Tables and Index Views
//!
//! The host stores entities in fixed-size tables of shared cells. A slot's
//! cell is replaced when a new entity takes the slot, so cell identity is
//! entity identity. [`EntityList`] exposes a table through cached wrappers
//! that are rebuilt only when the cell behind a slot changes.

use std::fmt;
use std::sync::Arc;

use hookwire_core::{HookwireError, Result};
use parking_lot::{Mutex, RwLock};

/// A shared, mutable entity record
pub type EntityCell<T> = Arc<RwLock<T>>;

/// Records that can live in an [`EntityTable`]
pub trait Entity: Default + Send + Sync + 'static {
    /// Whether the slot holding this record is in use
    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);
}

/// Fixed-size slot array owned by the host
///
/// # Purpose
/// The last slot is reserved as the host's "none" sentinel and is never
/// handed out by [`EntityTable::allocate`].
///
/// # Thread Safety
/// Slot references are swapped under a per-slot lock. Allocation and every
/// liveness change made through [`EntityTable::activate`] and
/// [`EntityTable::deactivate`] run under a table-wide spawn lock, so a slot
/// is never freed and claimed at the same time.
pub struct EntityTable<T> {
    slots: Vec<RwLock<EntityCell<T>>>,
    spawn_lock: Mutex<()>,
}

impl<T: Entity> EntityTable<T> {
    /// Create a table of `len` slots, each holding a default record
    pub fn new(len: usize) -> Self {
        let slots = (0..len)
            .map(|_| RwLock::new(Arc::new(RwLock::new(T::default()))))
            .collect();
        Self {
            slots,
            spawn_lock: Mutex::new(()),
        }
    }

    /// Total slots including the reserved sentinel
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots available to entities
    pub fn capacity(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// The cell currently in a slot
    pub fn get(&self, index: usize) -> Option<EntityCell<T>> {
        self.slots.get(index).map(|slot| slot.read().clone())
    }

    /// Whether `cell` is the one currently stored at `index`
    pub fn holds(&self, index: usize, cell: &EntityCell<T>) -> bool {
        self.slots
            .get(index)
            .map(|slot| Arc::ptr_eq(&slot.read(), cell))
            .unwrap_or(false)
    }

    /// Put a new entity into a slot
    ///
    /// # Returns
    /// The cell that was replaced, or `None` if `index` is out of range.
    pub fn replace(&self, index: usize, record: T) -> Option<EntityCell<T>> {
        let slot = self.slots.get(index)?;
        let cell = Arc::new(RwLock::new(record));
        Some(std::mem::replace(&mut *slot.write(), cell))
    }

    /// Claim the first inactive slot for `record`
    ///
    /// `record` should already report itself active so later allocations
    /// skip the slot.
    ///
    /// # Returns
    /// The slot index and its new cell, or `None` when every slot is in use.
    pub fn allocate(&self, record: T) -> Option<(usize, EntityCell<T>)> {
        let _spawn = self.spawn_lock.lock();
        let index = (0..self.capacity()).find(|index| !self.slots[*index].read().read().is_active())?;
        let cell = Arc::new(RwLock::new(record));
        *self.slots[index].write() = cell.clone();
        Some((index, cell))
    }

    /// Mark the entity in a slot live
    ///
    /// # Returns
    /// `false` if `index` is out of range
    pub fn activate(&self, index: usize) -> bool {
        self.set_active(index, true)
    }

    /// Mark the entity in a slot dead, freeing the slot for allocation
    ///
    /// # Returns
    /// `false` if `index` is out of range
    pub fn deactivate(&self, index: usize) -> bool {
        self.set_active(index, false)
    }

    fn set_active(&self, index: usize, active: bool) -> bool {
        let _spawn = self.spawn_lock.lock();
        match self.slots.get(index) {
            Some(slot) => {
                slot.read().write().set_active(active);
                true
            }
            None => false,
        }
    }

    /// Indices of active entities
    pub fn active_indices(&self) -> Vec<usize> {
        (0..self.capacity())
            .filter(|index| self.slots[*index].read().read().is_active())
            .collect()
    }
}

impl<T> fmt::Debug for EntityTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTable").field("len", &self.slots.len()).finish()
    }
}

type WrapperFactory<T, W> = dyn Fn(Option<usize>, EntityCell<T>) -> W + Send + Sync;

/// Read-only, index-addressable view over an [`EntityTable`]
///
/// Each slot caches its wrapper together with the cell it was built for.
/// Repeated lookups hand back the same wrapper until the slot's cell is
/// replaced.
pub struct EntityList<T, W> {
    table: Arc<EntityTable<T>>,
    cache: Vec<Mutex<Option<(EntityCell<T>, Arc<W>)>>>,
    wrap: Box<WrapperFactory<T, W>>,
}

impl<T: Entity, W> EntityList<T, W> {
    /// Create a view
    ///
    /// # Arguments
    /// * `table` - The host table to wrap
    /// * `wrap` - Builds a wrapper for a slot index and the cell in it
    pub fn new<F>(table: Arc<EntityTable<T>>, wrap: F) -> Self
    where
        F: Fn(Option<usize>, EntityCell<T>) -> W + Send + Sync + 'static,
    {
        let cache = (0..table.capacity()).map(|_| Mutex::new(None)).collect();
        Self {
            table,
            cache,
            wrap: Box::new(wrap),
        }
    }

    /// Number of addressable slots, excluding the reserved sentinel
    pub fn count(&self) -> usize {
        self.cache.len()
    }

    /// Wrapper for a slot
    ///
    /// Fails with [`HookwireError::IndexOutOfRange`] when `index >= count()`.
    pub fn get(&self, index: usize) -> Result<Arc<W>> {
        let (Some(entry), Some(cell)) = (self.cache.get(index), self.table.get(index)) else {
            return Err(HookwireError::IndexOutOfRange {
                index: index as i64,
                count: self.count(),
            });
        };

        let mut entry = entry.lock();
        if let Some((cached, wrapper)) = entry.as_ref() {
            if Arc::ptr_eq(cached, &cell) {
                return Ok(wrapper.clone());
            }
        }

        let wrapper = Arc::new((self.wrap)(Some(index), cell.clone()));
        *entry = Some((cell, wrapper.clone()));
        Ok(wrapper)
    }

    /// Wrapper for a slot addressed by a signed wire index
    pub fn get_signed(&self, index: i64) -> Result<Arc<W>> {
        let index = usize::try_from(index).map_err(|_| HookwireError::IndexOutOfRange {
            index,
            count: self.count(),
        })?;
        self.get(index)
    }

    /// Wrapper for a cell that is not stored in any slot
    pub fn detached(&self, cell: EntityCell<T>) -> Arc<W> {
        Arc::new((self.wrap)(None, cell))
    }

    /// Wrapper for `cell`, cached if it currently lives at `index`
    pub fn resolve(&self, index: Option<usize>, cell: &EntityCell<T>) -> Arc<W> {
        match index {
            Some(index) if index < self.count() && self.table.holds(index, cell) => match self.get(index) {
                Ok(wrapper) => wrapper,
                Err(_) => self.detached(cell.clone()),
            },
            _ => self.detached(cell.clone()),
        }
    }

    /// Every addressable wrapper in index order
    pub fn iter(&self) -> impl Iterator<Item = Arc<W>> + '_ {
        (0..self.count()).filter_map(move |index| self.get(index).ok())
    }

    pub fn table(&self) -> &Arc<EntityTable<T>> {
        &self.table
    }
}

impl<T, W> fmt::Debug for EntityList<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityList").field("count", &self.cache.len()).finish()
    }
}
