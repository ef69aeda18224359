//! Fixed-capacity slot container
//!
//! An [`Inventory`] owns its slot array and its signals. Everything that
//! writes a slot is crate-private: callers mutate inventories through the
//! [`InventorySystem`](crate::system::InventorySystem), which keeps the
//! ownership ledger in step with the slots.

use crate::error::InventoryError;
use crate::item::{ItemId, TemplateId};
use crate::matcher::Matcher;
use crate::policy::AcceptancePolicy;
use konbini_core::Handle;
use konbini_event::Signal;

/// Handle naming an inventory inside its system
pub type InventoryId = Handle<Inventory>;

/// Something about the inventory's contents changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryChanged {
    pub inventory: InventoryId,
}

/// One slot's contents changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChanged {
    pub inventory: InventoryId,
    pub index: usize,
}

/// A disposal inventory destroyed an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDisposed {
    pub inventory: InventoryId,
    /// Handle of the destroyed item (now stale)
    pub item: ItemId,
    pub template: TemplateId,
}

/// A fixed-capacity array of optional item slots
pub struct Inventory {
    id: InventoryId,
    name: String,
    /// Slots (None = empty); length never changes
    slots: Vec<Option<ItemId>>,
    matcher: Option<Matcher>,
    policy: AcceptancePolicy,
    changed: Signal<InventoryChanged>,
    cell_changed: Vec<Signal<CellChanged>>,
    disposed: Signal<ItemDisposed>,
    /// Slot emptied without a signal, announced by the next `place`
    deferred: Option<usize>,
}

impl Inventory {
    pub(crate) fn new(
        name: String,
        capacity: usize,
        matcher: Option<Matcher>,
        policy: AcceptancePolicy,
    ) -> Self {
        Self {
            id: InventoryId::null(),
            name,
            slots: vec![None; capacity],
            matcher,
            policy,
            changed: Signal::new(),
            cell_changed: (0..capacity).map(|_| Signal::new()).collect(),
            disposed: Signal::new(),
            deferred: None,
        }
    }

    pub(crate) fn bind(&mut self, id: InventoryId) {
        self.id = id;
    }

    /// This inventory's handle
    pub fn id(&self) -> InventoryId {
        self.id
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of free slots
    pub fn free_slots(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Check if every slot is occupied
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Check if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Acceptance policy
    pub fn policy(&self) -> AcceptancePolicy {
        self.policy
    }

    /// Acceptance predicate, if any
    pub fn matcher(&self) -> Option<&Matcher> {
        self.matcher.as_ref()
    }

    /// Read a slot
    pub fn get(&self, index: usize) -> Result<Option<ItemId>, InventoryError> {
        self.slots
            .get(index)
            .copied()
            .ok_or(InventoryError::OutOfBounds)
    }

    /// Position of an item, by identity
    pub fn index_of(&self, item: ItemId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(item))
    }

    /// Check if the item is in this inventory
    pub fn contains(&self, item: ItemId) -> bool {
        self.index_of(item).is_some()
    }

    /// Lowest free slot
    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Evaluate the acceptance predicate. No predicate accepts everything.
    pub fn supports(&self, template: TemplateId) -> bool {
        self.matcher.as_ref().map_or(true, |m| m.matches(template))
    }

    /// Slot contents in index order, `None` for empty slots
    pub fn iter(&self) -> impl Iterator<Item = Option<ItemId>> + '_ {
        self.slots.iter().copied()
    }

    /// Occupied slots as `(index, item)` pairs
    pub fn items(&self) -> impl Iterator<Item = (usize, ItemId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|item| (i, item)))
    }

    /// Copy of the slot array
    pub fn snapshot(&self) -> Vec<Option<ItemId>> {
        self.slots.clone()
    }

    // ---------------------------------------------------------------------
    // Signals
    // ---------------------------------------------------------------------

    pub(crate) fn changed_signal(&mut self) -> &mut Signal<InventoryChanged> {
        &mut self.changed
    }

    pub(crate) fn cell_signal(&mut self, index: usize) -> Result<&mut Signal<CellChanged>, InventoryError> {
        self.cell_changed
            .get_mut(index)
            .ok_or(InventoryError::OutOfBounds)
    }

    pub(crate) fn disposed_signal(&mut self) -> &mut Signal<ItemDisposed> {
        &mut self.disposed
    }

    fn emit_cell(&self, index: usize) {
        if let Some(signal) = self.cell_changed.get(index) {
            signal.emit(&CellChanged {
                inventory: self.id,
                index,
            });
        }
    }

    fn emit_changed(&self) {
        self.changed.emit(&InventoryChanged { inventory: self.id });
    }

    pub(crate) fn emit_disposed(&self, item: ItemId, template: TemplateId) {
        self.disposed.emit(&ItemDisposed {
            inventory: self.id,
            item,
            template,
        });
    }

    // ---------------------------------------------------------------------
    // Slot writes (the system keeps ownership in step)
    // ---------------------------------------------------------------------

    /// Write an item into a slot, then fire cell-changed and changed. A
    /// slot emptied by [`vacate_deferred`](Self::vacate_deferred) is
    /// announced first.
    pub(crate) fn place(&mut self, index: usize, item: ItemId) {
        self.slots[index] = Some(item);
        if let Some(vacated) = self.deferred.take() {
            if vacated != index {
                self.emit_cell(vacated);
            }
        }
        self.emit_cell(index);
        self.emit_changed();
    }

    /// Empty a slot, then fire cell-changed and changed
    pub(crate) fn vacate(&mut self, index: usize) -> Option<ItemId> {
        let previous = self.slots[index].take();
        self.emit_cell(index);
        self.emit_changed();
        previous
    }

    /// Exchange two slots, firing both cells then changed once
    pub(crate) fn shuffle(&mut self, first: usize, second: usize) {
        self.slots.swap(first, second);
        self.emit_cell(first);
        self.emit_cell(second);
        self.emit_changed();
    }

    /// Empty a slot without firing anything while a swap is provisional.
    /// The next `place` fires its cell-changed, or `restore_deferred` puts
    /// the item back unannounced.
    pub(crate) fn vacate_deferred(&mut self, index: usize) -> Option<ItemId> {
        self.deferred = Some(index);
        self.slots[index].take()
    }

    /// Undo [`vacate_deferred`](Self::vacate_deferred)
    pub(crate) fn restore_deferred(&mut self, item: ItemId) {
        if let Some(index) = self.deferred.take() {
            self.slots[index] = Some(item);
        }
    }

    /// Empty every occupied slot. Fires one cell-changed per cleared slot
    /// and then a single changed if anything was cleared.
    pub(crate) fn clear(&mut self) -> Vec<ItemId> {
        let mut cleared = Vec::new();
        for index in 0..self.slots.len() {
            if let Some(item) = self.slots[index].take() {
                self.emit_cell(index);
                cleared.push(item);
            }
        }
        if !cleared.is_empty() {
            self.emit_changed();
        }
        cleared
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = Option<ItemId>;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Option<ItemId>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter().copied()
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("slots", &self.slots)
            .field("policy", &self.policy)
            .finish()
    }
}
