//! Inventory system
//!
//! Owns every item, every inventory and the ledger recording which
//! inventory holds which item. All mutations go through here, so an item is
//! detached from its previous inventory exactly once before it lands in a
//! new one, and a cross-inventory swap either completes on both sides or
//! leaves both untouched.

use std::collections::HashMap;

use crate::config::InventoryConfig;
use crate::error::{ConfigError, InventoryError};
use crate::inventory::{CellChanged, Inventory, InventoryChanged, InventoryId, ItemDisposed};
use crate::item::{Catalog, Item, ItemId, ItemTemplate, TemplateId};
use crate::policy::AcceptancePolicy;
use konbini_core::HandleMap;
use konbini_event::SubscriberId;

/// Whether an operation evaluates the inventory's acceptance predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filtering {
    Apply,
    Skip,
}

/// Items, inventories and the ownership ledger between them
pub struct InventorySystem {
    catalog: Catalog,
    items: HandleMap<Item>,
    inventories: HandleMap<Inventory>,
    /// item -> inventory currently holding it
    owners: HashMap<ItemId, InventoryId>,
}

impl InventorySystem {
    /// Create a system over a template catalog
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            items: HandleMap::new(),
            inventories: HandleMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Template catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Register another template
    pub fn register_template(&mut self, template: ItemTemplate) -> TemplateId {
        self.catalog.register(template)
    }

    // ---------------------------------------------------------------------
    // Inventories
    // ---------------------------------------------------------------------

    /// Create an inventory from a validated config
    pub fn create_inventory(&mut self, config: InventoryConfig) -> Result<InventoryId, ConfigError> {
        config.validate(&self.catalog)?;

        let matcher = config.acceptance();
        let inventory = Inventory::new(config.name, config.capacity, matcher, config.policy);
        let id = self.inventories.insert(inventory);
        if let Some(inventory) = self.inventories.get_mut(id) {
            inventory.bind(id);
            log::debug!(
                "Created inventory '{}' ({}) with {} slot(s), policy {:?}",
                inventory.name(),
                id,
                inventory.capacity(),
                inventory.policy()
            );
        }
        Ok(id)
    }

    /// Look up an inventory
    pub fn inventory(&self, id: InventoryId) -> Option<&Inventory> {
        self.inventories.get(id)
    }

    /// Every inventory, in creation order
    pub fn inventories(&self) -> impl Iterator<Item = (InventoryId, &Inventory)> {
        self.inventories.iter()
    }

    fn inventory_checked(&self, id: InventoryId) -> Result<&Inventory, InventoryError> {
        self.inventories.get(id).ok_or_else(|| {
            log::error!("Inventory {} does not exist", id);
            InventoryError::Unknown
        })
    }

    fn inventory_checked_mut(&mut self, id: InventoryId) -> Result<&mut Inventory, InventoryError> {
        self.inventories.get_mut(id).ok_or_else(|| {
            log::error!("Inventory {} does not exist", id);
            InventoryError::Unknown
        })
    }

    // ---------------------------------------------------------------------
    // Items
    // ---------------------------------------------------------------------

    /// Create an unowned item from a registered template
    pub fn spawn(&mut self, template: TemplateId) -> Result<ItemId, InventoryError> {
        if !self.catalog.contains(template) {
            return Err(InventoryError::InvalidItem);
        }
        let item = self.items.insert(Item::new(template));
        log::trace!("Spawned item {} from template {}", item, template);
        Ok(item)
    }

    /// Destroy an item, vacating its slot first. Returns `false` for a
    /// stale handle.
    pub fn dispose(&mut self, item: ItemId) -> bool {
        if !self.items.contains(item) {
            return false;
        }
        self.detach(item);
        self.items.remove(item);
        log::debug!("Disposed item {}", item);
        true
    }

    /// Check if a handle still names a live item
    pub fn is_alive(&self, item: ItemId) -> bool {
        self.items.contains(item)
    }

    /// Number of live items, owned or not
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Template of a live item
    pub fn template_of(&self, item: ItemId) -> Option<TemplateId> {
        self.items.get(item).map(Item::template)
    }

    /// Template definition of a live item
    pub fn item_template(&self, item: ItemId) -> Option<&ItemTemplate> {
        self.template_of(item).and_then(|t| self.catalog.get(t))
    }

    /// Inventory currently holding an item
    pub fn owner_of(&self, item: ItemId) -> Option<InventoryId> {
        self.owners.get(&item).copied()
    }

    fn shelf_width(&self, template: TemplateId) -> f32 {
        self.catalog.get(template).map_or(0.0, |t| t.shelf_width)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Whether the inventory's predicate accepts the item. A stale item or
    /// an unknown inventory is never supported.
    pub fn supports(&self, inventory: InventoryId, item: ItemId) -> bool {
        match (self.inventories.get(inventory), self.template_of(item)) {
            (Some(inventory), Some(template)) => inventory.supports(template),
            _ => false,
        }
    }

    /// Whether any slot holds an item of this template
    pub fn contains_template(&self, inventory: InventoryId, template: TemplateId) -> bool {
        self.inventories.get(inventory).is_some_and(|inv| {
            inv.iter()
                .flatten()
                .any(|item| self.template_of(item) == Some(template))
        })
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Put an item in the lowest free slot, moving it out of its current
    /// inventory.
    pub fn add(&mut self, inventory: InventoryId, item: ItemId) -> Result<(), InventoryError> {
        self.insert(inventory, item, Filtering::Apply)
    }

    /// [`add`](Self::add) without evaluating the acceptance predicate.
    /// Capacity and shelf space still apply.
    pub fn add_unfiltered(&mut self, inventory: InventoryId, item: ItemId) -> Result<(), InventoryError> {
        self.insert(inventory, item, Filtering::Skip)
    }

    /// Put an item at a specific slot
    ///
    /// - the slot already holds the item: `AlreadyExists`
    /// - the item is elsewhere in the same inventory: the two slots exchange
    /// - the slot is empty: the item moves in
    /// - the slot holds another item: the occupant moves to the incoming
    ///   item's old place, or nothing changes at all
    ///
    /// Inventories without addressable slots ignore `index` and behave as
    /// [`add`](Self::add).
    pub fn set(&mut self, inventory: InventoryId, index: usize, item: ItemId) -> Result<(), InventoryError> {
        self.assign(inventory, index, item, Filtering::Apply)
    }

    /// [`set`](Self::set) without evaluating the target's acceptance
    /// predicate
    pub fn set_unfiltered(
        &mut self,
        inventory: InventoryId,
        index: usize,
        item: ItemId,
    ) -> Result<(), InventoryError> {
        self.assign(inventory, index, item, Filtering::Skip)
    }

    /// Take an item out of an inventory. Returns `Ok(false)` if it was not
    /// there.
    pub fn remove(&mut self, inventory: InventoryId, item: ItemId) -> Result<bool, InventoryError> {
        let target = self.inventory_checked_mut(inventory)?;
        let Some(index) = target.index_of(item) else {
            return Ok(false);
        };
        target.vacate(index);
        if self.owners.get(&item) == Some(&inventory) {
            self.owners.remove(&item);
        } else {
            log::warn!("Removed item {} from {} without a matching owner entry", item, inventory);
        }
        Ok(true)
    }

    /// Empty every slot. The cleared items stay alive and unowned.
    pub fn clear(&mut self, inventory: InventoryId) -> Result<Vec<ItemId>, InventoryError> {
        let cleared = self.inventory_checked_mut(inventory)?.clear();
        for item in &cleared {
            self.owners.remove(item);
        }
        if !cleared.is_empty() {
            log::debug!("Cleared {} item(s) from {}", cleared.len(), inventory);
        }
        Ok(cleared)
    }

    fn insert(&mut self, id: InventoryId, item: ItemId, filtering: Filtering) -> Result<(), InventoryError> {
        let template = self.template_of(item).ok_or(InventoryError::InvalidItem)?;
        let inventory = self.inventory_checked(id)?;

        if filtering == Filtering::Apply && !inventory.supports(template) {
            return Err(InventoryError::InvalidItem);
        }
        if inventory.contains(item) {
            return Err(InventoryError::AlreadyExists);
        }

        let index = match inventory.policy() {
            AcceptancePolicy::Disposal => {
                self.dispose_into(id, item, template);
                return Ok(());
            }
            AcceptancePolicy::PhysicalSpace(space) => {
                let existing: Vec<f32> = inventory
                    .iter()
                    .flatten()
                    .filter_map(|held| self.template_of(held))
                    .map(|t| self.shelf_width(t))
                    .collect();
                let width = self.shelf_width(template);
                if !space.fits(existing.iter().copied(), width) {
                    log::debug!(
                        "Item {} needs {} of {} shelf space in '{}'",
                        item,
                        space.required(existing.iter().copied(), width),
                        space.budget,
                        inventory.name()
                    );
                    return Err(InventoryError::OutOfSpace);
                }
                inventory.first_empty()
            }
            AcceptancePolicy::Slots => inventory.first_empty(),
        };

        let index = index.ok_or(InventoryError::OutOfSpace)?;
        self.transfer(id, index, item);
        Ok(())
    }

    fn assign(
        &mut self,
        id: InventoryId,
        index: usize,
        item: ItemId,
        filtering: Filtering,
    ) -> Result<(), InventoryError> {
        let template = self.template_of(item).ok_or(InventoryError::InvalidItem)?;
        let inventory = self.inventory_checked(id)?;

        if !inventory.policy().is_index_addressable() {
            return self.insert(id, item, filtering);
        }
        if filtering == Filtering::Apply && !inventory.supports(template) {
            return Err(InventoryError::InvalidItem);
        }

        let occupant = inventory.get(index)?;
        if occupant == Some(item) {
            return Err(InventoryError::AlreadyExists);
        }

        if let Some(current) = inventory.index_of(item) {
            self.inventory_checked_mut(id)?.shuffle(current, index);
            log::trace!("Shuffled item {} from slot {} to {} in {}", item, current, index, id);
            return Ok(());
        }

        match occupant {
            None => {
                self.transfer(id, index, item);
                Ok(())
            }
            Some(occupant) => self.swap(id, index, occupant, item),
        }
    }

    /// Exchange `occupant` (at `a[ia]`) with `incoming` (wherever it lives)
    ///
    /// The incoming item's slot is emptied silently and the occupant is
    /// offered to that inventory with a normal filtered `set`, which fires
    /// the emptied cell along with the occupant's. If that is refused
    /// everything is put back and no signal has fired.
    fn swap(
        &mut self,
        a: InventoryId,
        ia: usize,
        occupant: ItemId,
        incoming: ItemId,
    ) -> Result<(), InventoryError> {
        let Some(b) = self.owner_of(incoming) else {
            return Err(InventoryError::Occupied);
        };
        let Some(ib) = self.inventories.get(b).and_then(|inv| inv.index_of(incoming)) else {
            log::error!("Item {} is owned by {} but not held in any of its slots", incoming, b);
            return Err(InventoryError::Unknown);
        };

        // A shelf on the `b` side may put the occupant in a lower slot; the
        // deferred vacate still announces `b[ib]` before `b` changes.
        self.inventory_checked_mut(b)?.vacate_deferred(ib);
        self.owners.remove(&occupant);

        if let Err(err) = self.assign(b, ib, occupant, Filtering::Apply) {
            if let Some(inventory) = self.inventories.get_mut(b) {
                inventory.restore_deferred(incoming);
            }
            self.owners.insert(occupant, a);
            log::debug!("Swap of {} and {} rolled back: {}", occupant, incoming, err);
            return Err(err);
        }

        self.owners.insert(incoming, a);
        self.inventory_checked_mut(a)?.place(ia, incoming);
        log::debug!("Swapped {} ({} slot {}) with {} ({} slot {})", incoming, b, ib, occupant, a, ia);
        Ok(())
    }

    /// Move an item into `to[index]`, detaching it from its owner first
    fn transfer(&mut self, to: InventoryId, index: usize, item: ItemId) {
        let from = self.detach(item);
        self.owners.insert(item, to);
        if let Some(inventory) = self.inventories.get_mut(to) {
            inventory.place(index, item);
        }
        match from {
            Some(from) => log::debug!("Moved item {} from {} to {} slot {}", item, from, to, index),
            None => log::trace!("Placed item {} in {} slot {}", item, to, index),
        }
    }

    /// Vacate the item's slot in its owner, firing the owner's signals.
    /// Returns the former owner.
    fn detach(&mut self, item: ItemId) -> Option<InventoryId> {
        let owner = self.owners.remove(&item)?;
        match self.inventories.get_mut(owner) {
            Some(inventory) => match inventory.index_of(item) {
                Some(index) => {
                    inventory.vacate(index);
                }
                None => log::warn!("Item {} owned by '{}' but not in any slot", item, inventory.name()),
            },
            None => log::warn!("Item {} owned by missing inventory {}", item, owner),
        }
        Some(owner)
    }

    fn dispose_into(&mut self, trash: InventoryId, item: ItemId, template: TemplateId) {
        self.detach(item);
        self.items.remove(item);
        if let Some(inventory) = self.inventories.get(trash) {
            log::debug!("Item {} thrown into '{}'", item, inventory.name());
            inventory.emit_disposed(item, template);
        }
    }

    // ---------------------------------------------------------------------
    // Subscriptions
    // ---------------------------------------------------------------------

    /// Observe whole-inventory changes
    pub fn on_changed<F>(&mut self, inventory: InventoryId, handler: F) -> Result<SubscriberId, InventoryError>
    where
        F: Fn(&InventoryChanged) + Send + Sync + 'static,
    {
        Ok(self.inventory_checked_mut(inventory)?.changed_signal().subscribe(handler))
    }

    /// Stop observing whole-inventory changes
    pub fn off_changed(&mut self, inventory: InventoryId, id: SubscriberId) -> bool {
        self.inventories
            .get_mut(inventory)
            .is_some_and(|inv| inv.changed_signal().unsubscribe(id))
    }

    /// Observe one slot. An index outside the inventory is `OutOfBounds`.
    pub fn on_cell_changed<F>(
        &mut self,
        inventory: InventoryId,
        index: usize,
        handler: F,
    ) -> Result<SubscriberId, InventoryError>
    where
        F: Fn(&CellChanged) + Send + Sync + 'static,
    {
        Ok(self
            .inventory_checked_mut(inventory)?
            .cell_signal(index)?
            .subscribe(handler))
    }

    /// Stop observing one slot
    pub fn off_cell_changed(&mut self, inventory: InventoryId, index: usize, id: SubscriberId) -> bool {
        self.inventories
            .get_mut(inventory)
            .and_then(|inv| inv.cell_signal(index).ok())
            .is_some_and(|signal| signal.unsubscribe(id))
    }

    /// Observe items destroyed by a disposal inventory
    pub fn on_disposed<F>(&mut self, inventory: InventoryId, handler: F) -> Result<SubscriberId, InventoryError>
    where
        F: Fn(&ItemDisposed) + Send + Sync + 'static,
    {
        Ok(self.inventory_checked_mut(inventory)?.disposed_signal().subscribe(handler))
    }

    /// Stop observing disposals
    pub fn off_disposed(&mut self, inventory: InventoryId, id: SubscriberId) -> bool {
        self.inventories
            .get_mut(inventory)
            .is_some_and(|inv| inv.disposed_signal().unsubscribe(id))
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    /// Audit the ledger against every slot array
    ///
    /// True when each owned item sits in exactly one slot of its owner and
    /// every held item is live and owned by the inventory holding it.
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashMap::new();
        for (id, inventory) in self.inventories.iter() {
            for item in inventory.iter().flatten() {
                if seen.insert(item, id).is_some() {
                    log::warn!("Item {} held in more than one slot", item);
                    return false;
                }
                if !self.items.contains(item) || self.owner_of(item) != Some(id) {
                    log::warn!("Item {} in {} has a mismatched owner entry", item, id);
                    return false;
                }
            }
        }
        seen.len() == self.owners.len()
    }
}

impl Default for InventorySystem {
    fn default() -> Self {
        Self::new(Catalog::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Matcher;

    struct Fixture {
        system: InventorySystem,
        apple: TemplateId,
        pear: TemplateId,
    }

    fn fixture() -> Fixture {
        let mut catalog = Catalog::new();
        let apple = catalog.register(ItemTemplate::new("Apple").with_shelf_width(4.0));
        let pear = catalog.register(ItemTemplate::new("Pear").with_shelf_width(2.0));
        Fixture {
            system: InventorySystem::new(catalog),
            apple,
            pear,
        }
    }

    #[test]
    fn test_create_inventory_rejects_bad_config() {
        let mut f = fixture();
        assert!(f.system.create_inventory(InventoryConfig::new("bag", 0)).is_err());

        let bag = f.system.create_inventory(InventoryConfig::new("bag", 2)).unwrap();
        let inventory = f.system.inventory(bag).unwrap();
        assert_eq!(inventory.id(), bag);
        assert_eq!(inventory.name(), "bag");
    }

    #[test]
    fn test_spawn_requires_registered_template() {
        let mut f = fixture();
        let item = f.system.spawn(f.apple).unwrap();
        assert_eq!(f.system.template_of(item), Some(f.apple));
        assert_eq!(f.system.item_template(item).unwrap().name, "Apple");
        assert_eq!(f.system.owner_of(item), None);

        assert_eq!(
            f.system.spawn(TemplateId::new(42, 0)),
            Err(InventoryError::InvalidItem)
        );
    }

    #[test]
    fn test_add_fills_lowest_slot() {
        let mut f = fixture();
        let bag = f.system.create_inventory(InventoryConfig::new("bag", 2)).unwrap();
        let a = f.system.spawn(f.apple).unwrap();
        let b = f.system.spawn(f.pear).unwrap();
        let c = f.system.spawn(f.pear).unwrap();

        f.system.add(bag, a).unwrap();
        f.system.add(bag, b).unwrap();
        assert_eq!(f.system.add(bag, a), Err(InventoryError::AlreadyExists));
        assert_eq!(f.system.add(bag, c), Err(InventoryError::OutOfSpace));

        let inventory = f.system.inventory(bag).unwrap();
        assert_eq!(inventory.snapshot(), vec![Some(a), Some(b)]);
        assert_eq!(f.system.owner_of(a), Some(bag));
        assert!(f.system.is_consistent());
    }

    #[test]
    fn test_filter_rejects_without_side_effects() {
        let mut f = fixture();
        let tree = f
            .system
            .create_inventory(InventoryConfig::new("tree", 3).with_matcher(Matcher::item(f.apple)))
            .unwrap();
        let pear = f.system.spawn(f.pear).unwrap();

        assert!(!f.system.supports(tree, pear));
        assert_eq!(f.system.add(tree, pear), Err(InventoryError::InvalidItem));
        assert_eq!(f.system.set(tree, 0, pear), Err(InventoryError::InvalidItem));
        assert!(f.system.inventory(tree).unwrap().is_empty());

        // Seeding bypasses the predicate
        f.system.add_unfiltered(tree, pear).unwrap();
        assert!(f.system.contains_template(tree, f.pear));
        assert!(!f.system.contains_template(tree, f.apple));
    }

    #[test]
    fn test_unknown_inventory() {
        let mut f = fixture();
        let item = f.system.spawn(f.apple).unwrap();
        let missing = InventoryId::new(7, 0);

        assert_eq!(f.system.add(missing, item), Err(InventoryError::Unknown));
        assert_eq!(f.system.remove(missing, item), Err(InventoryError::Unknown));
        assert!(f.system.on_changed(missing, |_| {}).is_err());
        assert!(!f.system.supports(missing, item));
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut f = fixture();
        let bag = f.system.create_inventory(InventoryConfig::new("bag", 2)).unwrap();
        let a = f.system.spawn(f.apple).unwrap();
        assert_eq!(f.system.set(bag, 2, a), Err(InventoryError::OutOfBounds));
        assert_eq!(f.system.owner_of(a), None);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut f = fixture();
        let bag = f.system.create_inventory(InventoryConfig::new("bag", 3)).unwrap();
        let a = f.system.spawn(f.apple).unwrap();
        let b = f.system.spawn(f.pear).unwrap();
        f.system.add(bag, a).unwrap();
        f.system.add(bag, b).unwrap();

        assert_eq!(f.system.remove(bag, a), Ok(true));
        assert_eq!(f.system.remove(bag, a), Ok(false));
        assert_eq!(f.system.owner_of(a), None);

        assert_eq!(f.system.clear(bag), Ok(vec![b]));
        assert_eq!(f.system.owner_of(b), None);
        assert!(f.system.is_alive(b));
        assert!(f.system.is_consistent());
    }

    #[test]
    fn test_shelf_ignores_index() {
        let mut f = fixture();
        let shelf = f
            .system
            .create_inventory(InventoryConfig::shelf("shelf", 4, 100.0, 1.0))
            .unwrap();
        let a = f.system.spawn(f.apple).unwrap();

        f.system.set(shelf, 99, a).unwrap();
        assert_eq!(f.system.inventory(shelf).unwrap().index_of(a), Some(0));
    }

    #[test]
    fn test_dispose_vacates_slot() {
        let mut f = fixture();
        let bag = f.system.create_inventory(InventoryConfig::new("bag", 1)).unwrap();
        let a = f.system.spawn(f.apple).unwrap();
        f.system.add(bag, a).unwrap();

        assert!(f.system.dispose(a));
        assert!(!f.system.dispose(a));
        assert!(f.system.inventory(bag).unwrap().is_empty());
        assert_eq!(f.system.add(bag, a), Err(InventoryError::InvalidItem));
        assert_eq!(f.system.item_count(), 0);
    }

    #[test]
    fn test_subscription_bounds() {
        let mut f = fixture();
        let bag = f.system.create_inventory(InventoryConfig::new("bag", 2)).unwrap();

        assert_eq!(
            f.system.on_cell_changed(bag, 2, |_| {}),
            Err(InventoryError::OutOfBounds)
        );
        let sub = f.system.on_cell_changed(bag, 1, |_| {}).unwrap();
        assert!(!f.system.off_cell_changed(bag, 0, sub));
        assert!(f.system.off_cell_changed(bag, 1, sub));
        assert!(!f.system.off_cell_changed(bag, 1, sub));
    }
}
