//! Presentation-side helpers
//!
//! Views never read slots on every signal. They mark themselves dirty and
//! rebuild once per frame from the current contents. Drop handlers forward
//! a placement result and get back what to tell the player.

use crate::error::InventoryError;
use crate::inventory::{InventoryChanged, InventoryId};
use crate::item::ItemId;
use crate::system::InventorySystem;
use konbini_event::{InvalidationFlag, SubscriberId};

/// Dirty bit wired to one inventory's changed signal
#[derive(Debug)]
pub struct LayoutInvalidator {
    inventory: InventoryId,
    flag: InvalidationFlag,
    subscription: Option<SubscriberId>,
}

impl LayoutInvalidator {
    /// Subscribe to an inventory. Starts dirty so the first frame builds.
    pub fn attach(system: &mut InventorySystem, inventory: InventoryId) -> Result<Self, InventoryError> {
        let flag = InvalidationFlag::new();
        let shared = flag.clone();
        let subscription = system.on_changed(inventory, move |_: &InventoryChanged| shared.invalidate())?;
        Ok(Self {
            inventory,
            flag,
            subscription: Some(subscription),
        })
    }

    /// Inventory being watched
    pub fn inventory(&self) -> InventoryId {
        self.inventory
    }

    /// Stop watching. Returns `false` if already detached.
    pub fn detach(&mut self, system: &mut InventorySystem) -> bool {
        match self.subscription.take() {
            Some(id) => system.off_changed(self.inventory, id),
            None => false,
        }
    }

    /// Check if still subscribed
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Check and reset the dirty bit
    pub fn take_invalidated(&self) -> bool {
        self.flag.take()
    }

    /// Slot contents to lay out, if anything changed since the last call
    pub fn rebuild(&self, system: &InventorySystem) -> Option<Vec<Option<ItemId>>> {
        if !self.take_invalidated() {
            return None;
        }
        system.inventory(self.inventory).map(|inv| inv.snapshot())
    }
}

/// Where a dragged item was released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Anywhere on the inventory: lowest free slot
    Inventory(InventoryId),
    /// A specific cell
    Cell(InventoryId, usize),
}

/// What a drop handler should do with a placement result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropFeedback {
    /// The item moved; the view will redraw from signals
    Accepted,
    /// Refused for a reason the player should see
    Rejected(InventoryError),
    /// A bug; logged, never shown
    Failed(InventoryError),
}

impl DropFeedback {
    /// Route a result by error severity
    pub fn from_result(result: Result<(), InventoryError>) -> Self {
        match result {
            Ok(()) => Self::Accepted,
            Err(err) if err.severity().is_user_facing() => Self::Rejected(err),
            Err(err) => {
                log::error!("Drop failed with internal error: {}", err);
                Self::Failed(err)
            }
        }
    }

    /// Message key to show, if any
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            Self::Rejected(err) => Some(err.as_str()),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Apply a drop to the system
pub fn drop_item(system: &mut InventorySystem, target: DropTarget, item: ItemId) -> DropFeedback {
    let result = match target {
        DropTarget::Inventory(inventory) => system.add(inventory, item),
        DropTarget::Cell(inventory, index) => system.set(inventory, index, item),
    };
    DropFeedback::from_result(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InventoryConfig;
    use crate::item::{Catalog, ItemTemplate};

    #[test]
    fn test_feedback_routing() {
        assert_eq!(DropFeedback::from_result(Ok(())), DropFeedback::Accepted);
        assert_eq!(
            DropFeedback::from_result(Err(InventoryError::OutOfSpace)),
            DropFeedback::Rejected(InventoryError::OutOfSpace)
        );
        assert_eq!(
            DropFeedback::from_result(Err(InventoryError::OutOfBounds)),
            DropFeedback::Failed(InventoryError::OutOfBounds)
        );
        assert_eq!(
            DropFeedback::Rejected(InventoryError::Occupied).message_key(),
            Some("occupied")
        );
        assert_eq!(DropFeedback::Failed(InventoryError::Unknown).message_key(), None);
    }

    #[test]
    fn test_invalidator_coalesces() {
        let mut catalog = Catalog::new();
        let apple = catalog.register(ItemTemplate::new("Apple"));
        let mut system = InventorySystem::new(catalog);
        let bag = system.create_inventory(InventoryConfig::new("bag", 3)).unwrap();

        let mut layout = LayoutInvalidator::attach(&mut system, bag).unwrap();
        assert_eq!(layout.rebuild(&system), Some(vec![None, None, None]));
        assert_eq!(layout.rebuild(&system), None);

        let a = system.spawn(apple).unwrap();
        let b = system.spawn(apple).unwrap();
        assert!(drop_item(&mut system, DropTarget::Inventory(bag), a).is_accepted());
        assert!(drop_item(&mut system, DropTarget::Cell(bag, 2), b).is_accepted());

        // Two changes, one rebuild
        assert_eq!(layout.rebuild(&system), Some(vec![Some(a), None, Some(b)]));
        assert!(!layout.take_invalidated());

        assert!(layout.detach(&mut system));
        assert!(!layout.detach(&mut system));
        system.remove(bag, a).unwrap();
        assert_eq!(layout.rebuild(&system), None);
    }

    #[test]
    fn test_drop_rejection() {
        let mut catalog = Catalog::new();
        let apple = catalog.register(ItemTemplate::new("Apple"));
        let mut system = InventorySystem::new(catalog);
        let bag = system.create_inventory(InventoryConfig::new("bag", 1)).unwrap();
        let a = system.spawn(apple).unwrap();

        drop_item(&mut system, DropTarget::Inventory(bag), a);
        assert_eq!(
            drop_item(&mut system, DropTarget::Cell(bag, 0), a),
            DropFeedback::Rejected(InventoryError::AlreadyExists)
        );
        assert_eq!(
            drop_item(&mut system, DropTarget::Cell(bag, 5), a),
            DropFeedback::Failed(InventoryError::OutOfBounds)
        );
    }
}
