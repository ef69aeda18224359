//! Konbini Inventory - Slot-Indexed Item Placement
//!
//! Every surface that holds items (player bag, store shelves, planters,
//! trees, car trunk, trash can) is an [`Inventory`]: a fixed number of
//! slots, an acceptance predicate and a policy.
//!
//! # Features
//!
//! - Item templates registered in a [`Catalog`]
//! - Uniquely owned items; an item lives in at most one inventory
//! - Composable matchers and legacy whitelist/blacklist filters
//! - Shelves limited by summed physical width
//! - Disposal inventories that destroy what is dropped on them
//! - Atomic swaps across inventories
//! - Per-slot and per-inventory change signals
//!
//! # Example
//!
//! ```ignore
//! use konbini_inventory::prelude::*;
//!
//! let mut catalog = Catalog::new();
//! let apple = catalog.register(ItemTemplate::new("Apple").with_shelf_width(4.0));
//!
//! let mut system = InventorySystem::new(catalog);
//! let bag = system.create_inventory(InventoryConfig::new("bag", 12))?;
//! let shelf = system.create_inventory(InventoryConfig::shelf("shelf", 6, 120.0, 2.0))?;
//!
//! let item = system.spawn(apple)?;
//! system.add(bag, item)?;
//! system.set(shelf, 0, item)?; // moves out of the bag
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod inventory;
pub mod item;
pub mod matcher;
pub mod policy;
pub mod system;

pub mod prelude {
    pub use crate::config::InventoryConfig;
    pub use crate::controller::{drop_item, DropFeedback, DropTarget, LayoutInvalidator};
    pub use crate::error::{ConfigError, ErrorSeverity, InventoryError};
    pub use crate::inventory::{CellChanged, Inventory, InventoryChanged, InventoryId, ItemDisposed};
    pub use crate::item::{Catalog, Item, ItemId, ItemTemplate, ItemVisuals, TemplateId, TemplateList};
    pub use crate::matcher::{ItemFilter, Matcher};
    pub use crate::policy::{AcceptancePolicy, PhysicalSpace};
    pub use crate::system::InventorySystem;
    pub use konbini_event::SubscriberId;
}

pub use prelude::*;
