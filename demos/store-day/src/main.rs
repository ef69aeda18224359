//! One day at the store, played through the inventory API
//!
//! Builds the world from the embedded layout, runs the start-of-day
//! restock, then replays a handful of player drags and logs what a view
//! would have to redraw.
//!
//! Usage: RUST_LOG=debug cargo run -p store-day

use std::collections::HashMap;
use std::error::Error;

use konbini_inventory::prelude::*;
use serde::Deserialize;

const LAYOUT: &str = r#"{
    "templates": [
        { "name": "Apple", "price": 2, "shelf_width": 24.0, "tags": ["fruit"] },
        { "name": "Melon", "price": 8, "shelf_width": 60.0, "tags": ["fruit"] },
        { "name": "Onigiri", "price": 3, "shelf_width": 30.0, "tags": ["store object"] },
        { "name": "Soda", "price": 2, "shelf_width": 18.0, "tags": ["store object"] },
        { "name": "Weed", "description": "Grows back every night" },
        { "name": "Shovel", "price": 40, "tags": ["shovel"] }
    ],
    "inventories": [
        { "name": "bag", "capacity": 8 },
        {
            "name": "shelf",
            "capacity": 6,
            "policy": { "type": "physical_space", "budget": 120.0, "gap": 4.0 },
            "accepts": ["Apple", "Melon", "Onigiri", "Soda"]
        },
        { "name": "planter", "capacity": 2, "accepts": [] },
        { "name": "apple tree", "capacity": 3, "accepts": ["Apple"] },
        { "name": "trash", "capacity": 1, "policy": { "type": "disposal" } }
    ]
}"#;

#[derive(Debug, Deserialize)]
struct WorldLayout {
    templates: Vec<ItemTemplate>,
    inventories: Vec<InventoryLayout>,
}

#[derive(Debug, Deserialize)]
struct InventoryLayout {
    #[serde(flatten)]
    config: InventoryConfig,
    /// Template names players may drop here (absent = anything)
    accepts: Option<Vec<String>>,
}

struct World {
    system: InventorySystem,
    inventories: HashMap<String, InventoryId>,
    layouts: Vec<LayoutInvalidator>,
}

impl World {
    fn build(layout: WorldLayout) -> Result<Self, Box<dyn Error>> {
        let mut catalog = Catalog::new();
        for template in layout.templates {
            catalog.register(template);
        }
        let mut system = InventorySystem::new(catalog);

        let mut inventories = HashMap::new();
        let mut layouts = Vec::new();
        for entry in layout.inventories {
            let mut config = entry.config;
            if let Some(names) = entry.accepts {
                let templates = names
                    .iter()
                    .map(|name| system.catalog().find(name).ok_or_else(|| format!("unknown template '{}'", name)))
                    .collect::<Result<Vec<_>, _>>()?;
                config = config.with_matcher(Matcher::or(templates.into_iter().map(Matcher::item)));
            }
            let name = config.name.clone();
            let id = system.create_inventory(config)?;
            layouts.push(LayoutInvalidator::attach(&mut system, id)?);
            inventories.insert(name, id);
        }

        Ok(Self {
            system,
            inventories,
            layouts,
        })
    }

    fn inventory(&self, name: &str) -> Result<InventoryId, Box<dyn Error>> {
        self.inventories
            .get(name)
            .copied()
            .ok_or_else(|| format!("no inventory named '{}'", name).into())
    }

    fn template(&self, name: &str) -> Result<TemplateId, Box<dyn Error>> {
        self.system
            .catalog()
            .find(name)
            .ok_or_else(|| format!("no template named '{}'", name).into())
    }

    /// Empty an inventory and destroy what was in it
    fn wipe(&mut self, name: &str) -> Result<(), Box<dyn Error>> {
        let id = self.inventory(name)?;
        for item in self.system.clear(id)? {
            self.system.dispose(item);
        }
        Ok(())
    }

    /// Spawn items into an inventory until it refuses one
    fn seed(&mut self, name: &str, templates: &[&str]) -> Result<usize, Box<dyn Error>> {
        let id = self.inventory(name)?;
        let mut placed = 0;
        for template_name in templates {
            let template = self.template(template_name)?;
            let item = self.system.spawn(template)?;
            match self.system.add_unfiltered(id, item) {
                Ok(()) => placed += 1,
                Err(err) => {
                    log::debug!("Stopped seeding '{}': {}", name, err);
                    self.system.dispose(item);
                    break;
                }
            }
        }
        Ok(placed)
    }

    fn drop_on(&mut self, target: DropTarget, item: ItemId) {
        let name = self
            .system
            .item_template(item)
            .map_or_else(|| "?".to_string(), |t| t.name.clone());
        match drop_item(&mut self.system, target, item) {
            DropFeedback::Accepted => log::info!("Dropped {} on {:?}", name, target),
            DropFeedback::Rejected(err) => {
                log::info!("Can't drop {} there ({})", name, err.as_str())
            }
            DropFeedback::Failed(_) => {}
        }
    }

    /// What a view would do once per frame
    fn redraw(&self) {
        for layout in &self.layouts {
            let Some(slots) = layout.rebuild(&self.system) else {
                continue;
            };
            let Some(inventory) = self.system.inventory(layout.inventory()) else {
                continue;
            };
            let cells: Vec<String> = slots
                .iter()
                .map(|slot| match slot.and_then(|item| self.system.item_template(item)) {
                    Some(template) => template.name.clone(),
                    None => "-".into(),
                })
                .collect();
            log::info!("[{}] {}", inventory.name(), cells.join(" | "));
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let layout: WorldLayout = serde_json::from_str(LAYOUT)?;
    let mut world = World::build(layout)?;

    let trash = world.inventory("trash")?;
    world.system.on_disposed(trash, |e: &ItemDisposed| {
        log::info!("Trash can swallowed {}", e.item);
    })?;

    log::info!("=== Start of day ===");
    for name in ["shelf", "planter", "apple tree"] {
        world.wipe(name)?;
    }
    let stocked = world.seed("shelf", &["Onigiri", "Soda", "Onigiri", "Melon", "Soda"])?;
    log::info!("Restocked {} item(s)", stocked);
    world.seed("planter", &["Weed", "Weed"])?;
    world.seed("apple tree", &["Apple", "Apple", "Apple"])?;
    world.redraw();

    log::info!("=== Player ===");
    let bag = world.inventory("bag")?;
    let planter = world.inventory("planter")?;
    let tree = world.inventory("apple tree")?;
    let shelf = world.inventory("shelf")?;

    let shovel_template = world.template("Shovel")?;
    let shovel = world.system.spawn(shovel_template)?;
    world.drop_on(DropTarget::Inventory(bag), shovel);

    if world.system.contains_template(bag, shovel_template) {
        let weeds: Vec<ItemId> = world
            .system
            .inventory(planter)
            .map(|inv| inv.iter().flatten().collect())
            .unwrap_or_default();
        for weed in weeds {
            world.drop_on(DropTarget::Inventory(bag), weed);
        }
    }

    let apples: Vec<ItemId> = world
        .system
        .inventory(tree)
        .map(|inv| inv.iter().flatten().collect())
        .unwrap_or_default();
    for (i, apple) in apples.iter().enumerate() {
        world.drop_on(DropTarget::Cell(bag, 4 + i), *apple);
    }
    world.redraw();

    // Stocking shelves: one apple fits, the rest of the shelf is full
    for apple in &apples {
        world.drop_on(DropTarget::Cell(shelf, 0), *apple);
    }

    // Putting a weed back in the planter is refused, the trash takes it
    let weed_template = world.template("Weed")?;
    let weed = world.system.inventory(bag).and_then(|inv| {
        inv.iter()
            .flatten()
            .find(|item| world.system.template_of(*item) == Some(weed_template))
    });
    if let Some(weed) = weed {
        world.drop_on(DropTarget::Cell(planter, 0), weed);
        world.drop_on(DropTarget::Inventory(trash), weed);
    }

    // Reorder the bag: the shovel trades places with the apple in cell 5
    world.drop_on(DropTarget::Cell(bag, 5), shovel);
    world.redraw();

    log::info!(
        "End of day: {} live item(s), ledger consistent: {}",
        world.system.item_count(),
        world.system.is_consistent()
    );
    Ok(())
}
