//! Item templates and item instances

use konbini_core::{Handle, HandleMap};
use serde::{Deserialize, Serialize};

/// Handle naming a registered [`ItemTemplate`]
///
/// Template identity is handle identity: two templates with identical
/// fields registered twice are two different kinds of item.
pub type TemplateId = Handle<ItemTemplate>;

/// Handle naming a live [`Item`]
///
/// Goes stale once the item is disposed.
pub type ItemId = Handle<Item>;

/// Sprite asset paths used by presentation layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemVisuals {
    /// Sprite when the item sits in the world
    pub world: String,
    /// Sprite while the item is being dragged
    pub dragging: String,
    /// Sprite in a 64x64 inventory cell
    pub inventory: String,
}

/// Immutable definition of an item kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTemplate {
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Price in whole currency units
    pub price: u32,
    /// Sprite handles
    pub visuals: ItemVisuals,
    /// Width taken on a shelf
    pub shelf_width: f32,
    /// Marker tags (e.g. "shovel")
    pub tags: Vec<String>,
}

impl ItemTemplate {
    /// Create a new item template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price: 0,
            visuals: ItemVisuals::default(),
            shelf_width: 0.0,
            tags: Vec::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set price
    pub fn with_price(mut self, price: u32) -> Self {
        self.price = price;
        self
    }

    /// Set shelf width. Negative and non-finite widths become 0.
    pub fn with_shelf_width(mut self, width: f32) -> Self {
        self.shelf_width = usable_width(width);
        self
    }

    /// Set all sprite handles
    pub fn with_visuals(mut self, visuals: ItemVisuals) -> Self {
        self.visuals = visuals;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check if the template has a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Default for ItemTemplate {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// A concrete, uniquely owned item
///
/// Items know their template and nothing else. Which inventory holds an
/// item is tracked by the [`InventorySystem`](crate::system::InventorySystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    template: TemplateId,
}

impl Item {
    pub(crate) fn new(template: TemplateId) -> Self {
        Self { template }
    }

    /// The item's template
    pub fn template(&self) -> TemplateId {
        self.template
    }
}

/// Registry of item templates
#[derive(Default)]
pub struct Catalog {
    templates: HandleMap<ItemTemplate>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. Templates are never unregistered.
    ///
    /// A negative or non-finite shelf width (possible through serde) is
    /// stored as 0 so it can never shrink a shelf's required space.
    pub fn register(&mut self, mut template: ItemTemplate) -> TemplateId {
        let width = usable_width(template.shelf_width);
        if width != template.shelf_width {
            log::warn!(
                "Template '{}' has shelf width {}, using {}",
                template.name,
                template.shelf_width,
                width
            );
            template.shelf_width = width;
        }
        let id = self.templates.insert(template);
        log::debug!("Registered item template {}", id);
        id
    }

    /// Get a template
    pub fn get(&self, id: TemplateId) -> Option<&ItemTemplate> {
        self.templates.get(id)
    }

    /// Check if a template is registered
    pub fn contains(&self, id: TemplateId) -> bool {
        self.templates.contains(id)
    }

    /// Find the first template registered under a name
    pub fn find(&self, name: &str) -> Option<TemplateId> {
        self.templates
            .iter()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| id)
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate over templates in registration order
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &ItemTemplate)> {
        self.templates.iter()
    }
}

/// An immutable ordered list of templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateList {
    items: Vec<TemplateId>,
}

impl TemplateList {
    /// Create a list
    pub fn new(items: impl IntoIterator<Item = TemplateId>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Check membership by identity
    pub fn contains(&self, template: TemplateId) -> bool {
        self.items.contains(&template)
    }

    /// Template at a position
    pub fn get(&self, index: usize) -> Option<TemplateId> {
        self.items.get(index).copied()
    }

    /// Length of the list
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in order
    pub fn iter(&self) -> impl Iterator<Item = TemplateId> + '_ {
        self.items.iter().copied()
    }
}

impl FromIterator<TemplateId> for TemplateList {
    fn from_iter<I: IntoIterator<Item = TemplateId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Shelf width that keeps the shelf arithmetic sound
fn usable_width(width: f32) -> f32 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_template() {
        let shovel = ItemTemplate::new("Shovel")
            .with_description("Digs things up")
            .with_price(40)
            .with_shelf_width(12.0)
            .with_tag("shovel");

        assert_eq!(shovel.name, "Shovel");
        assert_eq!(shovel.price, 40);
        assert!(shovel.has_tag("shovel"));
        assert!(!shovel.has_tag("fruit"));
    }

    #[test]
    fn test_negative_width_clamps() {
        let t = ItemTemplate::new("Ghost").with_shelf_width(-3.0);
        assert_eq!(t.shelf_width, 0.0);
    }

    #[test]
    fn test_catalog_identity() {
        let mut catalog = Catalog::new();
        let a = catalog.register(ItemTemplate::new("Apple"));
        let b = catalog.register(ItemTemplate::new("Apple"));

        // Same fields, different kinds
        assert_ne!(a, b);
        assert_eq!(catalog.find("Apple"), Some(a));
        assert_eq!(catalog.find("Pear"), None);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(b));
    }

    #[test]
    fn test_template_list() {
        let mut catalog = Catalog::new();
        let a = catalog.register(ItemTemplate::new("Apple"));
        let b = catalog.register(ItemTemplate::new("Banana"));
        let c = catalog.register(ItemTemplate::new("Cherry"));

        let list: TemplateList = [a, b].into_iter().collect();
        assert!(list.contains(a));
        assert!(list.contains(b));
        assert!(!list.contains(c));
        assert_eq!(list.get(1), Some(b));
        assert_eq!(list.get(2), None);
        assert!(TemplateList::default().is_empty());
    }

    #[test]
    fn test_template_from_json() {
        let json = r#"{ "name": "Melon", "price": 8, "shelf_width": 30.0 }"#;
        let t: ItemTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(t.name, "Melon");
        assert_eq!(t.price, 8);
        assert!(t.description.is_empty());
        assert!(t.tags.is_empty());
    }

    #[test]
    fn test_register_clamps_loaded_width() {
        let json = r#"{ "name": "Ghost", "shelf_width": -50.0 }"#;
        let t: ItemTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(t.shelf_width, -50.0);

        let mut catalog = Catalog::new();
        let ghost = catalog.register(t);
        assert_eq!(catalog.get(ghost).unwrap().shelf_width, 0.0);

        let mut wide = ItemTemplate::new("Wide");
        wide.shelf_width = f32::INFINITY;
        let wide = catalog.register(wide);
        assert_eq!(catalog.get(wide).unwrap().shelf_width, 0.0);

        let mut blank = ItemTemplate::new("Blank");
        blank.shelf_width = f32::NAN;
        let blank = catalog.register(blank);
        assert_eq!(catalog.get(blank).unwrap().shelf_width, 0.0);

        let melon = catalog.register(ItemTemplate::new("Melon").with_shelf_width(30.0));
        assert_eq!(catalog.get(melon).unwrap().shelf_width, 30.0);
    }
}
