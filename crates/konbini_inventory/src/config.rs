//! Inventory construction config

use crate::error::ConfigError;
use crate::item::Catalog;
use crate::matcher::{ItemFilter, Matcher};
use crate::policy::AcceptancePolicy;
use serde::{Deserialize, Serialize};

/// Everything needed to create an inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Name used in logs
    pub name: String,
    /// Number of slots, fixed for the inventory's lifetime
    pub capacity: usize,
    /// Acceptance predicate (none = accept everything)
    pub matcher: Option<Matcher>,
    /// Legacy whitelist/blacklist pair, combined with `matcher` when both
    /// are set
    pub filter: Option<ItemFilter>,
    /// How items are fitted
    pub policy: AcceptancePolicy,
}

impl InventoryConfig {
    /// Slot inventory with the given capacity
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            matcher: None,
            filter: None,
            policy: AcceptancePolicy::Slots,
        }
    }

    /// Shelf limited by physical width as well as slots
    pub fn shelf(name: impl Into<String>, capacity: usize, budget: f32, gap: f32) -> Self {
        Self::new(name, capacity).with_policy(AcceptancePolicy::physical_space(budget, gap))
    }

    /// Single-use container that destroys what it accepts
    pub fn disposal(name: impl Into<String>) -> Self {
        Self::new(name, 1).with_policy(AcceptancePolicy::Disposal)
    }

    /// Set the acceptance predicate
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Set the legacy filter lists
    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the policy
    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The predicate the inventory will evaluate, folding the legacy filter
    /// into the matcher
    pub fn acceptance(&self) -> Option<Matcher> {
        match (&self.matcher, &self.filter) {
            (Some(matcher), Some(filter)) => {
                Some(Matcher::and([matcher.clone(), filter.to_matcher()]))
            }
            (Some(matcher), None) => Some(matcher.clone()),
            (None, Some(filter)) => Some(filter.to_matcher()),
            (None, None) => None,
        }
    }

    /// Check the config against the catalog its matchers refer to
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: self.name.clone(),
            });
        }

        if let AcceptancePolicy::PhysicalSpace(space) = self.policy {
            if !space.budget.is_finite() || space.budget <= 0.0 {
                return Err(ConfigError::InvalidBudget {
                    name: self.name.clone(),
                    budget: space.budget,
                });
            }
            if !space.gap.is_finite() || space.gap < 0.0 {
                return Err(ConfigError::InvalidGap {
                    name: self.name.clone(),
                    gap: space.gap,
                });
            }
        }

        if let Some(matcher) = self.acceptance() {
            if let Some(template) = matcher.templates().into_iter().find(|t| !catalog.contains(*t)) {
                return Err(ConfigError::UnknownTemplate {
                    name: self.name.clone(),
                    template,
                });
            }
        }

        Ok(())
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self::new("inventory", 10)
    }
}
