//! Acceptance policies
//!
//! One inventory type covers every surface in the game; what differs is how
//! it decides whether an item fits. The policy is picked at construction and
//! never changes.

use serde::{Deserialize, Serialize};

/// How an inventory decides whether an item fits
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AcceptancePolicy {
    /// Fits while a slot is free. Slots are addressable by index.
    #[default]
    Slots,
    /// Fits while a slot is free and the summed shelf widths stay within
    /// budget. Not index-addressable: `set` places at the lowest free slot.
    PhysicalSpace(PhysicalSpace),
    /// Accepts an item only to destroy it (trash cans). Never holds items.
    Disposal,
}

impl AcceptancePolicy {
    /// Shelf policy with the given budget and gap
    pub fn physical_space(budget: f32, gap: f32) -> Self {
        Self::PhysicalSpace(PhysicalSpace { budget, gap })
    }

    /// Whether callers may choose the slot an item lands in
    pub fn is_index_addressable(&self) -> bool {
        matches!(self, Self::Slots)
    }
}

/// Physical width budget of a shelf
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSpace {
    /// Total usable width
    pub budget: f32,
    /// Width kept free between neighbouring items
    pub gap: f32,
}

impl PhysicalSpace {
    /// Width needed to hold `existing` plus `candidate`: the candidate's
    /// width, plus each existing width and one gap per existing item.
    pub fn required<I>(&self, existing: I, candidate: f32) -> f32
    where
        I: IntoIterator<Item = f32>,
    {
        existing
            .into_iter()
            .fold(candidate, |needed, width| needed + self.gap + width)
    }

    /// Whether `candidate` fits next to `existing`. A total exactly equal to
    /// the budget fits.
    pub fn fits<I>(&self, existing: I, candidate: f32) -> bool
    where
        I: IntoIterator<Item = f32>,
    {
        self.required(existing, candidate) <= self.budget
    }
}

impl Default for PhysicalSpace {
    fn default() -> Self {
        Self {
            budget: 400.0,
            gap: 1.0,
        }
    }
}
