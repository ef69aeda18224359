//! Inventory errors

use crate::item::TemplateId;
use thiserror::Error;

/// Errors reported by inventory operations
///
/// Success is `Ok(())`; there is no "no error" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum InventoryError {
    /// Internal consistency violation (ownership ledger and slots disagree,
    /// or an inventory id that was never created)
    #[error("inventory state is inconsistent")]
    Unknown,
    /// No free slot, or the physical space budget would be exceeded
    #[error("not enough space in the inventory")]
    OutOfSpace,
    /// Slot index outside `[0, capacity)`
    #[error("slot index is out of bounds")]
    OutOfBounds,
    /// Stale item handle, or the inventory's filters reject the item
    #[error("item is not accepted by the inventory")]
    InvalidItem,
    /// Item is already at the requested place
    #[error("item is already in the inventory")]
    AlreadyExists,
    /// Target slot holds a different item that cannot be swapped out
    #[error("slot is occupied by another item")]
    Occupied,
}

impl InventoryError {
    /// Classify how a collaborator should surface this error
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidItem | Self::OutOfSpace | Self::AlreadyExists | Self::Occupied => {
                ErrorSeverity::Feedback
            }
            Self::Unknown | Self::OutOfBounds => ErrorSeverity::Internal,
        }
    }

    /// Stable snake_case name, handy for message lookup keys
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::OutOfSpace => "out_of_space",
            Self::OutOfBounds => "out_of_bounds",
            Self::InvalidItem => "invalid_item",
            Self::AlreadyExists => "already_exists",
            Self::Occupied => "occupied",
        }
    }
}

/// How an [`InventoryError`] should be handled by a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Ordinary rejection: show the player a transient message
    Feedback,
    /// Programming error: log it, never show it to the player
    Internal,
}

impl ErrorSeverity {
    /// Returns true if the player should be told about it
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::Feedback)
    }
}

/// Invalid inventory configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Capacity must be positive
    #[error("inventory '{name}' must have a positive capacity")]
    ZeroCapacity { name: String },
    /// Physical space budget must be finite and positive
    #[error("inventory '{name}' has an invalid space budget: {budget}")]
    InvalidBudget { name: String, budget: f32 },
    /// Gap between items must be finite and non-negative
    #[error("inventory '{name}' has an invalid item gap: {gap}")]
    InvalidGap { name: String, gap: f32 },
    /// A matcher or filter list names a template the catalog does not know
    #[error("inventory '{name}' references unknown template {template}")]
    UnknownTemplate { name: String, template: TemplateId },
}
