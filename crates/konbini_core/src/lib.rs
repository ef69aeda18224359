//! # konbini_core - Handle primitives
//!
//! Generational handles used to name items, templates and inventories
//! without holding references into the storage that owns them. A handle
//! whose slot has been freed goes stale and is rejected by every lookup.

pub mod handle;

pub use handle::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::handle::{Handle, HandleMap};
}
