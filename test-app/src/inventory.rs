//! Collections and arrays as builder fields.

use std::collections::{BTreeMap, BTreeSet};

/// Assorted containers.
#[derive(Debug, Clone, PartialEq, Eq, buildergen::Builder)]
pub struct Inventory {
    /// Distinct item names.
    pub names:   BTreeSet<String>,
    /// Count per item.
    pub counts:  BTreeMap<String, u32>,
    /// Shelf corners.
    pub corners: [i32; 4],
    /// Where the inventory is kept.
    pub label:   Option<String>,
}
