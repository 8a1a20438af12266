//! Locations reached by game actions other than catches: shop stock that
//! stands in for a randomized item, and Oak item milestones.

use serde::{Deserialize, Serialize};

use crate::host::Unlock;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopKind {
    KeyItem,
    OakItem,
}

/// One shop entry. With a `location` the purchase reports that location
/// instead of handing over the item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub kind: ShopKind,
    pub name: String,
    #[serde(default)]
    pub location: Option<i64>,
}

impl Purchase {
    pub fn key_item(name: impl Into<String>, location: Option<i64>) -> Self {
        Self {
            kind: ShopKind::KeyItem,
            name: name.into(),
            location,
        }
    }

    pub fn oak_item(name: impl Into<String>, location: Option<i64>) -> Self {
        Self {
            kind: ShopKind::OakItem,
            name: name.into(),
            location,
        }
    }

    /// What the purchase grants when it has no location.
    pub fn unlock(&self) -> Unlock<'_> {
        match self.kind {
            ShopKind::KeyItem => Unlock::KeyItem(&self.name),
            ShopKind::OakItem => Unlock::OakItem(&self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OakItemLocations {
    pub name: String,
    /// Unique catches needed before the unlock location is reached.
    pub unlock_req: usize,
    #[serde(default)]
    pub unlock: Option<i64>,
    /// Location for each level, level 1 first.
    #[serde(default)]
    pub levels: Vec<i64>,
}

impl OakItemLocations {
    pub fn unlock_location(&self, caught: usize) -> Option<i64> {
        self.unlock.filter(|_| caught >= self.unlock_req)
    }

    pub fn level_location(&self, level: u32) -> Option<i64> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        self.levels.get(index).copied()
    }
}
