//! openHAB entity registries
//!
//! This crate provides the registries consulted while validating rule
//! triggers:
//! - Items (ItemRegistry), with group membership and recursive descendants
//! - Things (ThingRegistry), each owning its channels
//!
//! [`Registries`] bundles both and implements [`EntityLookup`], the read
//! seam the trigger parser is written against. A [`RegistrySnapshot`] is the
//! serializable form used to seed registries from configuration.

pub mod error;
pub mod item_registry;
pub mod lookup;
pub mod thing_registry;

pub use error::{RegistryError, RegistryResult};
pub use item_registry::{ItemEntry, ItemRegistry};
pub use lookup::{EntityHandle, EntityKind, EntityLookup, EntityRef};
pub use thing_registry::{split_channel_uid, ChannelEntry, ThingEntry, ThingRegistry};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Serializable contents of all registries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub items: Vec<ItemEntry>,
    #[serde(default)]
    pub things: Vec<ThingEntry>,
}

/// All registries bundled together
#[derive(Debug, Default)]
pub struct Registries {
    pub items: ItemRegistry,
    pub things: ThingRegistry,
}

impl Registries {
    /// Create empty registries
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registries seeded from a snapshot
    ///
    /// Groups may be declared after their members.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> RegistryResult<Self> {
        let registries = Self::new();
        for item in snapshot.items {
            registries.items.add(item)?;
        }
        for thing in snapshot.things {
            registries.things.add(thing)?;
        }
        info!(
            "Loaded {} items and {} things",
            registries.items.len(),
            registries.things.len()
        );
        Ok(registries)
    }

    /// Capture the current contents
    pub fn snapshot(&self) -> RegistryResult<RegistrySnapshot> {
        Ok(RegistrySnapshot {
            items: self.items.iter()?.iter().map(|i| (**i).clone()).collect(),
            things: self.things.iter()?.iter().map(|t| (**t).clone()).collect(),
        })
    }
}

impl EntityLookup for Registries {
    fn item(&self, name: &str) -> RegistryResult<Option<Arc<ItemEntry>>> {
        self.items.get(name)
    }

    fn thing(&self, uid: &str) -> RegistryResult<Option<Arc<ThingEntry>>> {
        self.things.get(uid)
    }

    fn members(&self, group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>> {
        self.items.members(group)
    }

    fn all_members(&self, group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>> {
        self.items.all_members(group)
    }
}
