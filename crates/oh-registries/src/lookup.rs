//! Entity references and the lookup seam used by trigger validation
//!
//! Callers may name an entity or hand over an entry they already hold.
//! Both forms are resolved to a single [`EntityHandle`] before any
//! validation logic looks at them.

use std::fmt;
use std::sync::Arc;

use crate::error::RegistryResult;
use crate::item_registry::ItemEntry;
use crate::thing_registry::{split_channel_uid, ChannelEntry, ThingEntry};

/// Which registry an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Item,
    Thing,
    Channel,
}

impl EntityKind {
    /// Name of the registry that owns this kind
    pub fn registry_name(&self) -> &'static str {
        match self {
            EntityKind::Item => "ItemRegistry",
            // Channels belong to things
            EntityKind::Thing | EntityKind::Channel => "ThingRegistry",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Item => f.write_str("Item"),
            EntityKind::Thing => f.write_str("Thing"),
            EntityKind::Channel => f.write_str("Channel"),
        }
    }
}

/// A resolved registry entity
#[derive(Debug, Clone, PartialEq)]
pub enum EntityHandle {
    Item(Arc<ItemEntry>),
    Thing(Arc<ThingEntry>),
    Channel {
        thing: Arc<ThingEntry>,
        channel: ChannelEntry,
    },
}

impl EntityHandle {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityHandle::Item(_) => EntityKind::Item,
            EntityHandle::Thing(_) => EntityKind::Thing,
            EntityHandle::Channel { .. } => EntityKind::Channel,
        }
    }

    /// Registry name or uid
    pub fn name(&self) -> String {
        match self {
            EntityHandle::Item(item) => item.name.clone(),
            EntityHandle::Thing(thing) => thing.uid.clone(),
            EntityHandle::Channel { thing, channel } => thing.channel_uid(channel),
        }
    }

    pub fn as_item(&self) -> Option<&Arc<ItemEntry>> {
        match self {
            EntityHandle::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_thing(&self) -> Option<&Arc<ThingEntry>> {
        match self {
            EntityHandle::Thing(thing) => Some(thing),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<(&Arc<ThingEntry>, &ChannelEntry)> {
        match self {
            EntityHandle::Channel { thing, channel } => Some((thing, channel)),
            _ => None,
        }
    }
}

/// Either a name to look up or an entity already resolved
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRef {
    ByName(String),
    ByHandle(EntityHandle),
}

impl EntityRef {
    /// The name this reference stands for
    pub fn name(&self) -> String {
        match self {
            EntityRef::ByName(name) => name.clone(),
            EntityRef::ByHandle(handle) => handle.name(),
        }
    }
}

impl From<&str> for EntityRef {
    fn from(name: &str) -> Self {
        EntityRef::ByName(name.to_string())
    }
}

impl From<String> for EntityRef {
    fn from(name: String) -> Self {
        EntityRef::ByName(name)
    }
}

impl From<EntityHandle> for EntityRef {
    fn from(handle: EntityHandle) -> Self {
        EntityRef::ByHandle(handle)
    }
}

impl From<Arc<ItemEntry>> for EntityRef {
    fn from(item: Arc<ItemEntry>) -> Self {
        EntityRef::ByHandle(EntityHandle::Item(item))
    }
}

impl From<Arc<ThingEntry>> for EntityRef {
    fn from(thing: Arc<ThingEntry>) -> Self {
        EntityRef::ByHandle(EntityHandle::Thing(thing))
    }
}

/// Read access to the entity registries
///
/// Implemented by [`crate::Registries`]; hosts with their own registries
/// implement the four lookups and get [`EntityLookup::resolve`] for free.
pub trait EntityLookup: Send + Sync {
    /// Look up an item by name
    fn item(&self, name: &str) -> RegistryResult<Option<Arc<ItemEntry>>>;

    /// Look up a thing by uid
    fn thing(&self, uid: &str) -> RegistryResult<Option<Arc<ThingEntry>>>;

    /// Direct members of a group
    fn members(&self, group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>>;

    /// All non-group descendants of a group
    fn all_members(&self, group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>>;

    /// Resolve a reference of the given kind
    ///
    /// Handles pass through unchanged when they are of the requested kind;
    /// names are looked up. `Ok(None)` means the entity does not exist.
    fn resolve(&self, kind: EntityKind, reference: &EntityRef) -> RegistryResult<Option<EntityHandle>> {
        let name = match reference {
            EntityRef::ByHandle(handle) if handle.kind() == kind => return Ok(Some(handle.clone())),
            EntityRef::ByHandle(handle) => handle.name(),
            EntityRef::ByName(name) => name.clone(),
        };

        let handle = match kind {
            EntityKind::Item => self.item(&name)?.map(EntityHandle::Item),
            EntityKind::Thing => self.thing(&name)?.map(EntityHandle::Thing),
            EntityKind::Channel => match split_channel_uid(&name) {
                Some((thing_uid, channel_id)) => self.thing(thing_uid)?.and_then(|thing| {
                    let channel = thing.channel(channel_id).cloned()?;
                    Some(EntityHandle::Channel { thing, channel })
                }),
                None => None,
            },
        };
        Ok(handle)
    }
}
