//! Thing Registry
//!
//! Tracks things by uid together with the channels they provide. Channels
//! are addressed as `<thing uid>:<channel id>`.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use oh_core::{ChannelKind, ThingStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};

const KIND: &str = "Thing";

/// A channel provided by a thing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Channel id, unique within its thing (e.g., "eclipse#event")
    pub id: String,

    /// State or trigger channel
    #[serde(default)]
    pub kind: ChannelKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ChannelEntry {
    pub fn new(id: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
        }
    }

    /// Trigger channel shorthand
    pub fn trigger(id: impl Into<String>) -> Self {
        Self::new(id, ChannelKind::Trigger)
    }

    /// State channel shorthand
    pub fn state(id: impl Into<String>) -> Self {
        Self::new(id, ChannelKind::State)
    }
}

/// A registered thing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingEntry {
    /// Thing uid (`binding:type:id`, optionally with bridge segments)
    pub uid: String,

    /// Current status
    #[serde(default)]
    pub status: ThingStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Channels in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelEntry>,
}

impl ThingEntry {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            status: ThingStatus::default(),
            label: None,
            channels: Vec::new(),
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: ThingStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a channel
    pub fn with_channel(mut self, channel: ChannelEntry) -> Self {
        self.channels.push(channel);
        self
    }

    /// Find a channel by id
    pub fn channel(&self, id: &str) -> Option<&ChannelEntry> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Full channel uid for one of this thing's channels
    pub fn channel_uid(&self, channel: &ChannelEntry) -> String {
        format!("{}:{}", self.uid, channel.id)
    }

    fn check(&self) -> RegistryResult<()> {
        let invalid = |reason: String| RegistryError::Invalid {
            kind: KIND,
            name: self.uid.clone(),
            reason,
        };

        if self.uid.split(':').count() < 3 || self.uid.split(':').any(str::is_empty) {
            return Err(invalid(
                "uids have at least three non-empty segments (binding:type:id)".to_string(),
            ));
        }
        for (i, channel) in self.channels.iter().enumerate() {
            if channel.id.is_empty() || channel.id.contains(':') {
                return Err(invalid(format!("invalid channel id '{}'", channel.id)));
            }
            if self.channels[..i].iter().any(|c| c.id == channel.id) {
                return Err(invalid(format!("duplicate channel id '{}'", channel.id)));
            }
        }
        Ok(())
    }
}

/// Split a channel uid into thing uid and channel id
///
/// The thing uid is every segment except the last.
pub fn split_channel_uid(channel_uid: &str) -> Option<(&str, &str)> {
    let (thing, channel) = channel_uid.rsplit_once(':')?;
    if thing.is_empty() || channel.is_empty() {
        return None;
    }
    Some((thing, channel))
}

/// Thing registry keyed by uid
#[derive(Debug)]
pub struct ThingRegistry {
    by_uid: RwLock<IndexMap<String, Arc<ThingEntry>>>,
}

impl ThingRegistry {
    /// Create an empty thing registry
    pub fn new() -> Self {
        Self {
            by_uid: RwLock::new(IndexMap::new()),
        }
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, IndexMap<String, Arc<ThingEntry>>>> {
        self.by_uid
            .read()
            .map_err(|_| RegistryError::Poisoned("thing"))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, IndexMap<String, Arc<ThingEntry>>>> {
        self.by_uid
            .write()
            .map_err(|_| RegistryError::Poisoned("thing"))
    }

    /// Register a new thing
    pub fn add(&self, entry: ThingEntry) -> RegistryResult<Arc<ThingEntry>> {
        entry.check()?;

        let mut things = self.write()?;
        if things.contains_key(&entry.uid) {
            return Err(RegistryError::Duplicate {
                kind: KIND,
                name: entry.uid,
            });
        }

        let entry = Arc::new(entry);
        things.insert(entry.uid.clone(), Arc::clone(&entry));
        info!(
            "Registered thing: {} ({} channels)",
            entry.uid,
            entry.channels.len()
        );
        Ok(entry)
    }

    /// Get a thing by uid
    pub fn get(&self, uid: &str) -> RegistryResult<Option<Arc<ThingEntry>>> {
        Ok(self.read()?.get(uid).cloned())
    }

    /// Update a thing in place; the uid cannot change
    pub fn update<F>(&self, uid: &str, f: F) -> RegistryResult<Arc<ThingEntry>>
    where
        F: FnOnce(&mut ThingEntry),
    {
        let mut things = self.write()?;
        let mut entry = things
            .get(uid)
            .map(|current| (**current).clone())
            .ok_or_else(|| RegistryError::NotFound {
                kind: KIND,
                name: uid.to_string(),
            })?;

        f(&mut entry);
        if entry.uid != uid {
            return Err(RegistryError::Invalid {
                kind: KIND,
                name: uid.to_string(),
                reason: format!("cannot change uid to '{}'", entry.uid),
            });
        }
        entry.check()?;

        let entry = Arc::new(entry);
        things.insert(uid.to_string(), Arc::clone(&entry));
        debug!("Updated thing: {}", uid);
        Ok(entry)
    }

    /// Set a thing's status
    pub fn set_status(&self, uid: &str, status: ThingStatus) -> RegistryResult<Arc<ThingEntry>> {
        self.update(uid, |thing| thing.status = status)
    }

    /// Remove a thing
    pub fn remove(&self, uid: &str) -> RegistryResult<Option<Arc<ThingEntry>>> {
        let removed = self.write()?.shift_remove(uid);
        if removed.is_some() {
            info!("Removed thing: {}", uid);
        }
        Ok(removed)
    }

    /// Resolve a channel uid to its thing and channel
    pub fn get_channel(
        &self,
        channel_uid: &str,
    ) -> RegistryResult<Option<(Arc<ThingEntry>, ChannelEntry)>> {
        let Some((thing_uid, channel_id)) = split_channel_uid(channel_uid) else {
            return Ok(None);
        };
        Ok(self.get(thing_uid)?.and_then(|thing| {
            let channel = thing.channel(channel_id).cloned()?;
            Some((thing, channel))
        }))
    }

    /// All things (preserves insertion order)
    pub fn iter(&self) -> RegistryResult<Vec<Arc<ThingEntry>>> {
        Ok(self.read()?.values().cloned().collect())
    }

    /// Number of registered things
    pub fn len(&self) -> usize {
        self.by_uid.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ThingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn astro() -> ThingEntry {
        ThingEntry::new("astro:sun:local")
            .with_status(ThingStatus::Online)
            .with_channel(ChannelEntry::trigger("rise#event"))
            .with_channel(ChannelEntry::state("eclipse#event"))
    }

    #[test]
    fn test_split_channel_uid() {
        assert_eq!(
            split_channel_uid("astro:sun:local:rise#event"),
            Some(("astro:sun:local", "rise#event"))
        );
        assert_eq!(split_channel_uid("nochannel"), None);
        assert_eq!(split_channel_uid("astro:sun:local:"), None);
    }

    #[test]
    fn test_add_and_get_channel() {
        let registry = ThingRegistry::new();
        registry.add(astro()).unwrap();

        let (thing, channel) = registry
            .get_channel("astro:sun:local:rise#event")
            .unwrap()
            .unwrap();
        assert_eq!(thing.uid, "astro:sun:local");
        assert_eq!(channel.kind, ChannelKind::Trigger);
        assert_eq!(thing.channel_uid(&channel), "astro:sun:local:rise#event");

        assert!(registry
            .get_channel("astro:sun:local:set#event")
            .unwrap()
            .is_none());
        assert!(registry
            .get_channel("astro:moon:local:rise#event")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_invalid_things_rejected() {
        let registry = ThingRegistry::new();
        assert!(registry.add(ThingEntry::new("astro:sun")).is_err());
        assert!(registry
            .add(
                ThingEntry::new("astro:sun:home")
                    .with_channel(ChannelEntry::state("a"))
                    .with_channel(ChannelEntry::trigger("a"))
            )
            .is_err());
        registry.add(astro()).unwrap();
        assert!(matches!(
            registry.add(astro()).unwrap_err(),
            RegistryError::Duplicate { .. }
        ));
    }

    #[test]
    fn test_set_status_and_remove() {
        let registry = ThingRegistry::new();
        registry.add(astro()).unwrap();
        let thing = registry
            .set_status("astro:sun:local", ThingStatus::Offline)
            .unwrap();
        assert_eq!(thing.status, ThingStatus::Offline);
        assert!(registry.set_status("kodi:kodi:x", ThingStatus::Online).is_err());

        assert!(registry.remove("astro:sun:local").unwrap().is_some());
        assert!(registry.is_empty());
    }
}
