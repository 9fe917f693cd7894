//! Item Registry
//!
//! Tracks items with their declared type and group memberships, with an
//! index from group name to direct members for group fan-out.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use oh_core::{DataType, ItemType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};

const KIND: &str = "Item";

/// A registered item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    /// Unique item name (e.g., "gMotion_Sensors")
    pub name: String,

    /// Declared item type
    #[serde(rename = "type")]
    pub item_type: ItemType,

    /// Base type of a group item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<ItemType>,

    /// Names of the groups this item is a direct member of
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Free-form tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ItemEntry {
    /// Create a new item entry with no groups
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            item_type,
            base_type: None,
            groups: Vec::new(),
            label: None,
            tags: Vec::new(),
        }
    }

    /// Create a group item, optionally with a base type
    pub fn group(name: impl Into<String>, base_type: Option<ItemType>) -> Self {
        let mut entry = Self::new(name, ItemType::Group);
        entry.base_type = base_type;
        entry
    }

    /// Add a group membership
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_group(&self) -> bool {
        self.item_type == ItemType::Group
    }

    /// The type whose vocabulary applies to states and commands
    fn effective_type(&self) -> ItemType {
        match (self.item_type, self.base_type) {
            (ItemType::Group, Some(base)) => base,
            (item_type, _) => item_type,
        }
    }

    /// Data types accepted as states
    pub fn accepted_data_types(&self) -> &'static [DataType] {
        self.effective_type().accepted_data_types()
    }

    /// Data types accepted as commands
    pub fn accepted_command_types(&self) -> &'static [DataType] {
        self.effective_type().accepted_command_types()
    }

    fn check(&self) -> RegistryResult<()> {
        let invalid = |reason: &str| RegistryError::Invalid {
            kind: KIND,
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(invalid("names may only contain letters, digits and '_'"));
        }
        if self.base_type.is_some() && !self.is_group() {
            return Err(invalid("only groups have a base type"));
        }
        if self.base_type == Some(ItemType::Group) {
            return Err(invalid("a group cannot be the base type of a group"));
        }
        if self.groups.iter().any(|g| g == &self.name) {
            return Err(invalid("an item cannot be a member of itself"));
        }
        Ok(())
    }
}

/// Item registry with a group membership index
///
/// Entries are stored as `Arc<ItemEntry>` to avoid cloning on reads and keep
/// insertion order, so group fan-out is deterministic.
#[derive(Debug)]
pub struct ItemRegistry {
    /// Primary index: name -> ItemEntry
    by_name: RwLock<IndexMap<String, Arc<ItemEntry>>>,

    /// Index: group name -> names of direct members
    by_group: DashMap<String, IndexSet<String>>,
}

impl ItemRegistry {
    /// Create an empty item registry
    pub fn new() -> Self {
        Self {
            by_name: RwLock::new(IndexMap::new()),
            by_group: DashMap::new(),
        }
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, IndexMap<String, Arc<ItemEntry>>>> {
        self.by_name
            .read()
            .map_err(|_| RegistryError::Poisoned("item"))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, IndexMap<String, Arc<ItemEntry>>>> {
        self.by_name
            .write()
            .map_err(|_| RegistryError::Poisoned("item"))
    }

    fn index_groups(&self, entry: &ItemEntry) {
        for group in &entry.groups {
            self.by_group
                .entry(group.clone())
                .or_default()
                .insert(entry.name.clone());
        }
    }

    fn unindex_groups(&self, entry: &ItemEntry) {
        for group in &entry.groups {
            if let Some(mut members) = self.by_group.get_mut(group) {
                members.shift_remove(&entry.name);
            }
        }
    }

    /// Register a new item
    pub fn add(&self, entry: ItemEntry) -> RegistryResult<Arc<ItemEntry>> {
        entry.check()?;

        let mut items = self.write()?;
        if items.contains_key(&entry.name) {
            return Err(RegistryError::Duplicate {
                kind: KIND,
                name: entry.name,
            });
        }

        let entry = Arc::new(entry);
        self.index_groups(&entry);
        items.insert(entry.name.clone(), Arc::clone(&entry));

        info!("Registered item: {} ({})", entry.name, entry.item_type);
        Ok(entry)
    }

    /// Get an item by name
    pub fn get(&self, name: &str) -> RegistryResult<Option<Arc<ItemEntry>>> {
        Ok(self.read()?.get(name).cloned())
    }

    /// Update an item in place
    ///
    /// The closure receives a clone of the entry; the name cannot change.
    pub fn update<F>(&self, name: &str, f: F) -> RegistryResult<Arc<ItemEntry>>
    where
        F: FnOnce(&mut ItemEntry),
    {
        let mut items = self.write()?;
        let current = items.get(name).cloned().ok_or_else(|| RegistryError::NotFound {
            kind: KIND,
            name: name.to_string(),
        })?;

        let mut entry = (*current).clone();
        f(&mut entry);
        if entry.name != name {
            return Err(RegistryError::Invalid {
                kind: KIND,
                name: name.to_string(),
                reason: format!("cannot rename to '{}'", entry.name),
            });
        }
        entry.check()?;

        self.unindex_groups(&current);
        let entry = Arc::new(entry);
        self.index_groups(&entry);
        items.insert(name.to_string(), Arc::clone(&entry));

        debug!("Updated item: {}", name);
        Ok(entry)
    }

    /// Remove an item
    pub fn remove(&self, name: &str) -> RegistryResult<Option<Arc<ItemEntry>>> {
        let removed = self.write()?.shift_remove(name);
        if let Some(ref entry) = removed {
            self.unindex_groups(entry);
            info!("Removed item: {}", name);
        }
        Ok(removed)
    }

    /// Direct members of a group, in registration order
    pub fn members(&self, group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>> {
        let names: Vec<String> = self
            .by_group
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();

        let items = self.read()?;
        Ok(names.iter().filter_map(|n| items.get(n).cloned()).collect())
    }

    /// All non-group items below a group, recursively and without duplicates
    pub fn all_members(&self, group: &str) -> RegistryResult<Vec<Arc<ItemEntry>>> {
        let mut visited = HashSet::from([group.to_string()]);
        let mut leaves: IndexMap<String, Arc<ItemEntry>> = IndexMap::new();
        let mut pending = vec![group.to_string()];

        while let Some(current) = pending.pop() {
            let mut subgroups = Vec::new();
            for member in self.members(&current)? {
                if member.is_group() {
                    if visited.insert(member.name.clone()) {
                        subgroups.push(member.name.clone());
                    }
                } else {
                    leaves.entry(member.name.clone()).or_insert(member);
                }
            }
            // A group's own members come before those of its subgroups
            pending.extend(subgroups.into_iter().rev());
        }

        Ok(leaves.into_values().collect())
    }

    /// All item names (preserves insertion order)
    pub fn names(&self) -> RegistryResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    /// All items (preserves insertion order)
    pub fn iter(&self) -> RegistryResult<Vec<Arc<ItemEntry>>> {
        Ok(self.read()?.values().cloned().collect())
    }

    /// Number of registered items
    pub fn len(&self) -> usize {
        // A poisoned lock still holds a valid map
        self.by_name.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemRegistry {
        let registry = ItemRegistry::new();
        registry
            .add(ItemEntry::group("gHouse", None))
            .unwrap();
        registry
            .add(ItemEntry::group("gUpstairs", Some(ItemType::Switch)).in_group("gHouse"))
            .unwrap();
        registry
            .add(ItemEntry::new("Hall_Light", ItemType::Switch).in_group("gHouse"))
            .unwrap();
        registry
            .add(ItemEntry::new("Bedroom_Light", ItemType::Switch).in_group("gUpstairs"))
            .unwrap();
        registry
            .add(
                ItemEntry::new("Landing_Light", ItemType::Switch)
                    .in_group("gUpstairs")
                    .in_group("gHouse"),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_add_and_get() {
        let registry = sample();
        assert_eq!(registry.len(), 5);
        let item = registry.get("Hall_Light").unwrap().unwrap();
        assert_eq!(item.item_type, ItemType::Switch);
        assert!(registry.get("Missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = sample();
        let err = registry
            .add(ItemEntry::new("Hall_Light", ItemType::Dimmer))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let registry = ItemRegistry::new();
        assert!(registry.add(ItemEntry::new("bad name", ItemType::Switch)).is_err());
        let mut entry = ItemEntry::new("Lamp", ItemType::Switch);
        entry.base_type = Some(ItemType::Dimmer);
        assert!(registry.add(entry).is_err());
        assert!(registry
            .add(ItemEntry::new("Loop", ItemType::Group).in_group("Loop"))
            .is_err());
    }

    #[test]
    fn test_members() {
        let registry = sample();
        let names: Vec<String> = registry
            .members("gHouse")
            .unwrap()
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["gUpstairs", "Hall_Light", "Landing_Light"]);
    }

    #[test]
    fn test_all_members_recursive_and_deduplicated() {
        let registry = sample();
        let names: Vec<String> = registry
            .all_members("gHouse")
            .unwrap()
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["Hall_Light", "Landing_Light", "Bedroom_Light"]);
    }

    #[test]
    fn test_update_reindexes_groups() {
        let registry = sample();
        registry
            .update("Hall_Light", |item| item.groups = vec!["gUpstairs".into()])
            .unwrap();
        assert_eq!(registry.members("gHouse").unwrap().len(), 2);
        assert_eq!(registry.members("gUpstairs").unwrap().len(), 3);

        let err = registry
            .update("Hall_Light", |item| item.name = "Other".into())
            .unwrap_err();
        assert!(matches!(err, RegistryError::Invalid { .. }));
    }

    #[test]
    fn test_remove() {
        let registry = sample();
        assert!(registry.remove("Hall_Light").unwrap().is_some());
        assert!(registry.remove("Hall_Light").unwrap().is_none());
        assert_eq!(registry.members("gHouse").unwrap().len(), 2);
    }

    #[test]
    fn test_group_base_type_vocabulary() {
        let registry = sample();
        let group = registry.get("gUpstairs").unwrap().unwrap();
        assert!(DataType::parse_any(group.accepted_data_types(), "ON").is_ok());
        assert!(DataType::parse_any(group.accepted_data_types(), "OPEN").is_err());

        let untyped = registry.get("gHouse").unwrap().unwrap();
        assert!(DataType::parse_any(untyped.accepted_data_types(), "anything").is_ok());
    }

    #[test]
    fn test_poisoned_lock() {
        let registry = Arc::new(sample());
        let writer = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = writer.by_name.write().unwrap();
            panic!("writer died");
        })
        .join();

        assert!(matches!(
            registry.get("Hall_Light"),
            Err(RegistryError::Poisoned("item"))
        ));
        assert_eq!(registry.len(), 5);
        assert!(format!("{registry:?}").contains("Hall_Light"));
    }
}
