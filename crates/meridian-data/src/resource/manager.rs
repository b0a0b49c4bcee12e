// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{Resource, ResourceFactory, ResourceHandler, ResourceId};
use crate::error::{ResourceError, ResourceResult};
use crate::settings::ResourceSettings;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};

static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

/// The shared allocation of one resource.
///
/// The manager entry holds the only strong reference; handlers hold weak
/// ones and never upgrade them beyond a single method call.
pub(crate) struct Stored<T> {
    pub(crate) name: RwLock<String>,
    pub(crate) value: T,
}

impl<T> Stored<T> {
    pub(crate) fn name(&self) -> String {
        self.name.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

struct Entry<T> {
    name: String,
    resource: Arc<Stored<T>>,
    protected: bool,
}

struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// The exclusive owner of every resource of type `T` it has created.
///
/// Names are unique within a manager: [`get_by_name`](Self::get_by_name)
/// returns the existing resource or creates it through the factory.
/// Consumers observe resources through [`ResourceHandler`]s; the number of
/// live handlers decides whether a resource is "unused".
///
/// Unused resources are reclaimed lazily: they stay loaded until a sweep runs,
/// either explicitly through [`remove_unused`](Self::remove_unused) or
/// periodically through [`tick`](Self::tick), and only while unload-unused is
/// enabled.
///
/// Dropping the manager destroys every resource it owns; every outstanding
/// handler then reports "no resource".
pub struct ResourceManager<T: Resource> {
    owner: u32,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    by_name: HashMap<String, ResourceId>,
    factory: Box<dyn ResourceFactory<T>>,
    standard: Option<ResourceId>,
    unload_unused: bool,
    sweep_interval: Duration,
    last_sweep: Instant,
}

impl<T: Resource> ResourceManager<T> {
    /// Creates an empty manager with default settings.
    pub fn new(factory: impl ResourceFactory<T> + 'static) -> Self {
        Self::with_settings(factory, &ResourceSettings::default())
    }

    /// Creates an empty manager configured by `settings`.
    pub fn with_settings(
        factory: impl ResourceFactory<T> + 'static,
        settings: &ResourceSettings,
    ) -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            by_name: HashMap::new(),
            factory: Box::new(factory),
            standard: None,
            unload_unused: settings.unload_unused,
            sweep_interval: settings.sweep_interval(),
            last_sweep: Instant::now(),
        }
    }

    /// Applies new settings. The sweep timer is restarted.
    pub fn apply_settings(&mut self, settings: &ResourceSettings) {
        self.unload_unused = settings.unload_unused;
        self.sweep_interval = settings.sweep_interval();
        self.last_sweep = Instant::now();
    }

    /// The settings currently in effect.
    pub fn settings(&self) -> ResourceSettings {
        ResourceSettings {
            unload_unused: self.unload_unused,
            sweep_interval_ms: u64::try_from(self.sweep_interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn entry(&self, id: ResourceId) -> Option<&Entry<T>> {
        if id.owner != self.owner {
            return None;
        }
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: ResourceId) -> Option<&mut Entry<T>> {
        if id.owner != self.owner {
            return None;
        }
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    fn store(&mut self, name: String, resource: T) -> ResourceId {
        let entry = Entry {
            name: name.clone(),
            resource: Arc::new(Stored {
                name: RwLock::new(name.clone()),
                value: resource,
            }),
            protected: false,
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                ResourceId {
                    owner: self.owner,
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                ResourceId {
                    owner: self.owner,
                    index,
                    generation: 0,
                }
            }
        };
        self.by_name.insert(name, id);
        id
    }

    // --- Creation and lookup ---

    fn fetch_or_create(&mut self, name: &str) -> ResourceResult<ResourceId> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(*id);
        }
        if name.is_empty() {
            return Err(ResourceError::Creation {
                name: String::new(),
                source: anyhow::anyhow!("resource names cannot be empty"),
            });
        }

        let resource =
            self.factory
                .create_resource(name)
                .map_err(|source| ResourceError::Creation {
                    name: name.to_owned(),
                    source,
                })?;
        let id = self.store(name.to_owned(), resource);
        log::debug!(
            "Created resource '{name}' ({id}) of type {}.",
            std::any::type_name::<T>()
        );
        Ok(id)
    }

    /// Returns the resource called `name`, creating it if needed.
    ///
    /// Calling this twice with the same name returns the same instance. If
    /// the factory fails, the error is returned and nothing is cached.
    pub fn get_by_name(&mut self, name: &str) -> ResourceResult<&T> {
        let id = self.fetch_or_create(name)?;
        self.get(id).ok_or(ResourceError::StaleId(id))
    }

    /// Like [`get_by_name`](Self::get_by_name), but returns a handler attached
    /// to the resource.
    pub fn acquire(&mut self, name: &str) -> ResourceResult<ResourceHandler<T>> {
        let id = self.fetch_or_create(name)?;
        self.handler(id).ok_or(ResourceError::StaleId(id))
    }

    /// Like [`get_by_name`](Self::get_by_name), but falls back to the standard
    /// resource when creation fails.
    pub fn get_or_standard(&mut self, name: &str) -> ResourceResult<&T> {
        match self.fetch_or_create(name) {
            Ok(id) => self.get(id).ok_or(ResourceError::StaleId(id)),
            Err(err) => match self.standard {
                Some(standard) if self.entry(standard).is_some() => {
                    log::warn!("{err}; using the standard resource instead.");
                    self.get(standard).ok_or(ResourceError::StaleId(standard))
                }
                _ => Err(err),
            },
        }
    }

    /// Registers an already constructed resource under `name`.
    pub fn insert(&mut self, name: impl Into<String>, resource: T) -> ResourceResult<ResourceId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(ResourceError::DuplicateName(name));
        }
        if name.is_empty() {
            return Err(ResourceError::Creation {
                name,
                source: anyhow::anyhow!("resource names cannot be empty"),
            });
        }
        let id = self.store(name, resource);
        log::debug!("Inserted resource {id}.");
        Ok(id)
    }

    /// The resource with this id, if it is still owned by this manager.
    pub fn get(&self, id: ResourceId) -> Option<&T> {
        self.entry(id).map(|entry| &entry.resource.value)
    }

    /// The id of the resource called `name`.
    pub fn id_of(&self, name: &str) -> Option<ResourceId> {
        self.by_name.get(name).copied()
    }

    /// The name of the resource with this id.
    pub fn name_of(&self, id: ResourceId) -> Option<&str> {
        self.entry(id).map(|entry| entry.name.as_str())
    }

    /// Returns `true` if a resource called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// The number of resources.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if the manager owns no resource.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates over every resource with its id and name.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &str, &T)> {
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.entry.as_ref().map(|entry| {
                let id = ResourceId {
                    owner: self.owner,
                    index: index as u32,
                    generation: slot.generation,
                };
                (id, entry.name.as_str(), &entry.resource.value)
            })
        })
    }

    // --- Handlers ---

    /// Creates a handler attached to the resource with this id.
    pub fn handler(&self, id: ResourceId) -> Option<ResourceHandler<T>> {
        self.downgrade(id)
            .map(|weak| ResourceHandler::attached(id, weak))
    }

    pub(crate) fn downgrade(&self, id: ResourceId) -> Option<Weak<Stored<T>>> {
        self.entry(id).map(|entry| Arc::downgrade(&entry.resource))
    }

    /// The resource a handler points at, borrowed from this manager.
    ///
    /// Returns `None` if the handler is detached, its target was removed, or
    /// it belongs to another manager.
    pub fn resolve(&self, handler: &ResourceHandler<T>) -> Option<&T> {
        let (id, weak) = handler.target()?;
        let entry = self.entry(id)?;
        std::ptr::eq(Arc::as_ptr(&entry.resource), weak.as_ptr())
            .then_some(&entry.resource.value)
    }

    /// The number of live handlers attached to a resource.
    pub fn handler_count(&self, id: ResourceId) -> Option<usize> {
        self.entry(id).map(|entry| Arc::weak_count(&entry.resource))
    }

    // --- Mutation ---

    /// Gives a resource a new, unused name.
    pub fn rename(&mut self, id: ResourceId, new_name: impl Into<String>) -> ResourceResult<()> {
        let new_name = new_name.into();
        if self.by_name.get(&new_name).is_some_and(|existing| *existing != id) {
            return Err(ResourceError::DuplicateName(new_name));
        }
        let entry = self.entry_mut(id).ok_or(ResourceError::StaleId(id))?;
        *entry
            .resource
            .name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = new_name.clone();
        let old_name = std::mem::replace(&mut entry.name, new_name.clone());
        self.by_name.remove(&old_name);
        self.by_name.insert(new_name, id);
        Ok(())
    }

    /// Protects a resource from sweeps and non-forced clears.
    ///
    /// Returns `false` if the id is stale.
    pub fn set_protected(&mut self, id: ResourceId, protected: bool) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.protected = protected;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the resource is protected.
    pub fn is_protected(&self, id: ResourceId) -> bool {
        self.entry(id).is_some_and(|entry| entry.protected)
    }

    /// Makes a resource the fallback of [`get_or_standard`](Self::get_or_standard).
    ///
    /// The standard resource is never swept.
    pub fn set_standard(&mut self, id: ResourceId) -> ResourceResult<()> {
        if self.entry(id).is_none() {
            return Err(ResourceError::StaleId(id));
        }
        self.standard = Some(id);
        Ok(())
    }

    /// The standard resource, if one is set.
    pub fn standard(&self) -> Option<&T> {
        self.standard.and_then(|id| self.get(id))
    }

    /// Removes a resource. Returns `false` for stale or foreign ids.
    ///
    /// Protection does not prevent explicit removal. Attached handlers report
    /// "no resource" afterwards.
    pub fn remove(&mut self, id: ResourceId) -> bool {
        if self.entry(id).is_none() {
            return false;
        }
        let slot = &mut self.slots[id.index as usize];
        let Some(entry) = slot.entry.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.by_name.remove(&entry.name);
        if self.standard == Some(id) {
            self.standard = None;
        }
        log::debug!("Removed resource '{}' ({id}).", entry.name);
        true
    }

    /// Removes every resource, sparing protected ones unless `include_protected`.
    ///
    /// Returns the number of resources removed.
    pub fn clear(&mut self, include_protected: bool) -> usize {
        let doomed: Vec<ResourceId> = self
            .iter()
            .filter(|(id, _, _)| include_protected || !self.is_protected(*id))
            .map(|(id, _, _)| id)
            .collect();
        doomed.into_iter().filter(|id| self.remove(*id)).count()
    }

    // --- Unload-unused ---

    /// Enables or disables reclaiming of resources without handlers.
    pub fn set_unload_unused(&mut self, enabled: bool) {
        self.unload_unused = enabled;
    }

    /// Whether unused resources are reclaimed.
    pub fn unload_unused(&self) -> bool {
        self.unload_unused
    }

    /// Removes every resource without handlers.
    ///
    /// Does nothing while unload-unused is disabled. Protected resources and
    /// the standard resource are kept. Returns the number of resources removed.
    pub fn remove_unused(&mut self) -> usize {
        if !self.unload_unused {
            return 0;
        }
        let unused: Vec<ResourceId> = self
            .iter()
            .filter(|(id, _, _)| {
                Some(*id) != self.standard
                    && !self.is_protected(*id)
                    && self.handler_count(*id) == Some(0)
            })
            .map(|(id, _, _)| id)
            .collect();
        let removed = unused.into_iter().filter(|id| self.remove(*id)).count();
        if removed > 0 {
            log::debug!(
                "Swept {removed} unused resource(s) of type {}.",
                std::any::type_name::<T>()
            );
        }
        removed
    }

    /// Runs [`remove_unused`](Self::remove_unused) if the sweep interval has elapsed.
    ///
    /// Call once per update. Returns the number of resources removed.
    pub fn tick(&mut self) -> usize {
        if !self.unload_unused || self.last_sweep.elapsed() < self.sweep_interval {
            return 0;
        }
        self.last_sweep = Instant::now();
        self.remove_unused()
    }
}

impl<T: Resource> Drop for ResourceManager<T> {
    fn drop(&mut self) {
        if !self.is_empty() {
            log::debug!(
                "Dropping manager of {} with {} resource(s).",
                std::any::type_name::<T>(),
                self.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Blob(String);
    impl Resource for Blob {}

    fn manager() -> ResourceManager<Blob> {
        ResourceManager::new(|name: &str| -> anyhow::Result<Blob> {
            if name.starts_with('!') {
                anyhow::bail!("malformed name")
            }
            Ok(Blob(name.to_uppercase()))
        })
    }

    #[test]
    fn test_get_by_name_is_create_or_fetch() {
        let mut manager = manager();
        let first: *const Blob = manager.get_by_name("a").unwrap();
        let second: *const Blob = manager.get_by_name("a").unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get_by_name("a").unwrap(), &Blob("A".into()));
    }

    #[test]
    fn test_failed_creation_caches_nothing() {
        let mut manager = manager();
        assert!(matches!(
            manager.get_by_name("!bad"),
            Err(ResourceError::Creation { .. })
        ));
        assert!(matches!(
            manager.get_by_name(""),
            Err(ResourceError::Creation { .. })
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_insert_rejects_live_names() {
        let mut manager = manager();
        let id = manager.insert("x", Blob("custom".into())).unwrap();
        assert!(matches!(
            manager.insert("x", Blob("again".into())),
            Err(ResourceError::DuplicateName(_))
        ));
        assert_eq!(manager.get(id), Some(&Blob("custom".into())));
        assert_eq!(manager.get_by_name("x").unwrap(), &Blob("custom".into()));
    }

    #[test]
    fn test_stale_ids_do_not_alias() {
        let mut manager = manager();
        let old = manager.insert("old", Blob("1".into())).unwrap();
        assert!(manager.remove(old));
        assert!(!manager.remove(old));

        let new = manager.insert("new", Blob("2".into())).unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(manager.get(old).is_none());
        assert_eq!(manager.name_of(new), Some("new"));
    }

    #[test]
    fn test_foreign_ids_are_rejected() {
        let mut first = manager();
        let mut second = manager();
        let id = first.insert("shared", Blob("1".into())).unwrap();
        second.insert("shared", Blob("2".into())).unwrap();
        assert!(!second.remove(id));
        assert!(second.contains("shared"));
    }

    #[test]
    fn test_rename_keeps_names_unique() {
        let mut manager = manager();
        let a = manager.insert("a", Blob("a".into())).unwrap();
        manager.insert("b", Blob("b".into())).unwrap();
        assert!(matches!(
            manager.rename(a, "b"),
            Err(ResourceError::DuplicateName(_))
        ));
        manager.rename(a, "c").unwrap();
        assert_eq!(manager.id_of("c"), Some(a));
        assert!(!manager.contains("a"));
    }

    #[test]
    fn test_sweep_respects_flag_protection_and_standard() {
        let mut manager = manager();
        let kept = manager.acquire("kept").unwrap();
        let protected = manager.insert("protected", Blob("p".into())).unwrap();
        let standard = manager.insert("standard", Blob("s".into())).unwrap();
        manager.insert("loose", Blob("l".into())).unwrap();
        manager.set_protected(protected, true);
        manager.set_standard(standard).unwrap();

        assert_eq!(manager.remove_unused(), 0, "disabled sweep removes nothing");

        manager.set_unload_unused(true);
        assert_eq!(manager.remove_unused(), 1);
        assert!(!manager.contains("loose"));
        assert!(manager.contains("kept"));
        assert!(kept.is_valid());
    }

    #[test]
    fn test_get_or_standard_falls_back() {
        let mut manager = manager();
        assert!(manager.get_or_standard("!missing").is_err());
        let fallback = manager.insert("fallback", Blob("F".into())).unwrap();
        manager.set_standard(fallback).unwrap();
        assert_eq!(
            manager.get_or_standard("!missing").unwrap(),
            &Blob("F".into())
        );
        assert_eq!(manager.standard(), Some(&Blob("F".into())));
    }

    #[test]
    fn test_clear_spares_protected_resources() {
        let mut manager = manager();
        let protected = manager.insert("p", Blob("p".into())).unwrap();
        manager.insert("q", Blob("q".into())).unwrap();
        manager.set_protected(protected, true);

        assert_eq!(manager.clear(false), 1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.clear(true), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_tick_waits_for_interval() {
        let settings = ResourceSettings {
            unload_unused: true,
            sweep_interval_ms: 60_000,
        };
        let mut manager = ResourceManager::with_settings(
            |name: &str| -> anyhow::Result<Blob> { Ok(Blob(name.to_owned())) },
            &settings,
        );
        manager.get_by_name("idle").unwrap();
        assert_eq!(manager.tick(), 0);

        manager.apply_settings(&ResourceSettings {
            sweep_interval_ms: 0,
            ..settings
        });
        assert_eq!(manager.tick(), 1);
        assert_eq!(manager.settings().sweep_interval_ms, 0);
    }
}
