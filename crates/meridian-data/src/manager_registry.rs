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

//! A type-map of resource managers.
//!
//! The [`ManagerRegistry`] stores one [`ResourceManager`] per resource type
//! so that subsystems can fetch the manager they need by type, and so that
//! periodic maintenance can run over every manager at once.

use crate::resource::{Resource, ResourceManager};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Object-safe view of a `ResourceManager<T>` for any `T`.
trait AnyManager: Send + Sync {
    fn tick(&mut self) -> usize;
    fn remove_unused(&mut self) -> usize;
    fn len(&self) -> usize;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Resource> AnyManager for ResourceManager<T> {
    fn tick(&mut self) -> usize {
        ResourceManager::tick(self)
    }

    fn remove_unused(&mut self) -> usize {
        ResourceManager::remove_unused(self)
    }

    fn len(&self) -> usize {
        ResourceManager::len(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Resource managers keyed by the [`TypeId`] of their resource type.
#[derive(Default)]
pub struct ManagerRegistry {
    managers: HashMap<TypeId, Box<dyn AnyManager>>,
}

impl ManagerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            managers: HashMap::new(),
        }
    }

    /// Stores the manager of `T`, returning the one it replaces.
    pub fn insert<T: Resource>(
        &mut self,
        manager: ResourceManager<T>,
    ) -> Option<ResourceManager<T>> {
        log::debug!(
            "Registered resource manager for {}.",
            std::any::type_name::<T>()
        );
        self.managers
            .insert(TypeId::of::<T>(), Box::new(manager))
            .and_then(|old| into_manager::<T>(old))
    }

    /// Removes and returns the manager of `T`.
    pub fn remove<T: Resource>(&mut self) -> Option<ResourceManager<T>> {
        self.managers
            .remove(&TypeId::of::<T>())
            .and_then(|old| into_manager::<T>(old))
    }

    /// The manager of `T`.
    #[must_use]
    pub fn get<T: Resource>(&self) -> Option<&ResourceManager<T>> {
        self.managers
            .get(&TypeId::of::<T>())
            .and_then(|m| m.as_any().downcast_ref::<ResourceManager<T>>())
    }

    /// The manager of `T`, mutably.
    pub fn get_mut<T: Resource>(&mut self) -> Option<&mut ResourceManager<T>> {
        self.managers
            .get_mut(&TypeId::of::<T>())
            .and_then(|m| m.as_any_mut().downcast_mut::<ResourceManager<T>>())
    }

    /// Returns `true` if a manager of `T` is registered.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.managers.contains_key(&TypeId::of::<T>())
    }

    /// Calls `tick` on every manager. Returns the total number of resources removed.
    pub fn tick_all(&mut self) -> usize {
        self.managers.values_mut().map(|m| m.tick()).sum()
    }

    /// Sweeps every manager. Returns the total number of resources removed.
    pub fn remove_unused_all(&mut self) -> usize {
        self.managers.values_mut().map(|m| m.remove_unused()).sum()
    }

    /// Resource counts per managed type name.
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        let mut summary: Vec<_> = self
            .managers
            .values()
            .map(|m| (m.type_name(), m.len()))
            .collect();
        summary.sort_unstable();
        summary
    }

    /// The number of registered managers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Returns `true` if no manager is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

fn into_manager<T: Resource>(boxed: Box<dyn AnyManager>) -> Option<ResourceManager<T>> {
    boxed
        .into_any()
        .downcast::<ResourceManager<T>>()
        .ok()
        .map(|manager| *manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Texture(u32);
    impl Resource for Texture {}

    struct Sound;
    impl Resource for Sound {}

    fn textures() -> ResourceManager<Texture> {
        ResourceManager::new(|name: &str| -> anyhow::Result<Texture> {
            Ok(Texture(name.len() as u32))
        })
    }

    #[test]
    fn test_insert_and_get_by_type() {
        let mut registry = ManagerRegistry::new();
        assert!(registry.insert(textures()).is_none());
        assert!(registry.contains::<Texture>());
        assert!(!registry.contains::<Sound>());

        let manager = registry.get_mut::<Texture>().unwrap();
        assert_eq!(manager.get_by_name("wall").unwrap().0, 4);
        assert_eq!(registry.get::<Texture>().unwrap().len(), 1);
        assert!(registry.get::<Sound>().is_none());
    }

    #[test]
    fn test_replacing_returns_previous_manager() {
        let mut registry = ManagerRegistry::new();
        let mut first = textures();
        first.get_by_name("kept").unwrap();
        registry.insert(first);

        let previous = registry.insert(textures()).unwrap();
        assert!(previous.contains("kept"));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove::<Texture>().is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sweeps_run_over_every_manager() {
        let mut registry = ManagerRegistry::default();
        let mut manager = textures();
        manager.set_unload_unused(true);
        manager.get_by_name("a").unwrap();
        manager.get_by_name("b").unwrap();
        registry.insert(manager);
        registry.insert(ResourceManager::new(|_: &str| -> anyhow::Result<Sound> {
            Ok(Sound)
        }));

        assert_eq!(registry.summary().len(), 2);
        assert_eq!(registry.remove_unused_all(), 2);
        assert_eq!(registry.tick_all(), 0);
    }
}
