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

use super::manager::Stored;
use super::{Resource, ResourceId, ResourceManager};
use crate::error::{ResourceError, ResourceResult};
use std::fmt;
use std::sync::Weak;

/// A weak, typed reference to a resource owned by a [`ResourceManager`].
///
/// Each attached handler counts towards the resource's handler count, which
/// keeps it from being swept as unused. The handler never keeps the resource
/// alive. The data is only reachable through [`get`](Self::get), which
/// borrows the owning manager, so a reference to it cannot outlive the
/// manager or survive a removal.
pub struct ResourceHandler<T: Resource> {
    target: Option<(ResourceId, Weak<Stored<T>>)>,
}

impl<T: Resource> ResourceHandler<T> {
    /// Creates a handler attached to nothing.
    pub fn new() -> Self {
        Self { target: None }
    }

    pub(crate) fn attached(id: ResourceId, weak: Weak<Stored<T>>) -> Self {
        Self {
            target: Some((id, weak)),
        }
    }

    pub(crate) fn target(&self) -> Option<(ResourceId, &Weak<Stored<T>>)> {
        self.target.as_ref().map(|(id, weak)| (*id, weak))
    }

    /// Attaches to, re-points to, or (with `None`) detaches from a resource.
    ///
    /// The previous target's handler count is decremented and the new one's
    /// incremented. On error the handler is left unchanged.
    pub fn set_resource(
        &mut self,
        manager: &ResourceManager<T>,
        id: Option<ResourceId>,
    ) -> ResourceResult<()> {
        self.target = match id {
            Some(id) => {
                let weak = manager.downgrade(id).ok_or(ResourceError::StaleId(id))?;
                Some((id, weak))
            }
            None => None,
        };
        Ok(())
    }

    /// Detaches from the current resource.
    pub fn clear(&mut self) {
        self.target = None;
    }

    /// The resource, borrowed from the manager that owns it.
    ///
    /// Same as [`ResourceManager::resolve`].
    pub fn get<'m>(&self, manager: &'m ResourceManager<T>) -> Option<&'m T> {
        manager.resolve(self)
    }

    /// The current name of the resource, if it still exists.
    pub fn name(&self) -> Option<String> {
        self.target
            .as_ref()
            .and_then(|(_, weak)| weak.upgrade())
            .map(|stored| stored.name())
    }

    /// The id of the resource, if it still exists.
    ///
    /// The owning manager holds the only strong reference, so the target is
    /// alive exactly as long as its manager slot.
    pub fn id(&self) -> Option<ResourceId> {
        self.target
            .as_ref()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(id, _)| *id)
    }

    /// Returns `true` if the handler points at an existing resource.
    pub fn is_valid(&self) -> bool {
        self.id().is_some()
    }
}

impl<T: Resource> Default for ResourceHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning attaches a second handler to the same resource.
impl<T: Resource> Clone for ResourceHandler<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T: Resource> fmt::Debug for ResourceHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandler")
            .field("id", &self.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mesh;
    impl Resource for Mesh {}

    fn manager() -> ResourceManager<Mesh> {
        ResourceManager::new(|_: &str| -> anyhow::Result<Mesh> { Ok(Mesh) })
    }

    #[test]
    fn test_attach_repoint_and_detach_adjust_counts() {
        let mut manager = manager();
        let cube = manager.acquire("cube").unwrap().id().unwrap();
        let sphere = manager.acquire("sphere").unwrap().id().unwrap();
        assert_eq!(manager.handler_count(cube), Some(0));

        let mut handler = ResourceHandler::new();
        handler.set_resource(&manager, Some(cube)).unwrap();
        assert_eq!(manager.handler_count(cube), Some(1));

        handler.set_resource(&manager, Some(sphere)).unwrap();
        assert_eq!(manager.handler_count(cube), Some(0));
        assert_eq!(manager.handler_count(sphere), Some(1));

        let copy = handler.clone();
        assert_eq!(manager.handler_count(sphere), Some(2));
        drop(copy);
        handler.set_resource(&manager, None).unwrap();
        assert_eq!(manager.handler_count(sphere), Some(0));
        assert!(!handler.is_valid());
    }

    #[test]
    fn test_stale_target_is_rejected() {
        let mut manager = manager();
        let id = manager.acquire("temp").unwrap().id().unwrap();
        let mut handler = manager.handler(id).unwrap();
        assert!(manager.remove(id));

        assert!(handler.get(&manager).is_none());
        assert!(handler.name().is_none());
        assert!(matches!(
            handler.set_resource(&manager, Some(id)),
            Err(ResourceError::StaleId(_))
        ));
        assert_eq!(handler.id(), None);
    }

    #[test]
    fn test_name_follows_renames() {
        let mut manager = manager();
        let handler = manager.acquire("draft").unwrap();
        assert_eq!(handler.name().as_deref(), Some("draft"));

        let id = handler.id().unwrap();
        manager.rename(id, "final").unwrap();
        assert_eq!(handler.name().as_deref(), Some("final"));
    }

    #[test]
    fn test_handler_of_another_manager_does_not_resolve() {
        let mut first = manager();
        let mut second = manager();
        let handler = first.acquire("cube").unwrap();
        second.acquire("cube").unwrap();

        assert!(handler.get(&first).is_some());
        assert!(second.resolve(&handler).is_none());
    }
}
