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

use super::TypeRegistry;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

static GLOBAL: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();

/// Access point to the process-wide [`TypeRegistry`].
///
/// The registry is created on first access, at which point every module
/// submitted with [`inventory`] is loaded. Explicit registries created with
/// [`TypeRegistry::new`] are independent of this one.
pub struct ReflectionContext;

impl ReflectionContext {
    /// The process-wide registry, created and populated on first use.
    pub fn global() -> &'static RwLock<TypeRegistry> {
        GLOBAL.get_or_init(|| {
            let mut registry = TypeRegistry::new();
            let loaded = registry.load_linked_modules();
            log::info!("Reflection context initialized with {loaded} linked module(s).");
            RwLock::new(registry)
        })
    }

    /// Shared access to the process-wide registry.
    pub fn read() -> RwLockReadGuard<'static, TypeRegistry> {
        Self::global()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to the process-wide registry.
    pub fn write() -> RwLockWriteGuard<'static, TypeRegistry> {
        Self::global()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Unregisters every module and class from the process-wide registry.
    ///
    /// Objects created earlier keep working; new lookups find nothing until
    /// classes are registered again.
    pub fn shutdown() {
        log::info!("Shutting down reflection context.");
        Self::write().clear();
    }
}
