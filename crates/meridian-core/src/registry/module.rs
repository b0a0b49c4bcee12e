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

//! Modules: named groups of classes registered and removed together.

use super::TypeRegistry;
use crate::class::ClassDescriptor;
use crate::error::ReflectResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a registered module within one [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Descriptive metadata of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Unique module name.
    pub name: String,
    /// Who ships the module.
    pub vendor: String,
    /// License the module is distributed under.
    pub license: String,
    /// Free-form description.
    pub description: String,
}

impl ModuleInfo {
    /// Creates module info with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the vendor.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Sets the license.
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A module submitted at link time with [`inventory::submit!`].
///
/// Every registration linked into the binary is picked up by
/// [`TypeRegistry::load_linked_modules`].
///
/// ```rust,ignore
/// fn register(module: &mut ModuleRegistrar<'_>) -> ReflectResult<()> {
///     module.register_class(ClassBuilder::new("Widget").build()?)
/// }
///
/// meridian_core::inventory::submit! {
///     ModuleRegistration::new("Widgets", register)
/// }
/// ```
pub struct ModuleRegistration {
    /// Unique module name.
    pub name: &'static str,
    /// Who ships the module.
    pub vendor: &'static str,
    /// License the module is distributed under.
    pub license: &'static str,
    /// Free-form description.
    pub description: &'static str,
    /// Registers the module's classes.
    pub register: fn(&mut ModuleRegistrar<'_>) -> ReflectResult<()>,
}

impl ModuleRegistration {
    /// A registration with only a name and a registration function.
    pub const fn new(
        name: &'static str,
        register: fn(&mut ModuleRegistrar<'_>) -> ReflectResult<()>,
    ) -> Self {
        Self {
            name,
            vendor: "",
            license: "",
            description: "",
            register,
        }
    }

    /// The module info this registration describes.
    pub fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.name.to_owned(),
            vendor: self.vendor.to_owned(),
            license: self.license.to_owned(),
            description: self.description.to_owned(),
        }
    }
}

inventory::collect!(ModuleRegistration);

/// Passed to a module's registration function; registers classes on behalf of the module.
pub struct ModuleRegistrar<'a> {
    registry: &'a mut TypeRegistry,
    module: ModuleId,
}

impl<'a> ModuleRegistrar<'a> {
    pub(crate) fn new(registry: &'a mut TypeRegistry, module: ModuleId) -> Self {
        Self { registry, module }
    }

    /// The id of the module being registered.
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// Registers `descriptor` as part of this module.
    pub fn register_class(&mut self, descriptor: ClassDescriptor) -> ReflectResult<()> {
        self.registry.register_class_in(self.module, descriptor)
    }

    /// Read access to the registry, e.g. to look up base classes.
    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }
}

pub(crate) struct ModuleEntry {
    pub(crate) info: ModuleInfo,
    pub(crate) classes: Vec<String>,
}
