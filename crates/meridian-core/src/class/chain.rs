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

use super::descriptor::{
    AttributeDescriptor, ClassDescriptor, EventDescriptor, EventHandlerDescriptor,
    MethodDescriptor,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// A resolved inheritance chain, most-derived class first.
///
/// Objects hold their chain by `Arc`, so an instance stays fully usable even
/// if its class is later unregistered from the registry.
#[derive(Debug, Clone)]
pub struct ClassChain {
    classes: Vec<Arc<ClassDescriptor>>,
}

impl ClassChain {
    pub(crate) fn new(classes: Vec<Arc<ClassDescriptor>>) -> Self {
        debug_assert!(!classes.is_empty());
        Self { classes }
    }

    /// The most-derived class.
    pub fn class(&self) -> &ClassDescriptor {
        &self.classes[0]
    }

    /// The most-derived class name.
    pub fn name(&self) -> &str {
        self.class().name()
    }

    /// Iterates from the most-derived class to the root.
    pub fn iter(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.iter().map(|c| c.as_ref())
    }

    /// Class names from the most-derived class to the root.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(ClassDescriptor::name).collect()
    }

    /// Returns `true` if `class` is this class or one of its bases.
    pub fn is_a(&self, class: &str) -> bool {
        self.iter().any(|c| c.name() == class)
    }

    /// `true` only if every class in the chain is copyable.
    pub fn is_copyable(&self) -> bool {
        self.iter().all(ClassDescriptor::is_copyable)
    }

    /// Finds an attribute, searching from the most-derived class.
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.iter().find_map(|c| c.attribute(name))
    }

    /// Finds a method, searching from the most-derived class.
    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.iter().find_map(|c| c.method(name))
    }

    /// Finds an event, searching from the most-derived class.
    pub fn find_event(&self, name: &str) -> Option<&EventDescriptor> {
        self.iter().find_map(|c| c.event(name))
    }

    /// Finds a slot, searching from the most-derived class.
    pub fn find_slot(&self, name: &str) -> Option<&EventHandlerDescriptor> {
        self.iter().find_map(|c| c.slot(name))
    }

    /// All attributes, root class first, with shadowed base members removed.
    pub fn attributes(&self) -> Vec<&AttributeDescriptor> {
        self.flatten(|c| c.attributes(), AttributeDescriptor::name)
    }

    /// All methods, root class first, with shadowed base members removed.
    pub fn methods(&self) -> Vec<&MethodDescriptor> {
        self.flatten(|c| c.methods(), MethodDescriptor::name)
    }

    /// All events, root class first, with shadowed base members removed.
    pub fn events(&self) -> Vec<&EventDescriptor> {
        self.flatten(|c| c.events(), EventDescriptor::name)
    }

    /// All slots, root class first, with shadowed base members removed.
    pub fn slots(&self) -> Vec<&EventHandlerDescriptor> {
        self.flatten(|c| c.slots(), EventHandlerDescriptor::name)
    }

    /// Merged properties; a derived class overrides its bases.
    pub fn properties(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for class in self.classes.iter().rev() {
            merged.extend(
                class
                    .properties()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
        }
        merged
    }

    fn flatten<'a, M: 'a>(
        &'a self,
        members: impl Fn(&'a ClassDescriptor) -> &'a [M],
        name: impl Fn(&M) -> &str,
    ) -> Vec<&'a M> {
        // Walk derived-first to find the visible member for each name, then
        // emit in root-first order.
        let mut seen = HashSet::new();
        let mut per_class: Vec<Vec<&'a M>> = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let visible = members(class.as_ref())
                .iter()
                .filter(|m| seen.insert(name(*m).to_owned()))
                .collect();
            per_class.push(visible);
        }
        per_class.into_iter().rev().flatten().collect()
    }
}
