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

use super::module::{ModuleEntry, ModuleId, ModuleInfo, ModuleRegistrar, ModuleRegistration};
use crate::class::{
    AttributeDescriptor, ClassChain, ClassDescriptor, EventDescriptor, EventHandlerDescriptor,
    MethodDescriptor,
};
use crate::error::{ReflectError, ReflectResult};
use crate::event::{EventBus, RegistryEvent};
use crate::object::Object;
use crate::params::DynParams;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// The catalogue of reflected classes and the modules that registered them.
///
/// Class names are unique within a registry. Mutation takes `&mut self`; a
/// registry shared between threads is wrapped in a lock, as
/// [`ReflectionContext`](super::ReflectionContext) does for the process-wide one.
pub struct TypeRegistry {
    classes: HashMap<String, Arc<ClassDescriptor>>,
    order: Vec<String>,
    modules: BTreeMap<ModuleId, ModuleEntry>,
    next_module_id: u32,
    bus: EventBus<RegistryEvent>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
            order: Vec::new(),
            modules: BTreeMap::new(),
            next_module_id: 1,
            bus: EventBus::new(),
        }
    }

    // --- Classes ---

    /// Registers a class that belongs to no module.
    ///
    /// Fails with [`ReflectError::DuplicateClass`] if the name is taken, in
    /// which case the registered descriptor is left untouched, and with
    /// [`ReflectError::MissingBaseClass`] if the base is not registered.
    pub fn register_class(&mut self, descriptor: ClassDescriptor) -> ReflectResult<()> {
        self.insert_class(descriptor, None)
    }

    /// Registers a class on behalf of `module`.
    pub fn register_class_in(
        &mut self,
        module: ModuleId,
        descriptor: ClassDescriptor,
    ) -> ReflectResult<()> {
        if !self.modules.contains_key(&module) {
            return Err(ReflectError::UnknownModule(module.0));
        }
        self.insert_class(descriptor, Some(module))
    }

    fn insert_class(
        &mut self,
        mut descriptor: ClassDescriptor,
        module: Option<ModuleId>,
    ) -> ReflectResult<()> {
        if self.classes.contains_key(descriptor.name()) {
            return Err(ReflectError::DuplicateClass(descriptor.name.clone()));
        }
        if let Some(base) = descriptor.base() {
            if !self.classes.contains_key(base) {
                return Err(ReflectError::MissingBaseClass {
                    class: descriptor.name.clone(),
                    base: base.to_owned(),
                });
            }
        }

        descriptor.module = module;
        let name = descriptor.name.clone();
        self.classes.insert(name.clone(), Arc::new(descriptor));
        self.order.push(name.clone());
        if let Some(entry) = module.and_then(|id| self.modules.get_mut(&id)) {
            entry.classes.push(name.clone());
        }

        log::info!("Registered class '{name}'.");
        self.bus.publish(RegistryEvent::ClassLoaded { name });
        Ok(())
    }

    /// Removes a class. Returns `false` if it was not registered.
    ///
    /// Existing instances keep working: they hold their own resolved chain.
    pub fn unregister_class(&mut self, name: &str) -> bool {
        let Some(descriptor) = self.classes.remove(name) else {
            return false;
        };
        self.order.retain(|n| n != name);
        if let Some(entry) = descriptor.module.and_then(|id| self.modules.get_mut(&id)) {
            entry.classes.retain(|n| n != name);
        }

        // One reference is ours; every other one belongs to a live chain.
        let live = Arc::strong_count(&descriptor) - 1;
        if live > 0 {
            log::warn!(
                "Class '{name}' unregistered while {live} resolved chain(s) still reference it."
            );
        }
        let orphans: Vec<&str> = self
            .order
            .iter()
            .filter(|n| {
                self.classes
                    .get(n.as_str())
                    .is_some_and(|c| c.base() == Some(name))
            })
            .map(String::as_str)
            .collect();
        if !orphans.is_empty() {
            log::warn!(
                "Class '{name}' unregistered while derived classes remain: {}.",
                orphans.join(", ")
            );
        }

        log::info!("Unregistered class '{name}'.");
        self.bus.publish(RegistryEvent::ClassUnloaded {
            name: name.to_owned(),
        });
        true
    }

    /// Looks up a class by name.
    pub fn find_class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name).map(Arc::as_ref)
    }

    /// Returns `true` if a class with this name is registered.
    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Registered class names, in registration order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// The number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    // --- Inheritance ---

    /// Resolves `name` and all of its bases, most-derived first.
    pub fn base_chain(&self, name: &str) -> ReflectResult<ClassChain> {
        let first = self
            .classes
            .get(name)
            .ok_or_else(|| ReflectError::UnknownClass(name.to_owned()))?;

        let mut visited = HashSet::from([first.name()]);
        let mut classes = vec![Arc::clone(first)];
        let mut current = first;
        while let Some(base) = current.base() {
            if !visited.insert(base) {
                return Err(ReflectError::InheritanceCycle(base.to_owned()));
            }
            let next = self
                .classes
                .get(base)
                .ok_or_else(|| ReflectError::MissingBaseClass {
                    class: current.name().to_owned(),
                    base: base.to_owned(),
                })?;
            classes.push(Arc::clone(next));
            current = next;
        }
        Ok(ClassChain::new(classes))
    }

    /// Returns `true` if `class` is `base` or derives from it.
    ///
    /// Unknown classes and broken chains derive from nothing.
    pub fn is_derived_from(&self, class: &str, base: &str) -> bool {
        self.base_chain(class)
            .map(|chain| chain.is_a(base))
            .unwrap_or(false)
    }

    /// Classes deriving from `base`, in registration order.
    ///
    /// With `recursive` set, indirect descendants are included too. `base`
    /// itself is never part of the result.
    pub fn classes_derived_from(&self, base: &str, recursive: bool) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| name.as_str() != base)
            .filter(|name| {
                if recursive {
                    self.is_derived_from(name, base)
                } else {
                    self.classes
                        .get(name.as_str())
                        .is_some_and(|c| c.base() == Some(base))
                }
            })
            .map(String::as_str)
            .collect()
    }

    /// Every attribute visible on `class`, root class first.
    pub fn attributes_of(&self, class: &str) -> ReflectResult<Vec<AttributeDescriptor>> {
        let chain = self.base_chain(class)?;
        Ok(chain.attributes().into_iter().cloned().collect())
    }

    /// Every method visible on `class`, root class first.
    pub fn methods_of(&self, class: &str) -> ReflectResult<Vec<MethodDescriptor>> {
        let chain = self.base_chain(class)?;
        Ok(chain.methods().into_iter().cloned().collect())
    }

    /// Every event visible on `class`, root class first.
    pub fn events_of(&self, class: &str) -> ReflectResult<Vec<EventDescriptor>> {
        let chain = self.base_chain(class)?;
        Ok(chain.events().into_iter().cloned().collect())
    }

    /// Every slot visible on `class`, root class first.
    pub fn slots_of(&self, class: &str) -> ReflectResult<Vec<EventHandlerDescriptor>> {
        let chain = self.base_chain(class)?;
        Ok(chain.slots().into_iter().cloned().collect())
    }

    /// The merged properties of `class`.
    pub fn properties_of(&self, class: &str) -> ReflectResult<BTreeMap<String, String>> {
        Ok(self.base_chain(class)?.properties())
    }

    // --- Instantiation ---

    /// Creates an instance of `class` using the constructor that accepts `args`.
    ///
    /// Every attribute starts at its default before the constructor body runs.
    pub fn create_instance(&self, class: &str, args: &DynParams) -> ReflectResult<Object> {
        let chain = Arc::new(self.base_chain(class)?);
        let body = chain
            .class()
            .find_constructor(args)
            .ok_or_else(|| ReflectError::NoSuchConstructor {
                class: class.to_owned(),
                signature: args.signature_id(),
            })?
            .cloned();

        let mut object = Object::new(Arc::clone(&chain));
        if let Some(body) = body {
            body(&mut object, args)
                .map_err(|e| ReflectError::handler(format!("{class} constructor"), e))?;
        }
        log::debug!("Created instance of '{class}' ({}).", object.id());
        Ok(object)
    }

    /// Creates an instance of `class` with the argument-less constructor.
    pub fn create_default(&self, class: &str) -> ReflectResult<Object> {
        self.create_instance(class, &DynParams::empty())
    }

    // --- Modules ---

    /// Registers a module and returns its id.
    pub fn register_module(&mut self, info: ModuleInfo) -> ModuleId {
        let id = ModuleId(self.next_module_id);
        self.next_module_id += 1;
        log::info!("Loaded module '{}' as {id}.", info.name);
        self.bus.publish(RegistryEvent::ModuleLoaded {
            id,
            name: info.name.clone(),
        });
        self.modules.insert(
            id,
            ModuleEntry {
                info,
                classes: Vec::new(),
            },
        );
        id
    }

    /// Removes a module and every class it registered, newest first.
    pub fn unregister_module(&mut self, id: ModuleId) -> ReflectResult<()> {
        let classes = self
            .modules
            .get(&id)
            .map(|entry| entry.classes.clone())
            .ok_or(ReflectError::UnknownModule(id.0))?;
        for class in classes.iter().rev() {
            self.unregister_class(class);
        }
        if let Some(entry) = self.modules.remove(&id) {
            log::info!("Unloaded module '{}' ({id}).", entry.info.name);
            self.bus.publish(RegistryEvent::ModuleUnloaded {
                id,
                name: entry.info.name,
            });
        }
        Ok(())
    }

    /// Module metadata by id.
    pub fn module(&self, id: ModuleId) -> Option<&ModuleInfo> {
        self.modules.get(&id).map(|entry| &entry.info)
    }

    /// Finds a module id by name.
    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .find(|(_, entry)| entry.info.name == name)
            .map(|(id, _)| *id)
    }

    /// Classes registered by a module, in registration order.
    pub fn module_classes(&self, id: ModuleId) -> Option<&[String]> {
        self.modules.get(&id).map(|entry| entry.classes.as_slice())
    }

    /// All modules, by ascending id.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &ModuleInfo)> {
        self.modules.iter().map(|(id, entry)| (*id, &entry.info))
    }

    /// Registers one module: its info, then its classes.
    ///
    /// If the registration function fails, everything it registered is
    /// removed again.
    pub fn load_module(&mut self, registration: &ModuleRegistration) -> ReflectResult<ModuleId> {
        let id = self.register_module(registration.info());
        let result = (registration.register)(&mut ModuleRegistrar::new(self, id));
        match result {
            Ok(()) => Ok(id),
            Err(e) => {
                self.unregister_module(id)?;
                Err(e)
            }
        }
    }

    /// Registers every [`ModuleRegistration`] linked into the binary.
    ///
    /// Modules whose name is already loaded are skipped. Link order is not
    /// defined, so a module that fails (for instance because a base class
    /// lives in another module) is retried as long as another module loaded
    /// in the same pass. Modules that still fail are logged and skipped.
    /// Returns the number of modules loaded.
    pub fn load_linked_modules(&mut self) -> usize {
        let mut pending: Vec<&'static ModuleRegistration> = inventory::iter::<ModuleRegistration>
            .into_iter()
            .filter(|reg| self.module_by_name(reg.name).is_none())
            .collect();

        let mut loaded = 0;
        loop {
            let mut failures = Vec::new();
            let before = pending.len();
            for registration in pending {
                match self.load_module(registration) {
                    Ok(_) => loaded += 1,
                    Err(e) => failures.push((registration, e)),
                }
            }
            if failures.is_empty() || failures.len() == before {
                for (registration, e) in &failures {
                    log::error!("Failed to load module '{}': {e}", registration.name);
                }
                break;
            }
            pending = failures.into_iter().map(|(reg, _)| reg).collect();
        }
        loaded
    }

    /// Unregisters every module and class.
    pub fn clear(&mut self) {
        let modules: Vec<ModuleId> = self.modules.keys().rev().copied().collect();
        for id in modules {
            // Every id comes from the map, so this cannot fail.
            let _ = self.unregister_module(id);
        }
        while let Some(name) = self.order.last().cloned() {
            self.unregister_class(&name);
        }
        log::info!("Type registry cleared.");
    }

    // --- Notifications ---

    /// The bus on which the registry announces changes.
    pub fn bus(&self) -> &EventBus<RegistryEvent> {
        &self.bus
    }

    /// Removes and returns every pending notification.
    pub fn drain_events(&self) -> Vec<RegistryEvent> {
        self.bus.drain()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::signature::Signature;
    use crate::value::{Value, ValueType};

    fn class(name: &str, base: Option<&str>) -> ClassDescriptor {
        let mut builder = ClassBuilder::new(name).attribute(format!("{name}Value"), 0);
        if let Some(base) = base {
            builder = builder.base(base);
        }
        builder.build().unwrap()
    }

    fn hierarchy() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_class(class("Object", None)).unwrap();
        registry.register_class(class("Widget", Some("Object"))).unwrap();
        registry.register_class(class("Button", Some("Widget"))).unwrap();
        registry.register_class(class("Label", Some("Widget"))).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_keeps_original() {
        let mut registry = TypeRegistry::new();
        registry
            .register_class(ClassBuilder::new("Widget").attribute("A", 1).build().unwrap())
            .unwrap();
        let err = registry
            .register_class(ClassBuilder::new("Widget").attribute("B", 2).build().unwrap())
            .unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateClass(name) if name == "Widget"));
        assert_eq!(registry.find_class("Widget").unwrap().attributes()[0].name(), "A");
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut registry = hierarchy();
        assert!(!registry.unregister_class("Nope"));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_missing_base_is_rejected() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .register_class(class("Orphan", Some("Ghost")))
            .unwrap_err();
        assert!(matches!(err, ReflectError::MissingBaseClass { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_inheritance_queries() {
        let registry = hierarchy();
        assert!(registry.is_derived_from("Button", "Object"));
        assert!(registry.is_derived_from("Button", "Button"));
        assert!(!registry.is_derived_from("Widget", "Button"));
        assert!(!registry.is_derived_from("Unknown", "Object"));

        assert_eq!(registry.classes_derived_from("Widget", false), ["Button", "Label"]);
        assert_eq!(registry.classes_derived_from("Object", false), ["Widget"]);
        assert_eq!(
            registry.classes_derived_from("Object", true),
            ["Widget", "Button", "Label"]
        );

        let chain = registry.base_chain("Button").unwrap();
        assert_eq!(chain.names(), ["Button", "Widget", "Object"]);
        let attributes: Vec<_> = registry
            .attributes_of("Button")
            .unwrap()
            .iter()
            .map(|a| a.name().to_owned())
            .collect();
        assert_eq!(attributes, ["ObjectValue", "WidgetValue", "ButtonValue"]);
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut registry = TypeRegistry::new();
        registry.register_class(class("A", None)).unwrap();
        registry.register_class(class("B", Some("A"))).unwrap();
        registry.unregister_class("A");
        registry.register_class(class("A", Some("B"))).unwrap();

        assert!(matches!(
            registry.base_chain("B"),
            Err(ReflectError::InheritanceCycle(_))
        ));
        assert!(!registry.is_derived_from("B", "A"));
    }

    #[test]
    fn test_create_instance_selects_constructor() {
        let mut registry = TypeRegistry::new();
        registry
            .register_class(
                ClassBuilder::new("Counter")
                    .attribute("Count", 0)
                    .default_constructor()
                    .constructor([ValueType::Int], |obj, args| {
                        let start = args.parameter(0).cloned().unwrap_or_default();
                        obj.set_attribute("Count", start)?;
                        Ok(())
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let plain = registry.create_default("Counter").unwrap();
        assert_eq!(plain.get_attribute("Count").unwrap(), Value::Int(0));

        let seeded = registry
            .create_instance("Counter", &DynParams::with_args([Value::Int(7)]))
            .unwrap();
        assert_eq!(seeded.get_attribute("Count").unwrap(), Value::Int(7));

        let err = registry
            .create_instance("Counter", &DynParams::with_args([Value::from("x")]))
            .unwrap_err();
        assert!(matches!(err, ReflectError::NoSuchConstructor { .. }));
        assert!(matches!(
            registry.create_default("Missing"),
            Err(ReflectError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_unregister_module_removes_its_classes() {
        let mut registry = TypeRegistry::new();
        registry.register_class(class("Object", None)).unwrap();
        let id = registry.register_module(ModuleInfo::new("Gui").with_vendor("Meridian"));
        registry
            .register_class_in(id, class("Widget", Some("Object")))
            .unwrap();
        registry
            .register_class_in(id, class("Button", Some("Widget")))
            .unwrap();

        assert_eq!(registry.module_by_name("Gui"), Some(id));
        assert_eq!(registry.find_class("Button").unwrap().module(), Some(id));
        assert_eq!(registry.module_classes(id).unwrap().len(), 2);
        registry.drain_events();

        registry.unregister_module(id).unwrap();
        assert_eq!(registry.class_names().collect::<Vec<_>>(), ["Object"]);
        assert!(registry.module(id).is_none());
        assert!(matches!(
            registry.unregister_module(id),
            Err(ReflectError::UnknownModule(_))
        ));

        let events = registry.drain_events();
        assert_eq!(
            events,
            [
                RegistryEvent::ClassUnloaded {
                    name: "Button".into()
                },
                RegistryEvent::ClassUnloaded {
                    name: "Widget".into()
                },
                RegistryEvent::ModuleUnloaded {
                    id,
                    name: "Gui".into()
                },
            ]
        );
    }

    #[test]
    fn test_failed_module_is_rolled_back() {
        fn register(module: &mut ModuleRegistrar<'_>) -> ReflectResult<()> {
            module.register_class(class("Good", None))?;
            module.register_class(class("Bad", Some("Missing")))
        }

        let mut registry = TypeRegistry::new();
        let registration = ModuleRegistration::new("Partial", register);
        assert!(registry.load_module(&registration).is_err());
        assert!(registry.is_empty());
        assert_eq!(registry.modules().count(), 0);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut registry = hierarchy();
        registry.register_module(ModuleInfo::new("Empty"));
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.modules().count(), 0);
    }

    #[test]
    fn test_unregistered_class_instances_stay_usable() {
        let mut registry = TypeRegistry::new();
        registry
            .register_class(
                ClassBuilder::new("Temp")
                    .attribute("X", 1.5)
                    .method("Nop", Signature::void([]), |_, _| Ok(()))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let mut object = registry.create_default("Temp").unwrap();
        assert!(registry.unregister_class("Temp"));

        object.set_attribute("X", 2.5).unwrap();
        object.call_method("Nop", &mut DynParams::empty()).unwrap();
        assert_eq!(object.class_name(), "Temp");
    }

    #[test]
    fn test_undrained_notifications_stay_bounded() {
        let mut registry = TypeRegistry::new();
        for _ in 0..10_000 {
            registry.register_class(class("Churn", None)).unwrap();
            assert!(registry.unregister_class("Churn"));
        }

        assert_eq!(registry.bus().pending(), crate::event::DEFAULT_BUS_CAPACITY);
        let last = registry.drain_events().pop();
        assert_eq!(
            last,
            Some(RegistryEvent::ClassUnloaded {
                name: "Churn".to_owned()
            })
        );
    }
}
