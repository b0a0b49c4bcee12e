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

//! Instances of reflected classes.
//!
//! An [`Object`] is bound to exactly one class for its whole life and holds
//! storage for every directly stored attribute of that class and its bases.
//! Everything is addressed by name: attributes through
//! [`get_attribute`](Object::get_attribute) / [`set_attribute`](Object::set_attribute),
//! methods through [`call_method`](Object::call_method), events through
//! [`connect_event`](Object::connect_event) and [`emit_event`](Object::emit_event).

mod slot;
mod snapshot;

pub use self::slot::{bind_slot, share, SharedObject};
pub use self::snapshot::ObjectSnapshot;

use crate::class::{AttributeDescriptor, AttributeStorage, ClassChain, ClassDescriptor};
use crate::error::{ReflectError, ReflectResult};
use crate::event::{Event, EventHandler};
use crate::params::{DynParams, ParamsParser};
use crate::registry::TypeRegistry;
use crate::signature::Signature;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the event every object emits when it is dropped.
pub const DESTROYED_EVENT: &str = "Destroyed";

/// The identity of one object instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An instance of a reflected class.
pub struct Object {
    id: ObjectId,
    chain: Arc<ClassChain>,
    values: HashMap<String, Value>,
    events: HashMap<String, Event>,
}

impl Object {
    pub(crate) fn new(chain: Arc<ClassChain>) -> Self {
        let values = chain
            .attributes()
            .into_iter()
            .filter(|a| matches!(a.storage(), AttributeStorage::Direct))
            .map(|a| (a.name().to_owned(), a.default_value().clone()))
            .collect();
        let events = Self::fresh_events(&chain);
        Self {
            id: ObjectId::new(),
            chain,
            values,
            events,
        }
    }

    fn fresh_events(chain: &ClassChain) -> HashMap<String, Event> {
        let mut events: HashMap<String, Event> = chain
            .events()
            .into_iter()
            .map(|e| (e.name().to_owned(), Event::new(e.name(), e.signature().clone())))
            .collect();
        events.insert(
            DESTROYED_EVENT.to_owned(),
            Event::new(DESTROYED_EVENT, Signature::default()),
        );
        events
    }

    /// The unique identity of this instance.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The name of the object's class.
    pub fn class_name(&self) -> &str {
        self.chain.name()
    }

    /// The object's class descriptor.
    pub fn class(&self) -> &ClassDescriptor {
        self.chain.class()
    }

    /// The resolved class chain the object was created with.
    pub fn chain(&self) -> &ClassChain {
        &self.chain
    }

    /// Returns `true` if the object's class is `class` or derives from it.
    pub fn is_instance_of(&self, class: &str) -> bool {
        self.chain.is_a(class)
    }

    fn unknown_attribute(&self, name: &str) -> ReflectError {
        ReflectError::UnknownAttribute {
            class: self.class_name().to_owned(),
            attribute: name.to_owned(),
        }
    }

    // --- Attributes ---

    /// Reads an attribute, searching the whole class chain.
    pub fn get_attribute(&self, name: &str) -> ReflectResult<Value> {
        let attribute = self
            .chain
            .find_attribute(name)
            .ok_or_else(|| self.unknown_attribute(name))?;
        match attribute.storage() {
            AttributeStorage::Direct => Ok(self
                .values
                .get(name)
                .cloned()
                .unwrap_or_else(|| attribute.default_value().clone())),
            AttributeStorage::Computed { getter, .. } => {
                getter(self).map_err(|e| ReflectError::handler(format!("get {name}"), e))
            }
        }
    }

    /// Writes an attribute through the generic interface.
    ///
    /// The value must carry the declared type tag; on any failure the stored
    /// value is left unchanged.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> ReflectResult<()> {
        let chain = Arc::clone(&self.chain);
        let attribute = chain
            .find_attribute(name)
            .ok_or_else(|| self.unknown_attribute(name))?;
        if !attribute.is_writable() {
            return Err(ReflectError::ReadOnlyAttribute {
                class: self.class_name().to_owned(),
                attribute: name.to_owned(),
            });
        }
        self.write(attribute, value.into())
    }

    /// Writes an attribute from native code, ignoring its access mode.
    ///
    /// Types are still checked. Computed attributes without a setter cannot
    /// be stored.
    pub fn store(&mut self, name: &str, value: impl Into<Value>) -> ReflectResult<()> {
        let chain = Arc::clone(&self.chain);
        let attribute = chain
            .find_attribute(name)
            .ok_or_else(|| self.unknown_attribute(name))?;
        self.write(attribute, value.into())
    }

    /// Checks that `value` may be stored in `attribute` without storing it.
    fn check(&self, attribute: &AttributeDescriptor, value: &Value) -> ReflectResult<()> {
        if value.value_type() != attribute.value_type() {
            return Err(ReflectError::TypeMismatch {
                target: attribute.name().to_owned(),
                expected: attribute.value_type(),
                found: value.value_type(),
            });
        }
        if let Value::Enum(variant) = &value {
            if !attribute.enum_values().iter().any(|v| v == variant) {
                return Err(ReflectError::InvalidEnumValue {
                    attribute: attribute.name().to_owned(),
                    value: variant.clone(),
                });
            }
        }
        Ok(())
    }

    fn write(&mut self, attribute: &AttributeDescriptor, value: Value) -> ReflectResult<()> {
        self.check(attribute, &value)?;
        match attribute.storage() {
            AttributeStorage::Direct => {
                self.values.insert(attribute.name().to_owned(), value);
                Ok(())
            }
            AttributeStorage::Computed {
                setter: Some(setter),
                ..
            } => setter(self, value)
                .map_err(|e| ReflectError::handler(format!("set {}", attribute.name()), e)),
            AttributeStorage::Computed { setter: None, .. } => {
                Err(ReflectError::ReadOnlyAttribute {
                    class: self.class_name().to_owned(),
                    attribute: attribute.name().to_owned(),
                })
            }
        }
    }

    /// Resets one attribute to its default value.
    ///
    /// Read-only direct attributes are reset too. Computed attributes have no
    /// storage of their own and are left alone.
    pub fn set_attribute_default(&mut self, name: &str) -> ReflectResult<()> {
        let chain = Arc::clone(&self.chain);
        let attribute = chain
            .find_attribute(name)
            .ok_or_else(|| self.unknown_attribute(name))?;
        match attribute.storage() {
            AttributeStorage::Direct => self.write(attribute, attribute.default_value().clone()),
            AttributeStorage::Computed { .. } => Ok(()),
        }
    }

    /// Resets every attribute to its default value.
    pub fn set_default_values(&mut self) -> ReflectResult<()> {
        let chain = Arc::clone(&self.chain);
        for attribute in chain.attributes() {
            self.set_attribute_default(attribute.name())?;
        }
        Ok(())
    }

    /// Returns `true` if the attribute currently holds its default value.
    pub fn is_default(&self, name: &str) -> ReflectResult<bool> {
        let attribute = self
            .chain
            .find_attribute(name)
            .ok_or_else(|| self.unknown_attribute(name))?;
        Ok(&self.get_attribute(name)? == attribute.default_value())
    }

    /// Writable stored attributes and their current values, root class first.
    fn writable_values(&self, include_defaults: bool) -> ReflectResult<Vec<(String, Value)>> {
        let mut out = Vec::new();
        for attribute in self.chain.attributes() {
            if !is_persistent(attribute) {
                continue;
            }
            let value = self.get_attribute(attribute.name())?;
            if include_defaults || &value != attribute.default_value() {
                out.push((attribute.name().to_owned(), value));
            }
        }
        Ok(out)
    }

    /// Renders writable stored attributes as `Name="value"` pairs separated by spaces.
    pub fn values_string(&self, include_defaults: bool) -> ReflectResult<String> {
        let pairs = self.writable_values(include_defaults)?;
        Ok(pairs
            .iter()
            .map(|(name, value)| quote_pair(name, &value.to_string()))
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// Applies a `Name="value"` string produced by [`values_string`](Self::values_string).
    ///
    /// Every entry is parsed and checked before the first one is written.
    pub fn set_values(&mut self, input: &str) -> ReflectResult<()> {
        let mut parsed = Vec::new();
        for param in ParamsParser::new(input) {
            let param = param?;
            let Some(name) = param.name else {
                return Err(ReflectError::MalformedParams {
                    input: input.to_owned(),
                    reason: format!("value '{}' has no attribute name", param.value),
                });
            };
            let attribute = self
                .chain
                .find_attribute(&name)
                .ok_or_else(|| self.unknown_attribute(&name))?;
            let value = Value::parse(attribute.value_type(), &param.value)?;
            parsed.push((name, value));
        }
        for (name, value) in parsed {
            self.set_attribute(&name, value)?;
        }
        Ok(())
    }

    /// Creates an object from the `Class Name="value" ...` form written by `Display`.
    pub fn from_string(registry: &TypeRegistry, input: &str) -> ReflectResult<Object> {
        let input = input.trim_start();
        let (class, values) = input
            .split_once(char::is_whitespace)
            .unwrap_or((input, ""));
        let mut object = registry.create_default(class)?;
        object.set_values(values)?;
        Ok(object)
    }

    /// Captures the writable state of the object.
    pub fn snapshot(&self) -> ReflectResult<ObjectSnapshot> {
        Ok(ObjectSnapshot {
            class: self.class_name().to_owned(),
            values: self
                .writable_values(true)?
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
        })
    }

    /// Restores state captured by [`snapshot`](Self::snapshot).
    ///
    /// A snapshot of another class is ignored and `Ok(false)` is returned.
    /// Attributes the class no longer declares are skipped. Every entry is
    /// checked before the first one is written, so a rejected snapshot leaves
    /// the object unchanged.
    pub fn apply_snapshot(&mut self, snapshot: &ObjectSnapshot) -> ReflectResult<bool> {
        if snapshot.class != self.class_name() {
            log::warn!(
                "Ignoring snapshot of '{}' applied to an instance of '{}'.",
                snapshot.class,
                self.class_name()
            );
            return Ok(false);
        }
        let chain = Arc::clone(&self.chain);
        let mut checked = Vec::with_capacity(snapshot.values.len());
        for (name, value) in &snapshot.values {
            let Some(attribute) = chain.find_attribute(name) else {
                log::debug!("Skipping unknown attribute '{name}' in snapshot.");
                continue;
            };
            if !attribute.is_writable() {
                return Err(ReflectError::ReadOnlyAttribute {
                    class: self.class_name().to_owned(),
                    attribute: name.clone(),
                });
            }
            self.check(attribute, value)?;
            checked.push((attribute, value));
        }
        for (attribute, value) in checked {
            self.write(attribute, value.clone())?;
        }
        Ok(true)
    }

    // --- Methods ---

    /// Invokes a method with prepared parameters.
    ///
    /// For non-void methods the return slot of `params` holds the result.
    pub fn call_method(&mut self, name: &str, params: &mut DynParams) -> ReflectResult<()> {
        let chain = Arc::clone(&self.chain);
        let method = chain
            .find_method(name)
            .ok_or_else(|| ReflectError::UnknownMethod {
                class: self.class_name().to_owned(),
                method: name.to_owned(),
            })?;
        if params.signature() != method.signature() {
            return Err(ReflectError::SignatureMismatch {
                target: format!("{}::{name}", self.class_name()),
                expected: method.signature().id(),
                found: params.signature_id(),
            });
        }
        (method.body)(self, params).map_err(|e| ReflectError::handler(name, e))
    }

    /// Invokes a method with positional arguments and returns its result.
    pub fn invoke(
        &mut self,
        name: &str,
        args: impl IntoIterator<Item = Value>,
    ) -> ReflectResult<Option<Value>> {
        let mut params = DynParams::new(self.method_signature(name)?);
        for (index, arg) in args.into_iter().enumerate() {
            params.set_parameter(index, arg)?;
        }
        self.call_method(name, &mut params)?;
        Ok(params.into_return_value())
    }

    /// Invokes a method with arguments given as a parameter string.
    pub fn call_method_str(&mut self, name: &str, input: &str) -> ReflectResult<Option<Value>> {
        let mut params = DynParams::from_param_string(self.method_signature(name)?, input)?;
        self.call_method(name, &mut params)?;
        Ok(params.into_return_value())
    }

    fn method_signature(&self, name: &str) -> ReflectResult<Signature> {
        self.chain
            .find_method(name)
            .map(|m| m.signature().clone())
            .ok_or_else(|| ReflectError::UnknownMethod {
                class: self.class_name().to_owned(),
                method: name.to_owned(),
            })
    }

    /// Invokes a slot directly, as an event would.
    pub fn call_slot(&mut self, name: &str, params: &mut DynParams) -> ReflectResult<()> {
        let chain = Arc::clone(&self.chain);
        let slot = chain.find_slot(name).ok_or_else(|| ReflectError::UnknownSlot {
            class: self.class_name().to_owned(),
            slot: name.to_owned(),
        })?;
        if params.signature() != slot.signature() {
            return Err(ReflectError::SignatureMismatch {
                target: format!("{}::{name}", self.class_name()),
                expected: slot.signature().id(),
                found: params.signature_id(),
            });
        }
        (slot.body)(self, params).map_err(|e| ReflectError::handler(name, e))
    }

    // --- Events ---

    /// The instance event named `name`, including the built-in `Destroyed`.
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }

    fn require_event(&self, name: &str) -> ReflectResult<&Event> {
        self.events.get(name).ok_or_else(|| ReflectError::UnknownEvent {
            class: self.class_name().to_owned(),
            event: name.to_owned(),
        })
    }

    /// Connects `handler` to an event. Returns `Ok(false)` if already connected.
    pub fn connect_event(&self, name: &str, handler: &EventHandler) -> ReflectResult<bool> {
        self.require_event(name)?.connect(handler)
    }

    /// Disconnects `handler` from an event. Returns `Ok(false)` if it was not connected.
    pub fn disconnect_event(&self, name: &str, handler: &EventHandler) -> ReflectResult<bool> {
        Ok(self.require_event(name)?.disconnect(handler))
    }

    /// Emits one of the object's events.
    pub fn emit_event(&self, name: &str, params: &mut DynParams) -> ReflectResult<()> {
        self.require_event(name)?.emit(params)
    }

    // --- Copying ---

    /// Copies the object: attribute values are copied, connections are not.
    ///
    /// The copy gets a new identity. Classes flagged non-copyable refuse with
    /// [`ReflectError::NotCopyable`].
    pub fn try_clone(&self) -> ReflectResult<Object> {
        if !self.chain.is_copyable() {
            return Err(ReflectError::NotCopyable(self.class_name().to_owned()));
        }
        Ok(Object {
            id: ObjectId::new(),
            chain: Arc::clone(&self.chain),
            values: self.values.clone(),
            events: Self::fresh_events(&self.chain),
        })
    }
}

/// Attributes that make up the restorable state of an object.
fn is_persistent(attribute: &AttributeDescriptor) -> bool {
    attribute.is_writable() && matches!(attribute.storage(), AttributeStorage::Direct)
}

/// Writes `name="value"`, escaping backslashes and double quotes so that
/// [`ParamsParser`] reads the value back unchanged.
fn quote_pair(name: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{name}=\"{escaped}\"")
}

impl fmt::Display for Object {
    /// Writes `Class Name="value" ...` with every writable stored attribute.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())?;
        for attribute in self.chain.attributes() {
            if !is_persistent(attribute) {
                continue;
            }
            match self.get_attribute(attribute.name()) {
                Ok(value) => write!(f, " {}", quote_pair(attribute.name(), &value.to_string()))?,
                Err(e) => log::warn!("Skipping '{}' while formatting: {e}", attribute.name()),
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("class", &self.class_name())
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        if let Some(event) = self.events.get(DESTROYED_EVENT) {
            if let Err(e) = event.emit(&mut DynParams::empty()) {
                log::error!(
                    "A '{DESTROYED_EVENT}' handler of {} ({}) failed: {e}",
                    self.class_name(),
                    self.id
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::value::ValueType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_class(
                ClassBuilder::new("Shape")
                    .attribute("Name", "shape")
                    .read_only_attribute("Sides", 0)
                    .enum_attribute("Fill", ["None", "Solid", "Hatched"], "None")
                    .method("Rename", Signature::void([ValueType::String]), |obj, p| {
                        let name = p.parameter(0).cloned().unwrap_or_default();
                        obj.set_attribute("Name", name)?;
                        Ok(())
                    })
                    .event("Changed", Signature::void([ValueType::String]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register_class(
                ClassBuilder::new("Square")
                    .base("Shape")
                    .attribute("Size", 1.0)
                    .computed_attribute(
                        "Area",
                        ValueType::Float,
                        |obj| {
                            let size = obj.get_attribute("Size")?.as_float().unwrap_or(0.0);
                            Ok(Value::Float(size * size))
                        },
                        |obj, value| {
                            let area = value.as_float().unwrap_or(0.0);
                            obj.set_attribute("Size", area.sqrt())?;
                            Ok(())
                        },
                    )
                    .computed_read_only_attribute("Perimeter", ValueType::Float, |obj| {
                        Ok(Value::Float(obj.get_attribute("Size")?.as_float().unwrap_or(0.0) * 4.0))
                    })
                    .method(
                        "Scale",
                        Signature::new(ValueType::Float, [ValueType::Float]),
                        |obj, p| {
                            let factor = p.parameter(0).and_then(Value::as_float).unwrap_or(1.0);
                            let size = obj.get_attribute("Size")?.as_float().unwrap_or(0.0);
                            obj.set_attribute("Size", size * factor)?;
                            p.set_return_value(size * factor)?;
                            Ok(())
                        },
                    )
                    .constructor([ValueType::Float], |obj, args| {
                        obj.store("Sides", 4)?;
                        obj.set_attribute("Size", args.parameter(0).cloned().unwrap_or_default())?;
                        Ok(())
                    })
                    .default_constructor()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_inherited_attributes_are_stored() {
        let registry = registry();
        let square = registry.create_default("Square").unwrap();
        assert_eq!(square.get_attribute("Name").unwrap(), Value::from("shape"));
        assert_eq!(square.get_attribute("Size").unwrap(), Value::Float(1.0));
        assert!(square.is_instance_of("Shape"));
        assert!(!square.is_instance_of("Circle"));
    }

    #[test]
    fn test_type_mismatch_leaves_value_unchanged() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        assert!(matches!(
            square.set_attribute("Size", "big"),
            Err(ReflectError::TypeMismatch { .. })
        ));
        assert_eq!(square.get_attribute("Size").unwrap(), Value::Float(1.0));
        assert!(matches!(
            square.set_attribute("Depth", 1.0),
            Err(ReflectError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_read_only_and_enum_rules() {
        let registry = registry();
        let mut square = registry
            .create_instance("Square", &DynParams::with_args([Value::Float(3.0)]))
            .unwrap();
        assert_eq!(square.get_attribute("Sides").unwrap(), Value::Int(4));
        assert!(matches!(
            square.set_attribute("Sides", 5),
            Err(ReflectError::ReadOnlyAttribute { .. })
        ));
        assert!(matches!(
            square.set_attribute("Perimeter", 1.0),
            Err(ReflectError::ReadOnlyAttribute { .. })
        ));

        square
            .set_attribute("Fill", Value::Enum("Solid".into()))
            .unwrap();
        assert!(matches!(
            square.set_attribute("Fill", Value::Enum("Dotted".into())),
            Err(ReflectError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_computed_attributes_route_through_accessors() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        square.set_attribute("Area", 16.0).unwrap();
        assert_eq!(square.get_attribute("Size").unwrap(), Value::Float(4.0));
        assert_eq!(square.get_attribute("Perimeter").unwrap(), Value::Float(16.0));
    }

    #[test]
    fn test_defaults_can_be_restored() {
        let registry = registry();
        let mut square = registry
            .create_instance("Square", &DynParams::with_args([Value::Float(2.0)]))
            .unwrap();
        assert!(!square.is_default("Size").unwrap());
        square.set_attribute_default("Size").unwrap();
        assert!(square.is_default("Size").unwrap());

        square.set_attribute("Name", "custom").unwrap();
        square.set_default_values().unwrap();
        assert!(square.is_default("Name").unwrap());
        assert!(square.is_default("Sides").unwrap());
    }

    #[test]
    fn test_methods_and_return_values() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();

        let result = square.invoke("Scale", [Value::Float(3.0)]).unwrap();
        assert_eq!(result, Some(Value::Float(3.0)));

        assert_eq!(square.call_method_str("Rename", "'big square'").unwrap(), None);
        assert_eq!(square.get_attribute("Name").unwrap(), Value::from("big square"));

        assert!(matches!(
            square.call_method("Explode", &mut DynParams::empty()),
            Err(ReflectError::UnknownMethod { .. })
        ));
        assert!(matches!(
            square.call_method("Scale", &mut DynParams::empty()),
            Err(ReflectError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn test_values_string_round_trip() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        square.set_attribute("Name", "tile").unwrap();
        square.set_attribute("Size", 2.5).unwrap();

        let text = square.values_string(false).unwrap();
        assert!(text.contains("Name=\"tile\""));
        assert!(!text.contains("Fill"));

        let mut other = registry.create_default("Square").unwrap();
        other.set_values(&text).unwrap();
        assert_eq!(other.get_attribute("Size").unwrap(), Value::Float(2.5));

        let rebuilt = Object::from_string(&registry, &square.to_string()).unwrap();
        assert_eq!(rebuilt.get_attribute("Name").unwrap(), Value::from("tile"));
        assert_ne!(rebuilt.id(), square.id());
    }

    #[test]
    fn test_values_with_mixed_quotes_round_trip() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        let name = r#"it's a "big" \ tile\"#;
        square.set_attribute("Name", name).unwrap();

        let mut other = registry.create_default("Square").unwrap();
        other
            .set_values(&square.values_string(false).unwrap())
            .unwrap();
        assert_eq!(other.get_attribute("Name").unwrap(), Value::from(name));

        let rebuilt = Object::from_string(&registry, &square.to_string()).unwrap();
        assert_eq!(
            rebuilt.get_attribute("Name").unwrap(),
            Value::from(name),
            "the formatted form must read back the same name"
        );
    }

    #[test]
    fn test_set_values_is_checked_before_writing() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        assert!(square.set_values("Name=\"new\" Size=wide").is_err());
        assert_eq!(square.get_attribute("Name").unwrap(), Value::from("shape"));
        assert!(square.set_values("positional").is_err());
    }

    #[test]
    fn test_snapshot_ignores_other_classes() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        square.set_attribute("Size", 5.0).unwrap();
        let snapshot = square.snapshot().unwrap();

        let mut copy = registry.create_default("Square").unwrap();
        assert!(copy.apply_snapshot(&snapshot).unwrap());
        assert_eq!(copy.get_attribute("Size").unwrap(), Value::Float(5.0));

        let mut shape = registry.create_default("Shape").unwrap();
        assert!(!shape.apply_snapshot(&snapshot).unwrap());
    }

    #[test]
    fn test_rejected_snapshot_leaves_object_unchanged() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        let mut snapshot = square.snapshot().unwrap();
        snapshot
            .values
            .insert("Name".to_owned(), Value::from("changed"));
        snapshot
            .values
            .insert("Size".to_owned(), Value::from("wide"));

        assert!(matches!(
            square.apply_snapshot(&snapshot),
            Err(ReflectError::TypeMismatch { .. })
        ));
        assert_eq!(
            square.get_attribute("Name").unwrap(),
            Value::from("shape"),
            "entries before the bad one must not be written"
        );
        assert_eq!(square.get_attribute("Size").unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_clone_copies_values_but_not_connections() {
        let registry = registry();
        let mut square = registry.create_default("Square").unwrap();
        square.set_attribute("Size", 7.0).unwrap();
        let handler = EventHandler::generic("watch", |_| Ok(()));
        assert!(square.connect_event("Changed", &handler).unwrap());
        assert!(!square.connect_event("Changed", &handler).unwrap());

        let copy = square.try_clone().unwrap();
        assert_eq!(copy.get_attribute("Size").unwrap(), Value::Float(7.0));
        assert_ne!(copy.id(), square.id());
        assert_eq!(copy.event("Changed").unwrap().handler_count(), 0);
        assert_eq!(square.event("Changed").unwrap().handler_count(), 1);
    }

    #[test]
    fn test_non_copyable_class_refuses_clone() {
        let mut registry = TypeRegistry::new();
        registry
            .register_class(ClassBuilder::new("FileHandle").non_copyable().build().unwrap())
            .unwrap();
        let handle = registry.create_default("FileHandle").unwrap();
        assert!(matches!(
            handle.try_clone(),
            Err(ReflectError::NotCopyable(name)) if name == "FileHandle"
        ));
    }

    #[test]
    fn test_destroyed_is_emitted_on_drop() {
        let registry = registry();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let handler = EventHandler::generic("on_destroyed", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let square = registry.create_default("Square").unwrap();
        square.connect_event(DESTROYED_EVENT, &handler).unwrap();
        assert_eq!(handler.event_count(), 1);
        drop(square);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(handler.event_count(), 0);
    }

    #[test]
    fn test_unknown_event_is_reported() {
        let registry = registry();
        let square = registry.create_default("Square").unwrap();
        let handler = EventHandler::generic("noop", |_| Ok(()));
        assert!(matches!(
            square.connect_event("Exploded", &handler),
            Err(ReflectError::UnknownEvent { .. })
        ));
    }
}
