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
    AccessMode, AttributeDescriptor, AttributeStorage, ClassDescriptor, ConstructorDescriptor,
    EventDescriptor, EventHandlerDescriptor, Getter, MethodDescriptor, Setter,
};
use crate::error::{ReflectError, ReflectResult};
use crate::object::{Object, DESTROYED_EVENT};
use crate::params::DynParams;
use crate::signature::Signature;
use crate::value::{Value, ValueType};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// A fluent builder for [`ClassDescriptor`]s.
///
/// # Example
///
/// ```rust
/// use meridian_core::{ClassBuilder, Signature, Value, ValueType};
///
/// let widget = ClassBuilder::new("Widget")
///     .attribute("Count", 0)
///     .method("Increment", Signature::void([]), |obj, _| {
///         let count = obj.get_attribute("Count")?.as_int().unwrap_or(0);
///         obj.set_attribute("Count", count + 1)?;
///         Ok(())
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(widget.attributes().len(), 1);
/// ```
pub struct ClassBuilder {
    descriptor: ClassDescriptor,
}

impl ClassBuilder {
    /// Starts a class with the given unique name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ClassDescriptor {
                name: name.into(),
                base: None,
                description: String::new(),
                properties: BTreeMap::new(),
                attributes: Vec::new(),
                methods: Vec::new(),
                events: Vec::new(),
                slots: Vec::new(),
                constructors: Vec::new(),
                copyable: true,
                module: None,
            },
        }
    }

    /// Names the base class.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.descriptor.base = Some(base.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    /// Adds a free-form property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.properties.insert(key.into(), value.into());
        self
    }

    /// Adds a read-write, directly stored attribute typed after `default`.
    pub fn attribute(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.attribute_descriptor(AttributeDescriptor::direct(name, default))
    }

    /// Adds a read-only, directly stored attribute.
    pub fn read_only_attribute(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.attribute_descriptor(AttributeDescriptor::direct(name, default).read_only())
    }

    /// Adds a read-write attribute backed by a getter and a setter.
    pub fn computed_attribute<G, S>(
        self,
        name: impl Into<String>,
        value_type: ValueType,
        getter: G,
        setter: S,
    ) -> Self
    where
        G: Fn(&Object) -> anyhow::Result<Value> + Send + Sync + 'static,
        S: Fn(&mut Object, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.computed(name.into(), value_type, Arc::new(getter), Some(Arc::new(setter)))
    }

    /// Adds a read-only attribute backed by a getter.
    pub fn computed_read_only_attribute<G>(
        self,
        name: impl Into<String>,
        value_type: ValueType,
        getter: G,
    ) -> Self
    where
        G: Fn(&Object) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.computed(name.into(), value_type, Arc::new(getter), None)
    }

    fn computed(
        self,
        name: String,
        value_type: ValueType,
        getter: Getter,
        setter: Option<Setter>,
    ) -> Self {
        let access = if setter.is_some() {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };
        self.attribute_descriptor(AttributeDescriptor {
            name,
            value_type,
            default: value_type.default_value(),
            access,
            storage: AttributeStorage::Computed { getter, setter },
            description: String::new(),
            enum_values: Vec::new(),
        })
    }

    /// Adds an enum attribute restricted to `variants`.
    pub fn enum_attribute<I, V>(self, name: impl Into<String>, variants: I, default: &str) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attribute_descriptor(AttributeDescriptor {
            name: name.into(),
            value_type: ValueType::Enum,
            default: Value::Enum(default.to_owned()),
            access: AccessMode::ReadWrite,
            storage: AttributeStorage::Direct,
            description: String::new(),
            enum_values: variants.into_iter().map(Into::into).collect(),
        })
    }

    /// Adds a fully specified attribute.
    pub fn attribute_descriptor(mut self, attribute: AttributeDescriptor) -> Self {
        self.descriptor.attributes.push(attribute);
        self
    }

    /// Adds a method.
    pub fn method<F>(mut self, name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&mut Object, &mut DynParams) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.descriptor.methods.push(MethodDescriptor {
            name: name.into(),
            signature,
            description: String::new(),
            body: Arc::new(body),
        });
        self
    }

    /// Adds an event.
    pub fn event(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.descriptor.events.push(EventDescriptor {
            name: name.into(),
            signature,
            description: String::new(),
        });
        self
    }

    /// Adds a slot: a member that can be bound to events as a handler.
    pub fn slot<F>(mut self, name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&mut Object, &mut DynParams) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.descriptor.slots.push(EventHandlerDescriptor {
            name: name.into(),
            signature,
            body: Arc::new(body),
        });
        self
    }

    /// Adds a constructor taking arguments of the given types.
    pub fn constructor<I, F>(mut self, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = ValueType>,
        F: Fn(&mut Object, &DynParams) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.descriptor.constructors.push(ConstructorDescriptor {
            signature: Signature::void(params),
            body: Some(Arc::new(body)),
        });
        self
    }

    /// Adds a constructor without arguments that leaves every attribute at its default.
    pub fn default_constructor(mut self) -> Self {
        self.descriptor.constructors.push(ConstructorDescriptor {
            signature: Signature::default(),
            body: None,
        });
        self
    }

    /// Flags the class as identity-bearing: instances refuse to be copied.
    pub fn non_copyable(mut self) -> Self {
        self.descriptor.copyable = false;
        self
    }

    /// Validates and returns the descriptor.
    pub fn build(self) -> ReflectResult<ClassDescriptor> {
        let descriptor = self.descriptor;
        let invalid = |reason: String| ReflectError::InvalidDescriptor {
            class: descriptor.name.clone(),
            reason,
        };

        if descriptor.name.trim().is_empty() {
            return Err(invalid("class name is empty".to_owned()));
        }
        if descriptor.base.as_deref() == Some(descriptor.name.as_str()) {
            return Err(invalid("class cannot derive from itself".to_owned()));
        }

        check_unique("attribute", descriptor.attributes.iter().map(|a| &a.name))
            .map_err(&invalid)?;
        check_unique("method", descriptor.methods.iter().map(|m| &m.name)).map_err(&invalid)?;
        check_unique("event", descriptor.events.iter().map(|e| &e.name)).map_err(&invalid)?;
        check_unique("slot", descriptor.slots.iter().map(|s| &s.name)).map_err(&invalid)?;

        let mut ctor_signatures = HashSet::new();
        for ctor in &descriptor.constructors {
            if !ctor_signatures.insert(ctor.signature.id()) {
                return Err(invalid(format!(
                    "duplicate constructor '{}'",
                    ctor.signature
                )));
            }
        }

        if descriptor.event(DESTROYED_EVENT).is_some() {
            return Err(invalid(format!(
                "event name '{DESTROYED_EVENT}' is reserved"
            )));
        }

        for attribute in &descriptor.attributes {
            if attribute.value_type == ValueType::Void {
                return Err(invalid(format!(
                    "attribute '{}' has no value type",
                    attribute.name
                )));
            }
            if attribute.default.value_type() != attribute.value_type {
                return Err(invalid(format!(
                    "default of attribute '{}' is {}, declared {}",
                    attribute.name,
                    attribute.default.value_type(),
                    attribute.value_type
                )));
            }
            if attribute.value_type == ValueType::Enum {
                let default = attribute.default.as_str().unwrap_or_default();
                if !attribute.enum_values.iter().any(|v| v == default) {
                    return Err(invalid(format!(
                        "default '{default}' of enum attribute '{}' is not a declared variant",
                        attribute.name
                    )));
                }
            }
        }

        Ok(descriptor)
    }
}

fn check_unique<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a String>,
) -> Result<(), String> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(format!("{kind} with an empty name"));
        }
        if !seen.insert(name.as_str()) {
            return Err(format!("duplicate {kind} '{name}'"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_records_members_in_order() {
        let class = ClassBuilder::new("Panel")
            .base("Widget")
            .description("A container")
            .property("Category", "Layout")
            .attribute("Width", 100)
            .attribute("Title", "untitled")
            .event("Resized", Signature::void([ValueType::Int]))
            .default_constructor()
            .build()
            .unwrap();

        assert_eq!(class.name(), "Panel");
        assert_eq!(class.base(), Some("Widget"));
        let names: Vec<_> = class.attributes().iter().map(|a| a.name()).collect();
        assert_eq!(names, ["Width", "Title"]);
        assert_eq!(class.properties()["Category"], "Layout");
        assert!(class.is_copyable());
        assert_eq!(class.module(), None);
    }

    #[test]
    fn test_duplicate_members_are_rejected() {
        let err = ClassBuilder::new("Twice")
            .attribute("A", 1)
            .attribute("A", 2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ReflectError::InvalidDescriptor { .. }));

        assert!(ClassBuilder::new("Twice")
            .default_constructor()
            .default_constructor()
            .build()
            .is_err());
    }

    #[test]
    fn test_default_must_match_declared_type() {
        let mismatched = AttributeDescriptor {
            value_type: ValueType::Float,
            ..AttributeDescriptor::direct("Speed", 1)
        };
        assert!(ClassBuilder::new("Car")
            .attribute_descriptor(mismatched)
            .build()
            .is_err());
    }

    #[test]
    fn test_enum_default_must_be_a_variant() {
        assert!(ClassBuilder::new("Light")
            .enum_attribute("Kind", ["Point", "Spot"], "Area")
            .build()
            .is_err());
        let ok = ClassBuilder::new("Light")
            .enum_attribute("Kind", ["Point", "Spot"], "Spot")
            .build()
            .unwrap();
        assert_eq!(ok.attributes()[0].enum_values().len(), 2);
    }

    #[test]
    fn test_self_inheritance_and_empty_names_are_rejected() {
        assert!(ClassBuilder::new("Loop").base("Loop").build().is_err());
        assert!(ClassBuilder::new("  ").build().is_err());
        assert!(ClassBuilder::new("Reserved")
            .event(DESTROYED_EVENT, Signature::void([]))
            .build()
            .is_err());
    }

    #[test]
    fn test_implicit_default_constructor() {
        let bare = ClassBuilder::new("Bare").build().unwrap();
        assert!(bare.find_constructor(&DynParams::empty()).is_some());
        assert!(bare
            .find_constructor(&DynParams::with_args([Value::Int(1)]))
            .is_none());

        let explicit = ClassBuilder::new("Sized")
            .constructor([ValueType::Int], |_, _| Ok(()))
            .build()
            .unwrap();
        assert!(explicit.find_constructor(&DynParams::empty()).is_none());
    }
}
