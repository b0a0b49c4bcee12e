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

//! Immutable descriptions of reflected classes and their members.

use crate::object::Object;
use crate::params::DynParams;
use crate::registry::ModuleId;
use crate::signature::Signature;
use crate::value::{Value, ValueType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The body of a method or slot: runs against the receiving object.
pub type MethodBody =
    Arc<dyn Fn(&mut Object, &mut DynParams) -> anyhow::Result<()> + Send + Sync>;

/// The body of a constructor: initializes a freshly defaulted object.
pub type ConstructorBody = Arc<dyn Fn(&mut Object, &DynParams) -> anyhow::Result<()> + Send + Sync>;

/// Reads a computed attribute.
pub type Getter = Arc<dyn Fn(&Object) -> anyhow::Result<Value> + Send + Sync>;

/// Writes a computed attribute.
pub type Setter = Arc<dyn Fn(&mut Object, Value) -> anyhow::Result<()> + Send + Sync>;

/// Whether an attribute can be written through the generic interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Readable and writable.
    #[default]
    ReadWrite,
    /// Readable only; native code may still write it with [`Object::store`].
    ReadOnly,
}

/// Where an attribute's value lives.
#[derive(Clone)]
pub enum AttributeStorage {
    /// The value is stored inside the object.
    Direct,
    /// The value is produced by a getter and optionally consumed by a setter.
    Computed {
        /// Produces the current value.
        getter: Getter,
        /// Accepts a new value. `None` makes the attribute read-only.
        setter: Option<Setter>,
    },
}

impl fmt::Debug for AttributeStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeStorage::Direct => f.write_str("Direct"),
            AttributeStorage::Computed { setter, .. } => f
                .debug_struct("Computed")
                .field("writable", &setter.is_some())
                .finish(),
        }
    }
}

/// A named, typed property of a class.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    pub(crate) name: String,
    pub(crate) value_type: ValueType,
    pub(crate) default: Value,
    pub(crate) access: AccessMode,
    pub(crate) storage: AttributeStorage,
    pub(crate) description: String,
    pub(crate) enum_values: Vec<String>,
}

impl AttributeDescriptor {
    /// A directly stored attribute whose type follows its default value.
    pub fn direct(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            value_type: default.value_type(),
            default,
            access: AccessMode::ReadWrite,
            storage: AttributeStorage::Direct,
            description: String::new(),
            enum_values: Vec::new(),
        }
    }

    /// Marks the attribute read-only.
    pub fn read_only(mut self) -> Self {
        self.access = AccessMode::ReadOnly;
        self
    }

    /// Sets the human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type tag.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The default value.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The access mode.
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// The storage strategy.
    pub fn storage(&self) -> &AttributeStorage {
        &self.storage
    }

    /// Returns `true` if the generic interface may write this attribute.
    pub fn is_writable(&self) -> bool {
        self.access == AccessMode::ReadWrite
            && !matches!(
                self.storage,
                AttributeStorage::Computed { setter: None, .. }
            )
    }

    /// The description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The closed list of variants of an enum attribute (empty otherwise).
    pub fn enum_values(&self) -> &[String] {
        &self.enum_values
    }
}

/// A named, invocable operation of a class.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) description: String,
    pub(crate) body: MethodBody,
}

impl MethodDescriptor {
    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter and return types.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature.id())
            .finish_non_exhaustive()
    }
}

/// A named event every instance of the class exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescriptor {
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) description: String,
}

impl EventDescriptor {
    /// The event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signature handlers must accept.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A named member that can be bound as an [`EventHandler`](crate::EventHandler).
#[derive(Clone)]
pub struct EventHandlerDescriptor {
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) body: MethodBody,
}

impl EventHandlerDescriptor {
    /// The slot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signature of events this slot accepts.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for EventHandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlerDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature.id())
            .finish_non_exhaustive()
    }
}

/// One way of constructing an instance.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub(crate) signature: Signature,
    pub(crate) body: Option<ConstructorBody>,
}

impl ConstructorDescriptor {
    /// The argument types, as a void signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns `true` if the constructor accepts exactly these argument types.
    pub fn accepts(&self, args: &DynParams) -> bool {
        self.signature.params() == args.signature().params()
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("signature", &self.signature.id())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// The reflected description of one class.
///
/// Built with [`ClassBuilder`](crate::ClassBuilder) and immutable once
/// registered. Members are stored in declaration order; inherited members are
/// resolved through a [`ClassChain`](crate::ClassChain).
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub(crate) name: String,
    pub(crate) base: Option<String>,
    pub(crate) description: String,
    pub(crate) properties: BTreeMap<String, String>,
    pub(crate) attributes: Vec<AttributeDescriptor>,
    pub(crate) methods: Vec<MethodDescriptor>,
    pub(crate) events: Vec<EventDescriptor>,
    pub(crate) slots: Vec<EventHandlerDescriptor>,
    pub(crate) constructors: Vec<ConstructorDescriptor>,
    pub(crate) copyable: bool,
    pub(crate) module: Option<ModuleId>,
}

impl ClassDescriptor {
    /// The unique class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The base class name, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// The description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Free-form properties declared by this class only.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Attributes declared by this class only.
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Methods declared by this class only.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Events declared by this class only.
    pub fn events(&self) -> &[EventDescriptor] {
        &self.events
    }

    /// Slots declared by this class only.
    pub fn slots(&self) -> &[EventHandlerDescriptor] {
        &self.slots
    }

    /// Constructors. These are never inherited.
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// Whether this class's own state may be copied.
    pub fn is_copyable(&self) -> bool {
        self.copyable
    }

    /// The module that registered the class, if any.
    pub fn module(&self) -> Option<ModuleId> {
        self.module
    }

    /// Finds the constructor accepting exactly the types of `args`.
    ///
    /// A class that declares no constructor has an implicit default one.
    pub fn find_constructor(&self, args: &DynParams) -> Option<Option<&ConstructorBody>> {
        if self.constructors.is_empty() {
            return args.is_empty().then_some(None);
        }
        self.constructors
            .iter()
            .find(|ctor| ctor.accepts(args))
            .map(|ctor| ctor.body.as_ref())
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub(crate) fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub(crate) fn event(&self, name: &str) -> Option<&EventDescriptor> {
        self.events.iter().find(|e| e.name == name)
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&EventHandlerDescriptor> {
        self.slots.iter().find(|s| s.name == name)
    }
}
