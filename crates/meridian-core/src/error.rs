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

//! Defines the error type shared by every reflection operation.

use crate::value::ValueType;
use thiserror::Error;

/// A convenience alias for results produced by the reflection layer.
pub type ReflectResult<T> = Result<T, ReflectError>;

/// An error raised by the type registry, the object layer or dynamic invocation.
///
/// All of these are local, synchronous failures. Nothing in the reflection
/// layer retries an operation on its own; the caller decides whether to fall
/// back to a default, skip a feature, or abort.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// A class with the same name is already registered.
    #[error("class '{0}' is already registered")]
    DuplicateClass(String),

    /// The requested class is not registered.
    #[error("class '{0}' is not registered")]
    UnknownClass(String),

    /// A class names a base class that is not (or no longer) registered.
    #[error("class '{class}' derives from unregistered base class '{base}'")]
    MissingBaseClass {
        /// The class whose base could not be resolved.
        class: String,
        /// The missing base class name.
        base: String,
    },

    /// Walking the base-class chain revisited a class.
    #[error("inheritance cycle detected at class '{0}'")]
    InheritanceCycle(String),

    /// The requested module id is not registered.
    #[error("module {0} is not registered")]
    UnknownModule(u32),

    /// No constructor of the class accepts the given arguments.
    #[error("class '{class}' has no constructor accepting '{signature}'")]
    NoSuchConstructor {
        /// The class being instantiated.
        class: String,
        /// The signature of the supplied arguments.
        signature: String,
    },

    /// The attribute is not declared anywhere in the class chain.
    #[error("class '{class}' has no attribute '{attribute}'")]
    UnknownAttribute {
        /// The class of the object.
        class: String,
        /// The attribute name that was looked up.
        attribute: String,
    },

    /// The attribute cannot be written through the generic interface.
    #[error("attribute '{attribute}' of class '{class}' is read-only")]
    ReadOnlyAttribute {
        /// The class of the object.
        class: String,
        /// The attribute name.
        attribute: String,
    },

    /// A value's type tag does not match the tag expected by the target.
    #[error("type mismatch for '{target}': expected {expected}, found {found}")]
    TypeMismatch {
        /// What was being written (attribute, parameter slot, return slot).
        target: String,
        /// The declared type tag.
        expected: ValueType,
        /// The type tag of the supplied value.
        found: ValueType,
    },

    /// An enum attribute received a variant it does not declare.
    #[error("'{value}' is not a valid variant of enum attribute '{attribute}'")]
    InvalidEnumValue {
        /// The attribute name.
        attribute: String,
        /// The rejected variant.
        value: String,
    },

    /// The method is not declared anywhere in the class chain.
    #[error("class '{class}' has no method '{method}'")]
    UnknownMethod {
        /// The class of the object.
        class: String,
        /// The method name.
        method: String,
    },

    /// The event is not declared anywhere in the class chain.
    #[error("class '{class}' has no event '{event}'")]
    UnknownEvent {
        /// The class of the object.
        class: String,
        /// The event name.
        event: String,
    },

    /// The slot (event handler member) is not declared anywhere in the class chain.
    #[error("class '{class}' has no slot '{slot}'")]
    UnknownSlot {
        /// The class of the object.
        class: String,
        /// The slot name.
        slot: String,
    },

    /// Two signatures that must agree differ.
    #[error("signature mismatch for '{target}': expected '{expected}', found '{found}'")]
    SignatureMismatch {
        /// The callable or event involved.
        target: String,
        /// The declared signature.
        expected: String,
        /// The signature that was supplied.
        found: String,
    },

    /// A parameter slot index is outside the declared arity.
    #[error("parameter index {index} is out of range for arity {arity}")]
    ParameterIndex {
        /// The requested index.
        index: usize,
        /// The number of declared parameters.
        arity: usize,
    },

    /// The class is flagged as identity-bearing and cannot be copied.
    #[error("instances of class '{0}' cannot be copied")]
    NotCopyable(String),

    /// A descriptor was rejected while being built.
    #[error("invalid descriptor for class '{class}': {reason}")]
    InvalidDescriptor {
        /// The class being built.
        class: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A textual value could not be converted to the requested type.
    #[error("cannot parse '{input}' as {expected}")]
    Parse {
        /// The offending text.
        input: String,
        /// The type it should have converted to.
        expected: ValueType,
    },

    /// A parameter string (`Name='value' ...`) is malformed.
    #[error("malformed parameter string '{input}': {reason}")]
    MalformedParams {
        /// The full parameter string.
        input: String,
        /// What went wrong.
        reason: String,
    },

    /// A native method, constructor, accessor or event handler body failed.
    #[error("'{target}' failed: {source}")]
    Handler {
        /// The member that was running.
        target: String,
        /// The error raised by the body.
        #[source]
        source: anyhow::Error,
    },
}

impl ReflectError {
    pub(crate) fn handler(target: impl Into<String>, source: anyhow::Error) -> Self {
        ReflectError::Handler {
            target: target.into(),
            source,
        }
    }
}
