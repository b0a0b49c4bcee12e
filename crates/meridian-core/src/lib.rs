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

//! # Meridian Core
//!
//! Runtime reflection: classes are described once with a [`ClassBuilder`],
//! registered in a [`TypeRegistry`], and their instances are then driven
//! entirely by name through [`Object`]. Methods and events exchange
//! arguments as [`DynParams`], checked against a [`Signature`] at every
//! boundary.

#![warn(missing_docs)]

pub mod class;
pub mod error;
pub mod event;
pub mod func;
pub mod object;
pub mod params;
pub mod registry;
pub mod signature;
pub mod value;

pub use class::{ClassBuilder, ClassChain, ClassDescriptor};
pub use error::{ReflectError, ReflectResult};
pub use event::{Event, EventBus, EventHandler, RegistryEvent};
pub use func::{DynFunc, FnCallable};
pub use object::{bind_slot, share, Object, ObjectId, ObjectSnapshot, SharedObject};
pub use params::DynParams;
pub use registry::{
    ModuleId, ModuleInfo, ModuleRegistrar, ModuleRegistration, ReflectionContext, TypeRegistry,
};
pub use signature::Signature;
pub use value::{Value, ValueType};

#[doc(hidden)]
pub use inventory;
