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

//! # Meridian Data
//!
//! Named, manager-owned resources. A [`ResourceManager`] creates each
//! resource once per name through its [`ResourceFactory`] and owns it
//! exclusively; consumers keep a [`ResourceHandler`], a weak reference that
//! is cleared when the resource goes away.
//!
//! Managers are not internally synchronized: every mutation takes
//! `&mut self`, so a manager shared between threads needs an outer lock.

#![warn(missing_docs)]

// Lets `#[derive(Resource)]` refer to `::meridian_data` inside this crate too.
extern crate self as meridian_data;

pub mod error;
pub mod manager_registry;
pub mod resource;
pub mod settings;

pub use error::{ResourceError, ResourceResult};
pub use manager_registry::ManagerRegistry;
pub use resource::{Resource, ResourceFactory, ResourceHandler, ResourceId, ResourceManager};
pub use settings::ResourceSettings;

pub use meridian_macros::Resource;
