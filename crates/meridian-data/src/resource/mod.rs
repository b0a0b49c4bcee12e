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

//! Resources, their managers and the handlers that observe them.

mod factory;
mod handler;
mod id;
mod manager;

pub use self::factory::ResourceFactory;
pub use self::handler::ResourceHandler;
pub use self::id::ResourceId;
pub use self::manager::ResourceManager;

/// A marker trait for types that can be owned by a [`ResourceManager`].
///
/// The supertraits let managers be shared between threads behind a lock and
/// kept for the lifetime of the application.
///
/// # Examples
///
/// ```
/// use meridian_data::Resource;
///
/// #[derive(Resource)]
/// struct Texture {
///     width: u32,
///     height: u32,
/// }
/// ```
pub trait Resource: Send + Sync + 'static {}
