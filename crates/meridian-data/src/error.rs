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

//! Error types of the resource layer.

use crate::resource::ResourceId;
use thiserror::Error;

/// A convenience alias for results produced by resource managers.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// An error raised by a [`ResourceManager`](crate::resource::ResourceManager)
/// or a [`ResourceHandler`](crate::resource::ResourceHandler).
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The factory could not construct the named resource. Nothing was cached.
    #[error("failed to create resource '{name}': {source}")]
    Creation {
        /// The requested resource name.
        name: String,
        /// The error reported by the factory.
        #[source]
        source: anyhow::Error,
    },

    /// A live resource already uses this name.
    #[error("a resource named '{0}' already exists")]
    DuplicateName(String),

    /// The id was removed, or belongs to another manager.
    #[error("resource id {0} is stale or foreign to this manager")]
    StaleId(ResourceId),
}
