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

use super::Resource;

/// Constructs resources on demand from their name.
///
/// Every closure `Fn(&str) -> anyhow::Result<T>` is a factory.
pub trait ResourceFactory<T: Resource>: Send + Sync {
    /// Creates the resource called `name`.
    ///
    /// An error means the resource cannot exist under this name; the manager
    /// reports it and caches nothing.
    fn create_resource(&self, name: &str) -> anyhow::Result<T>;
}

impl<T, F> ResourceFactory<T> for F
where
    T: Resource,
    F: Fn(&str) -> anyhow::Result<T> + Send + Sync,
{
    fn create_resource(&self, name: &str) -> anyhow::Result<T> {
        self(name)
    }
}
