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

use std::fmt;

/// Identifies one resource inside one [`ResourceManager`](super::ResourceManager).
///
/// It combines a slot index with a generation count. When a resource is
/// removed its slot can be recycled, but the generation is incremented, so an
/// old id never aliases the new resource. The `owner` tag names the manager
/// that issued the id, so ids are never accepted by another manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub(crate) owner: u32,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ResourceId {
    /// The slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of the slot when this id was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}v{}", self.owner, self.index, self.generation)
    }
}
