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

//! Event primitives.
//!
//! Two kinds of events live here. [`Event`] and [`EventHandler`] form the
//! synchronous, signature-checked connection graph that reflected objects
//! expose. [`EventBus`] is a queued channel the type registry uses to
//! announce module and class changes.

mod bus;
mod dispatch;

pub use self::bus::{EventBus, RegistryEvent, DEFAULT_BUS_CAPACITY};
pub use self::dispatch::{Event, EventHandler};
