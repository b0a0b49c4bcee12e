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

use crate::registry::ModuleId;
use serde::{Deserialize, Serialize};

/// A change to the contents of the type registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// A module was registered.
    ModuleLoaded {
        /// The id the registry assigned to it.
        id: ModuleId,
        /// The module name.
        name: String,
    },
    /// A module and all of its classes were removed.
    ModuleUnloaded {
        /// The id the module had.
        id: ModuleId,
        /// The module name.
        name: String,
    },
    /// A class was registered.
    ClassLoaded {
        /// The class name.
        name: String,
    },
    /// A class was removed.
    ClassUnloaded {
        /// The class name.
        name: String,
    },
}

/// Number of notifications an [`EventBus::new`] bus retains.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Manages a generic, thread-safe notification channel.
///
/// The registry publishes [`RegistryEvent`]s here; tools and editors observe
/// them through [`EventBus::subscribe`] or by draining the bus. The queue is
/// bounded: once it is full, publishing drops the oldest pending event, so a
/// bus nobody drains stays at its capacity.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + Sync + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
    capacity: usize,
}

impl<T: Clone + Send + Sync + 'static> EventBus<T> {
    /// Creates a bus retaining up to [`DEFAULT_BUS_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Creates a bus retaining up to `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = flume::bounded(capacity);
        log::debug!("Registry event bus initialized with capacity {capacity}.");
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// The maximum number of pending events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queues an event, dropping the oldest pending one if the queue is full.
    pub fn publish(&self, event: T) {
        log::trace!("Publishing a registry notification.");

        let mut event = event;
        loop {
            match self.sender.try_send(event) {
                Ok(()) => return,
                Err(flume::TrySendError::Full(rejected)) => {
                    if self.receiver.try_recv().is_ok() {
                        log::trace!("Notification queue full; dropped the oldest entry.");
                    }
                    event = rejected;
                }
                Err(flume::TrySendError::Disconnected(_)) => {
                    log::error!("Failed to send notification: receiver disconnected.");
                    return;
                }
            }
        }
    }

    /// Returns a clone of the sender end of the channel.
    ///
    /// Sending through it directly blocks while the queue is full; use
    /// [`publish`](Self::publish) to get drop-oldest behaviour.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a receiver sharing this bus's queue.
    ///
    /// Receivers compete for events: each event is delivered to exactly one of them.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        self.receiver.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Removes and returns every pending event, in publication order.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// The number of pending events.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
