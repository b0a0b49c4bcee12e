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

use crate::error::{ReflectError, ReflectResult};
use crate::func::{DynFunc, FnCallable};
use crate::params::DynParams;
use crate::signature::Signature;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct EventShared {
    name: String,
    signature: Signature,
    handlers: Mutex<Vec<Arc<HandlerShared>>>,
}

struct HandlerShared {
    func: Box<dyn DynFunc>,
    events: Mutex<Vec<Weak<EventShared>>>,
}

/// A named notification point with a fixed signature.
///
/// An `Event` keeps the set of [`EventHandler`]s connected to it. The relation
/// is many-to-many and is not ownership: dropping either side removes the
/// relation from the other side.
///
/// Handlers are invoked in an unspecified order.
pub struct Event {
    shared: Arc<EventShared>,
}

impl Event {
    /// Creates an event with no connected handlers.
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            shared: Arc::new(EventShared {
                name: name.into(),
                signature,
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The event name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The event signature.
    pub fn signature(&self) -> &Signature {
        &self.shared.signature
    }

    /// Connects `handler`.
    ///
    /// Returns `Ok(false)` if it was already connected. A handler with a
    /// non-empty signature must match the event signature.
    pub fn connect(&self, handler: &EventHandler) -> ReflectResult<bool> {
        let handler_signature = handler.signature();
        let event_signature = self.shared.signature.id();
        if !handler_signature.is_empty() && handler_signature != event_signature {
            return Err(ReflectError::SignatureMismatch {
                target: self.shared.name.clone(),
                expected: event_signature,
                found: handler_signature,
            });
        }

        let mut handlers = lock(&self.shared.handlers);
        if handlers.iter().any(|h| Arc::ptr_eq(h, &handler.shared)) {
            return Ok(false);
        }
        handlers.push(Arc::clone(&handler.shared));
        lock(&handler.shared.events).push(Arc::downgrade(&self.shared));
        Ok(true)
    }

    /// Disconnects `handler`. Returns `false` if it was not connected.
    pub fn disconnect(&self, handler: &EventHandler) -> bool {
        let mut handlers = lock(&self.shared.handlers);
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, &handler.shared));
        if handlers.len() == before {
            return false;
        }
        forget_event(&handler.shared, &self.shared);
        true
    }

    /// Disconnects every handler.
    pub fn disconnect_all(&self) {
        let handlers = std::mem::take(&mut *lock(&self.shared.handlers));
        for handler in &handlers {
            forget_event(handler, &self.shared);
        }
    }

    /// Returns `true` if `handler` is connected.
    pub fn is_connected(&self, handler: &EventHandler) -> bool {
        lock(&self.shared.handlers)
            .iter()
            .any(|h| Arc::ptr_eq(h, &handler.shared))
    }

    /// The number of connected handlers.
    pub fn handler_count(&self) -> usize {
        lock(&self.shared.handlers).len()
    }

    /// Invokes every connected handler with `params`.
    ///
    /// The handler set is snapshotted first, so handlers may connect or
    /// disconnect while the event is being emitted; a handler disconnected by
    /// an earlier one is skipped. The first handler error stops the emission
    /// and is returned unchanged.
    pub fn emit(&self, params: &mut DynParams) -> ReflectResult<()> {
        if params.signature() != &self.shared.signature {
            return Err(ReflectError::SignatureMismatch {
                target: self.shared.name.clone(),
                expected: self.shared.signature.id(),
                found: params.signature_id(),
            });
        }

        let snapshot: Vec<Arc<HandlerShared>> = lock(&self.shared.handlers).clone();
        log::trace!(
            "Emitting '{}' to {} handler(s).",
            self.shared.name,
            snapshot.len()
        );

        for handler in snapshot {
            let still_connected = lock(&self.shared.handlers)
                .iter()
                .any(|h| Arc::ptr_eq(h, &handler));
            if still_connected {
                handler.func.call(params)?;
            }
        }
        Ok(())
    }

    /// Parses `input` against the event signature and emits it.
    pub fn emit_string(&self, input: &str) -> ReflectResult<()> {
        let mut params = DynParams::from_param_string(self.shared.signature.clone(), input)?;
        self.emit(&mut params)
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.shared.name)
            .field("signature", &self.shared.signature.id())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// Removes `event` from the connection set of `handler`.
fn forget_event(handler: &HandlerShared, event: &Arc<EventShared>) {
    lock(&handler.events).retain(|w| !std::ptr::eq(w.as_ptr(), Arc::as_ptr(event)));
}

/// A receiver that can be connected to any number of [`Event`]s.
///
/// Dropping the handler disconnects it from every event it is connected to
/// before its callable is released, so no event keeps a dangling entry.
pub struct EventHandler {
    shared: Arc<HandlerShared>,
}

impl EventHandler {
    /// Creates a handler from any [`DynFunc`].
    pub fn from_func(func: impl DynFunc + 'static) -> Self {
        Self {
            shared: Arc::new(HandlerShared {
                func: Box::new(func),
                events: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a handler that only connects to events with `signature`.
    pub fn new<F>(label: impl Into<String>, signature: Signature, func: F) -> Self
    where
        F: Fn(&mut DynParams) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_func(FnCallable::typed(label, signature, func))
    }

    /// Creates a handler without a signature that connects to any event.
    pub fn generic<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut DynParams) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_func(FnCallable::generic(label, func))
    }

    /// The handler's signature string (empty for generic handlers).
    pub fn signature(&self) -> String {
        self.shared.func.signature()
    }

    /// The number of live events this handler is connected to.
    pub fn event_count(&self) -> usize {
        lock(&self.shared.events)
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Disconnects from every event.
    pub fn disconnect_all(&self) {
        // Drain from the front until the set is empty.
        loop {
            let next = {
                let mut events = lock(&self.shared.events);
                if events.is_empty() {
                    break;
                }
                events.remove(0)
            };
            if let Some(event) = next.upgrade() {
                lock(&event.handlers).retain(|h| !Arc::ptr_eq(h, &self.shared));
            }
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("signature", &self.signature())
            .field("events", &self.event_count())
            .finish()
    }
}
