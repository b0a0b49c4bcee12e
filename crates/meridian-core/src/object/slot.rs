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

use super::Object;
use crate::error::{ReflectError, ReflectResult};
use crate::event::EventHandler;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

/// An object shared between an owner and the event handlers bound to its slots.
pub type SharedObject = Arc<Mutex<Object>>;

/// Wraps an object so its slots can be bound.
pub fn share(object: Object) -> SharedObject {
    Arc::new(Mutex::new(object))
}

/// Builds an [`EventHandler`] that runs the slot `slot` of `object`.
///
/// The handler holds the object weakly: once the object is dropped the
/// handler does nothing. If the object is locked when the event fires (for
/// instance because it is the emitter), the handler fails instead of
/// deadlocking.
pub fn bind_slot(object: &SharedObject, slot: &str) -> ReflectResult<EventHandler> {
    let (class, signature) = {
        let guard = object.lock().unwrap_or_else(PoisonError::into_inner);
        let descriptor = guard
            .chain()
            .find_slot(slot)
            .ok_or_else(|| ReflectError::UnknownSlot {
                class: guard.class_name().to_owned(),
                slot: slot.to_owned(),
            })?;
        (guard.class_name().to_owned(), descriptor.signature().clone())
    };

    let weak = Arc::downgrade(object);
    let slot_name = slot.to_owned();
    let label = format!("{class}::{slot}");
    Ok(EventHandler::new(label, signature, move |params| {
        let Some(object) = weak.upgrade() else {
            return Ok(());
        };
        let mut guard = match object.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                anyhow::bail!("object is busy and cannot receive '{slot_name}'")
            }
        };
        guard.call_slot(&slot_name, params)?;
        Ok(())
    }))
}
