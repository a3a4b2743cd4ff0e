// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The FSM library's actor surface (spec §6), modeled as two small traits
//! rather than a concrete dependency on any particular FSM crate. No FSM
//! evaluation semantics live here — only the capabilities the Timer Adapter
//! needs to deliver a fired delay back into the machine.

use std::sync::Arc;

use alarm_core::SessionId;
use serde_json::Value as Json;

/// A reference to one running FSM actor instance.
pub trait ActorRef: Send + Sync {
    fn session_id(&self) -> &SessionId;

    /// The public fallback delivery path, used when the actor system has no
    /// internal relay primitive available.
    fn send(&self, event: Json);
}

/// The FSM library's actor system, exposing the internal "relay" primitive
/// the adapter prefers over `ActorRef::send` when available.
pub trait ActorSystem: Send + Sync {
    /// Attempt delivery via the internal relay primitive. Returns `false`
    /// when no relay primitive is available, signaling the caller to fall
    /// back to `target.send(event)` (spec §4.3).
    fn relay(&self, source: &dyn ActorRef, target: &dyn ActorRef, event: Json) -> bool;
}

/// Resolves a live actor reference by session id. Owned by the surrounding
/// runtime (FSM actor lifecycle is out of scope here); the Wakeup Handler
/// uses it to find the delivery target named in a fired alarm's payload.
pub trait ActorRegistry: Send + Sync {
    fn resolve(&self, session_id: &SessionId) -> Option<Arc<dyn ActorRef>>;
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
