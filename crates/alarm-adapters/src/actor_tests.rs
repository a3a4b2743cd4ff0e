// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;
use serde_json::json;

struct FakeActor {
    session_id: SessionId,
    sent: Mutex<Vec<Json>>,
}

impl ActorRef for FakeActor {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn send(&self, event: Json) {
        self.sent.lock().push(event);
    }
}

struct RelayingSystem {
    relay_available: bool,
}

impl ActorSystem for RelayingSystem {
    fn relay(&self, _source: &dyn ActorRef, _target: &dyn ActorRef, _event: Json) -> bool {
        self.relay_available
    }
}

#[test]
fn send_records_the_event() {
    let actor = FakeActor { session_id: SessionId::new("sess-1"), sent: Mutex::new(vec![]) };
    actor.send(json!({"type": "TICK"}));
    assert_eq!(actor.sent.lock().as_slice(), &[json!({"type": "TICK"})]);
}

struct FakeRegistry {
    known: SessionId,
}

impl ActorRegistry for FakeRegistry {
    fn resolve(&self, session_id: &SessionId) -> Option<Arc<dyn ActorRef>> {
        if session_id == &self.known {
            Some(Arc::new(FakeActor { session_id: self.known.clone(), sent: Mutex::new(vec![]) }))
        } else {
            None
        }
    }
}

#[test]
fn registry_resolves_known_session_only() {
    let registry = FakeRegistry { known: SessionId::new("sess-1") };
    assert!(registry.resolve(&SessionId::new("sess-1")).is_some());
    assert!(registry.resolve(&SessionId::new("sess-2")).is_none());
}

#[test]
fn relay_reports_availability() {
    let actor = FakeActor { session_id: SessionId::new("sess-1"), sent: Mutex::new(vec![]) };
    let available = RelayingSystem { relay_available: true };
    let unavailable = RelayingSystem { relay_available: false };
    assert!(available.relay(&actor, &actor, json!({})));
    assert!(!unavailable.relay(&actor, &actor, json!({})));
}
