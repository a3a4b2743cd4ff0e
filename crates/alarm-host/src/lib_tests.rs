// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use alarm_adapters::ActorRef;
use alarm_core::{FakeClock, SessionId};
use serde_json::{json, Value as Json};
use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

struct FakeActor {
    session_id: SessionId,
}

impl ActorRef for FakeActor {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn send(&self, _event: Json) {}
}

struct FakeRegistry {
    actors: StdMutex<HashMap<String, Arc<dyn ActorRef>>>,
}

impl FakeRegistry {
    fn new() -> Arc<Self> {
        Arc::new(Self { actors: StdMutex::new(HashMap::new()) })
    }

    fn insert(&self, actor: Arc<dyn ActorRef>) {
        self.actors.lock().unwrap().insert(actor.session_id().as_str().to_string(), actor);
    }
}

impl ActorRegistry for FakeRegistry {
    fn resolve(&self, session_id: &SessionId) -> Option<Arc<dyn ActorRef>> {
        self.actors.lock().unwrap().get(session_id.as_str()).cloned()
    }
}

struct FakeSystem;

impl ActorSystem for FakeSystem {
    fn relay(&self, _source: &dyn ActorRef, _target: &dyn ActorRef, _event: Json) -> bool {
        false
    }
}

fn test_config(dir: &tempfile::TempDir, persisted: bool, retention_interval_ms: u64) -> Config {
    Config { enable_alarms: true, persisted, retention_interval_ms, db_path: dir.path().join("alarms.db") }
}

#[tokio::test]
async fn disabled_alarms_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let config = Config { enable_alarms: false, ..test_config(&dir, true, 300_000) };

    let host = AlarmHost::start(
        config,
        Arc::new(alarm_engine::FakeWakeup::new()),
        clock,
        FakeRegistry::new(),
        Arc::new(FakeSystem),
    )
    .await
    .unwrap();

    assert!(host.is_none());
}

#[tokio::test]
async fn cold_start_schedules_cache_cleanup_once() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let config = test_config(&dir, true, 1_000);

    let host = AlarmHost::start(
        config.clone(),
        Arc::new(alarm_engine::FakeWakeup::new()),
        clock.clone(),
        FakeRegistry::new(),
        Arc::new(FakeSystem),
    )
    .await
    .unwrap()
    .unwrap();

    let alarms = host.store().list_alarms().await.unwrap();
    assert_eq!(alarms.len(), 1);
    assert!(alarms[0].alarm_type.is_cache_cleanup());
    assert_eq!(alarms[0].scheduled_at, 1_001_000);
    drop(host);

    // Reopening against the same database must not duplicate the alarm.
    let host2 = AlarmHost::start(
        config,
        Arc::new(alarm_engine::FakeWakeup::new()),
        clock,
        FakeRegistry::new(),
        Arc::new(FakeSystem),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(host2.store().list_alarms().await.unwrap().len(), 1);
}

#[tokio::test]
async fn skips_cache_cleanup_when_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let config = test_config(&dir, false, 1_000);

    let host = AlarmHost::start(
        config,
        Arc::new(alarm_engine::FakeWakeup::new()),
        clock,
        FakeRegistry::new(),
        Arc::new(FakeSystem),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(host.store().list_alarms().await.unwrap().is_empty());
}

#[tokio::test]
async fn cold_start_restores_future_xstate_delay_into_adapter_index() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let config = test_config(&dir, false, 0);
    let registry = FakeRegistry::new();
    let actor: Arc<dyn ActorRef> = Arc::new(FakeActor { session_id: SessionId::new("sess-1") });
    registry.insert(Arc::clone(&actor));

    let host1 = AlarmHost::start(
        config.clone(),
        Arc::new(alarm_engine::FakeWakeup::new()),
        clock.clone(),
        registry.clone(),
        Arc::new(FakeSystem),
    )
    .await
    .unwrap()
    .unwrap();
    host1.adapter().schedule(actor.as_ref(), actor.as_ref(), json!({"type": "TICK"}), 5_000, Some("k")).await.unwrap();
    drop(host1);

    let host2 = AlarmHost::start(
        config,
        Arc::new(alarm_engine::FakeWakeup::new()),
        clock,
        registry,
        Arc::new(FakeSystem),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(host2.adapter().index_contains("sess-1.k"));
}

#[tokio::test]
async fn on_wakeup_delivers_due_xstate_delay() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let config = test_config(&dir, false, 0);
    let registry = FakeRegistry::new();
    let actor: Arc<dyn ActorRef> = Arc::new(FakeActor { session_id: SessionId::new("sess-1") });
    registry.insert(Arc::clone(&actor));

    let host = AlarmHost::start(
        config,
        Arc::new(alarm_engine::FakeWakeup::new()),
        clock.clone(),
        registry,
        Arc::new(FakeSystem),
    )
    .await
    .unwrap()
    .unwrap();
    host.adapter().schedule(actor.as_ref(), actor.as_ref(), json!({"type": "TICK"}), 1_000, Some("k")).await.unwrap();

    clock.advance(std::time::Duration::from_millis(1_000));
    let results = host.on_wakeup().await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].deleted);
}
