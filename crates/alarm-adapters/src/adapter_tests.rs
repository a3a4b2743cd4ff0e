// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::scheduler::SchedulerError;
use alarm_core::FakeClock;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex as StdMutex;

#[derive(Default)]
struct FakeScheduler {
    scheduled: StdMutex<Vec<(AlarmId, u64, Json)>>,
    canceled: StdMutex<Vec<AlarmId>>,
    fail_next: StdMutex<bool>,
}

impl FakeScheduler {
    fn fail_next_schedule(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl AlarmScheduler for FakeScheduler {
    async fn schedule_xstate_alarm(&self, id: AlarmId, scheduled_at: u64, payload: Json) -> Result<(), SchedulerError> {
        if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
            return Err(SchedulerError("boom".to_string()));
        }
        self.scheduled.lock().unwrap().push((id, scheduled_at, payload));
        Ok(())
    }

    async fn cancel_alarm(&self, id: &AlarmId) -> Result<(), SchedulerError> {
        self.canceled.lock().unwrap().push(id.clone());
        Ok(())
    }
}

struct FakeActor {
    session_id: SessionId,
    sent: StdMutex<Vec<Json>>,
}

impl FakeActor {
    fn new(session_id: &str) -> Self {
        Self { session_id: SessionId::new(session_id), sent: StdMutex::new(vec![]) }
    }
}

impl ActorRef for FakeActor {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn send(&self, event: Json) {
        self.sent.lock().unwrap().push(event);
    }
}

struct FakeSystem {
    relay_available: bool,
    relayed: StdMutex<Vec<Json>>,
}

impl FakeSystem {
    fn new(relay_available: bool) -> Self {
        Self { relay_available, relayed: StdMutex::new(vec![]) }
    }
}

impl ActorSystem for FakeSystem {
    fn relay(&self, _source: &dyn ActorRef, _target: &dyn ActorRef, event: Json) -> bool {
        if self.relay_available {
            self.relayed.lock().unwrap().push(event);
        }
        self.relay_available
    }
}

fn clock_at(ms: u64) -> FakeClock {
    let clock = FakeClock::new();
    clock.set_epoch_ms(ms);
    clock
}

#[tokio::test]
async fn schedule_composes_id_and_indexes_entry() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(Arc::clone(&scheduler), clock_at(1_000));
    let source = FakeActor::new("sess-1");
    let target = FakeActor::new("sess-1");

    let alarm_id = adapter
        .schedule(&source, &target, json!({"type": "TICK"}), 500, Some("xstate.after.500.idle"))
        .await
        .unwrap();

    assert_eq!(alarm_id.as_str(), "xstate-sess-1.xstate.after.500.idle");
    assert!(adapter.index_contains("sess-1.xstate.after.500.idle"));

    let scheduled = scheduler.scheduled.lock().unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].0.as_str(), "xstate-sess-1.xstate.after.500.idle");
    assert_eq!(scheduled[0].1, 1_500);
}

#[tokio::test]
async fn schedule_without_event_key_generates_one() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(Arc::clone(&scheduler), clock_at(0));
    let actor = FakeActor::new("sess-1");

    adapter.schedule(&actor, &actor, json!({}), 10, None).await.unwrap();
    assert_eq!(adapter.index_len(), 1);
}

#[tokio::test]
async fn failed_schedule_removes_the_index_entry() {
    let scheduler = Arc::new(FakeScheduler::default());
    scheduler.fail_next_schedule();
    let adapter = TimerAdapter::new(Arc::clone(&scheduler), clock_at(0));
    let actor = FakeActor::new("sess-1");

    let err = adapter.schedule(&actor, &actor, json!({}), 10, Some("k")).await;
    assert!(err.is_err());
    assert_eq!(adapter.index_len(), 0);
}

#[tokio::test]
async fn cancel_removes_index_entry_and_calls_scheduler() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(Arc::clone(&scheduler), clock_at(0));
    let actor = FakeActor::new("sess-1");
    adapter.schedule(&actor, &actor, json!({}), 10, Some("k")).await.unwrap();

    adapter.cancel(&actor, "k").await.unwrap();
    assert_eq!(adapter.index_len(), 0);
    assert_eq!(scheduler.canceled.lock().unwrap().as_slice(), &[AlarmId::new("xstate-sess-1.k")]);
}

#[tokio::test]
async fn cancel_all_only_touches_matching_source_session() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(Arc::clone(&scheduler), clock_at(0));
    let a = FakeActor::new("sess-a");
    let b = FakeActor::new("sess-b");
    adapter.schedule(&a, &a, json!({}), 10, Some("k1")).await.unwrap();
    adapter.schedule(&a, &a, json!({}), 10, Some("k2")).await.unwrap();
    adapter.schedule(&b, &b, json!({}), 10, Some("k1")).await.unwrap();

    adapter.cancel_all(&a).await;

    assert_eq!(adapter.index_len(), 1);
    assert!(adapter.index_contains("sess-b.k1"));
    assert_eq!(scheduler.canceled.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn deliver_prefers_relay_and_removes_index_entry_first() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(Arc::clone(&scheduler), clock_at(0));
    let actor = FakeActor::new("sess-1");
    adapter.schedule(&actor, &actor, json!({"type": "TICK"}), 10, Some("k")).await.unwrap();

    let system = FakeSystem::new(true);
    let data = XStateAlarmData {
        event: json!({"type": "TICK"}),
        source_session_id: SessionId::new("sess-1"),
        target_session_id: SessionId::new("sess-1"),
        composed_id: "sess-1.k".to_string(),
        alarm_id: AlarmId::new("xstate-sess-1.k"),
    };

    adapter.deliver(&data, &actor, &system);

    assert_eq!(adapter.index_len(), 0);
    assert_eq!(system.relayed.lock().unwrap().as_slice(), &[json!({"type": "TICK"})]);
    assert!(actor.sent.lock().unwrap().is_empty(), "relay path should skip send fallback");
}

#[tokio::test]
async fn deliver_falls_back_to_send_when_relay_unavailable() {
    let actor = FakeActor::new("sess-1");
    let system = FakeSystem::new(false);
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(scheduler, clock_at(0));

    let data = XStateAlarmData {
        event: json!({"type": "TICK"}),
        source_session_id: SessionId::new("sess-1"),
        target_session_id: SessionId::new("sess-1"),
        composed_id: "sess-1.k".to_string(),
        alarm_id: AlarmId::new("xstate-sess-1.k"),
    };

    adapter.deliver(&data, &actor, &system);
    assert_eq!(actor.sent.lock().unwrap().as_slice(), &[json!({"type": "TICK"})]);
}

#[test]
fn restore_reindexes_future_alarms_and_skips_past_ones() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(scheduler, clock_at(0));

    let future_payload = json!({
        "event": {"type": "TICK"},
        "sourceSessionId": "sess-1",
        "targetSessionId": "sess-1",
        "composedId": "sess-1.future",
        "alarmId": "xstate-sess-1.future",
    });
    let past_payload = json!({
        "event": {"type": "TICK"},
        "sourceSessionId": "sess-1",
        "targetSessionId": "sess-1",
        "composedId": "sess-1.past",
        "alarmId": "xstate-sess-1.past",
    });

    let alarms = vec![
        Alarm {
            id: AlarmId::new("xstate-sess-1.future"),
            alarm_type: alarm_core::AlarmType::xstate_delay(),
            scheduled_at: 500,
            repeat_interval: None,
            payload: future_payload,
            created_at: 0,
        },
        Alarm {
            id: AlarmId::new("xstate-sess-1.past"),
            alarm_type: alarm_core::AlarmType::xstate_delay(),
            scheduled_at: 50,
            repeat_interval: None,
            payload: past_payload,
            created_at: 0,
        },
    ];

    adapter.restore(&alarms, 100);

    assert_eq!(adapter.index_len(), 1);
    assert!(adapter.index_contains("sess-1.future"));
    assert!(!adapter.index_contains("sess-1.past"));
}

#[test]
fn restore_skips_malformed_payloads() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(scheduler, clock_at(0));
    let alarms = vec![Alarm {
        id: AlarmId::new("xstate-bad"),
        alarm_type: alarm_core::AlarmType::xstate_delay(),
        scheduled_at: 500,
        repeat_interval: None,
        payload: json!({"not": "the right shape"}),
        created_at: 0,
    }];

    adapter.restore(&alarms, 0);
    assert_eq!(adapter.index_len(), 0);
}

#[test]
fn decode_payload_rejects_wrong_shape() {
    let scheduler = Arc::new(FakeScheduler::default());
    let adapter = TimerAdapter::new(scheduler, clock_at(0));

    let err = adapter.decode_payload(&json!({"not": "the right shape"})).unwrap_err();
    assert!(matches!(err, crate::error::DeliveryError::MalformedPayload(_)));
}
