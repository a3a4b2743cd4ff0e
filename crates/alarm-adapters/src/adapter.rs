// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Timer Adapter (spec §4.3): bridges the FSM library's pluggable timer
//! interface to the durable alarm queue, and holds the advisory in-memory
//! index of scheduled delays.

use std::collections::HashMap;
use std::sync::Arc;

use alarm_core::{composed_id, random_short_id, xstate_alarm_id, Alarm, AlarmId, Clock, SessionId};
use parking_lot::Mutex;
use serde_json::{json, Value as Json};
use tracing::{instrument, warn};

use crate::actor::{ActorRef, ActorSystem};
use crate::error::DeliveryError;
use crate::event::{ScheduledEventRef, XStateAlarmData};
use crate::scheduler::AlarmScheduler;

/// Implements the FSM library's `schedule`/`cancel`/`cancelAll` timer
/// contract by translating each call into an `AlarmScheduler` (Alarm
/// Manager) operation, keyed by `{sessionId}.{fsmEventKey}` (spec §3).
///
/// The in-memory index (`ScheduledEventRef` map) lives as a field here, not
/// as module-global state, per the design note in spec §9. It is a cache:
/// on any inconsistency with the `alarms` table, the table wins.
pub struct TimerAdapter<S: AlarmScheduler, C: Clock> {
    scheduler: Arc<S>,
    clock: C,
    index: Mutex<HashMap<String, ScheduledEventRef>>,
}

/// Mirrors `spec.md` §6's `createAlarmScheduler(alarmManager, system) ->
/// {schedule, cancel, cancelAll}` factory — in Rust, just `TimerAdapter::new`.
pub fn create_alarm_scheduler<S: AlarmScheduler, C: Clock>(scheduler: Arc<S>, clock: C) -> TimerAdapter<S, C> {
    TimerAdapter::new(scheduler, clock)
}

impl<S: AlarmScheduler, C: Clock> TimerAdapter<S, C> {
    pub fn new(scheduler: Arc<S>, clock: C) -> Self {
        Self { scheduler, clock, index: Mutex::new(HashMap::new()) }
    }

    /// Number of entries currently tracked by the in-memory index. Exposed
    /// for tests that need to inspect the index through the adapter
    /// instance rather than module-global state (spec §9).
    pub fn index_len(&self) -> usize {
        self.index.lock().len()
    }

    pub fn index_contains(&self, composed: &str) -> bool {
        self.index.lock().contains_key(composed)
    }

    /// `schedule(source, target, event, delay, fsmEventKey?)` (spec §4.3).
    /// Builds the composed id, derives the alarm id, records the index
    /// entry, then schedules via the `AlarmScheduler`. On scheduler failure
    /// the index entry is removed and the error is returned to the caller
    /// (who, per spec §7, has nothing further to do with it but log).
    #[instrument(skip(self, source, target, event), fields(source = %source.session_id()))]
    pub async fn schedule(
        &self,
        source: &dyn ActorRef,
        target: &dyn ActorRef,
        event: Json,
        delay: u64,
        fsm_event_key: Option<&str>,
    ) -> Result<AlarmId, DeliveryError> {
        let key = fsm_event_key.map(str::to_string).unwrap_or_else(random_short_id);
        let composed = composed_id(source.session_id().as_str(), &key);
        let alarm_id = xstate_alarm_id(&composed);
        let now = self.clock.epoch_ms();

        self.index.lock().insert(
            composed.clone(),
            ScheduledEventRef {
                source_session_id: source.session_id().clone(),
                target_session_id: target.session_id().clone(),
                event: event.clone(),
                delay,
                started_at: now,
            },
        );

        let payload = json!({
            "type": event.get("type").cloned().unwrap_or(Json::Null),
            "sourceSessionId": source.session_id().as_str(),
            "targetSessionId": target.session_id().as_str(),
            "event": event,
            "composedId": composed,
            "alarmId": alarm_id.as_str(),
        });

        match self.scheduler.schedule_xstate_alarm(alarm_id.clone(), now + delay, payload).await {
            Ok(()) => Ok(alarm_id),
            Err(e) => {
                self.index.lock().remove(&composed);
                warn!(composed_id = %composed, error = %e, "alarm schedule failed, index entry removed");
                Err(DeliveryError::Scheduler(e))
            }
        }
    }

    /// `cancel(source, fsmEventKey)` (spec §4.3).
    #[instrument(skip(self, source))]
    pub async fn cancel(&self, source: &dyn ActorRef, fsm_event_key: &str) -> Result<(), DeliveryError> {
        let composed = composed_id(source.session_id().as_str(), fsm_event_key);
        let alarm_id = xstate_alarm_id(&composed);
        self.index.lock().remove(&composed);
        self.scheduler.cancel_alarm(&alarm_id).await.map_err(DeliveryError::Scheduler)
    }

    /// `cancelAll(actorRef)` (spec §4.3): scan the index for entries whose
    /// source session matches, remove each, and cancel its alarm. Scheduler
    /// failures for individual entries are logged and do not stop the scan.
    #[instrument(skip(self, actor_ref))]
    pub async fn cancel_all(&self, actor_ref: &dyn ActorRef) {
        let session = actor_ref.session_id().clone();
        let matching: Vec<(String, AlarmId)> = {
            let index = self.index.lock();
            index
                .iter()
                .filter(|(_, r)| r.source_session_id == session)
                .map(|(composed, _)| (composed.clone(), xstate_alarm_id(composed)))
                .collect()
        };

        for (composed, alarm_id) in matching {
            self.index.lock().remove(&composed);
            if let Err(e) = self.scheduler.cancel_alarm(&alarm_id).await {
                warn!(composed_id = %composed, error = %e, "cancelAll: alarm cancel failed");
            }
        }
    }

    /// Restore-on-cold-start (spec §4.3): for each persisted `xstate-delay`
    /// alarm whose deadline is still in the future, reconstruct the index
    /// entry from its payload. Alarms already past deadline are left for
    /// the next wakeup drain to deliver — they are not re-added here.
    #[instrument(skip(self, alarms))]
    pub fn restore(&self, alarms: &[Alarm], now: u64) {
        let mut index = self.index.lock();
        for alarm in alarms {
            if !alarm.alarm_type.is_xstate_delay() || alarm.scheduled_at <= now {
                continue;
            }
            let data: XStateAlarmData = match serde_json::from_value(alarm.payload.clone()) {
                Ok(d) => d,
                Err(e) => {
                    warn!(alarm.id = %alarm.id, error = %e, "skipping malformed xstate-delay payload during restore");
                    continue;
                }
            };
            index.insert(
                data.composed_id,
                ScheduledEventRef {
                    source_session_id: data.source_session_id,
                    target_session_id: data.target_session_id,
                    event: data.event,
                    delay: alarm.scheduled_at.saturating_sub(now),
                    started_at: now,
                },
            );
        }
    }

    /// Delivery (spec §4.3): remove the index entry first, then prefer the
    /// actor system's internal relay primitive, falling back to
    /// `target.send` when no relay primitive is available.
    #[instrument(skip(self, data, target, system))]
    pub fn deliver(&self, data: &XStateAlarmData, target: &dyn ActorRef, system: &dyn ActorSystem) {
        self.index.lock().remove(&data.composed_id);
        if !system.relay(target, target, data.event.clone()) {
            target.send(data.event.clone());
        }
    }

    /// Decode a fired `xstate-delay` alarm's raw JSON payload into the
    /// shape `deliver` expects. The Wakeup Handler decodes through this
    /// rather than calling `serde_json::from_value` itself, since
    /// `XStateAlarmData` and its malformed-payload error are owned by this
    /// crate.
    pub fn decode_payload(&self, payload: &Json) -> Result<XStateAlarmData, DeliveryError> {
        serde_json::from_value(payload.clone()).map_err(|e| DeliveryError::MalformedPayload(e.to_string()))
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
