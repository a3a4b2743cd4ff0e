// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Alarm Manager: the persisted queue plus the single platform wakeup
//! slot it multiplexes N logical alarms onto (spec §4.2).

use std::sync::Arc;

use alarm_core::{Alarm, AlarmId, AlarmType, Clock};
use alarm_storage::{SqlDriver, Store};
use parking_lot::Mutex;
use serde_json::Value as Json;
use tracing::instrument;

use crate::error::AlarmError;
use crate::handler::{AlarmHandler, DrainResult, HandlerOutcome};
use crate::platform::PlatformWakeup;

/// Parameters for scheduling a new alarm. `created_at` is stamped from the
/// injected clock, never supplied by the caller, so tests can control it.
#[derive(Debug, Clone)]
pub struct ScheduleAlarm {
    pub id: AlarmId,
    pub alarm_type: AlarmType,
    pub scheduled_at: u64,
    pub repeat_interval: Option<u64>,
    pub payload: Json,
}

/// The volatile `{currentArmedId, currentArmedTime}` fields describing the
/// slot's last-requested state (spec §4.2).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmedState {
    pub id: Option<AlarmId>,
    pub scheduled_at: Option<u64>,
}

/// Owns the union of the persisted queue and the single platform wakeup
/// slot. Generic over the storage driver, the wakeup slot, and the clock so
/// it can be exercised with a `:memory:` `Store`, a `FakeWakeup`, and a
/// `FakeClock` (spec §8) without touching a real host.
pub struct AlarmManager<D: SqlDriver, W: PlatformWakeup, C: Clock> {
    store: Arc<Store<D>>,
    wakeup: Arc<W>,
    clock: C,
    armed: Mutex<ArmedState>,
}

impl<D: SqlDriver, W: PlatformWakeup, C: Clock> AlarmManager<D, W, C> {
    pub fn new(store: Arc<Store<D>>, wakeup: Arc<W>, clock: C) -> Self {
        Self { store, wakeup, clock, armed: Mutex::new(ArmedState::default()) }
    }

    /// Insert the alarm, then rearm. Fails only if the PL insert fails
    /// (e.g. a duplicate id) — no silent upsert.
    #[instrument(skip(self, opts), fields(alarm.id = %opts.id))]
    pub async fn schedule(&self, opts: ScheduleAlarm) -> Result<(), AlarmError> {
        let alarm = Alarm {
            id: opts.id,
            alarm_type: opts.alarm_type,
            scheduled_at: opts.scheduled_at,
            repeat_interval: opts.repeat_interval,
            payload: opts.payload,
            created_at: self.clock.epoch_ms(),
        };
        self.store.insert_alarm(&alarm).await?;
        self.rearm().await?;
        Ok(())
    }

    /// Delete via PL. Only rearms if the canceled id was the currently
    /// armed one; otherwise this is cheap (no slot churn).
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: &AlarmId) -> Result<(), AlarmError> {
        self.store.delete_alarm(id).await?;
        let was_armed = self.armed.lock().id.as_ref() == Some(id);
        if was_armed {
            self.rearm().await?;
        }
        Ok(())
    }

    /// Bulk delete by type, then rearm unconditionally.
    #[instrument(skip(self))]
    pub async fn cancel_by_type(&self, alarm_type: &AlarmType) -> Result<u64, AlarmError> {
        let count = self.store.delete_alarms_by_type(alarm_type).await?;
        self.rearm().await?;
        Ok(count)
    }

    /// Read-through to PL, payload already parsed. Read-only; never rearms.
    #[instrument(skip(self))]
    pub async fn list_pending(&self) -> Result<Vec<Alarm>, AlarmError> {
        Ok(self.store.list_alarms().await?)
    }

    /// Alarms due at or before `before` (defaults to now). Read-only.
    #[instrument(skip(self))]
    pub async fn list_due(&self, before: Option<u64>) -> Result<Vec<Alarm>, AlarmError> {
        let before = before.unwrap_or_else(|| self.clock.epoch_ms());
        Ok(self.store.due_alarms(before).await?)
    }

    /// The core drain (spec §4.2 step 5). `now` is read once at entry and
    /// used for every decision in this invocation. Recurring alarms are
    /// rescheduled to `now + repeat_interval` (a single reschedule, with no
    /// catch-up for missed intervals — spec §9); non-recurring alarms are
    /// deleted. Either mutation happens *before* the handler is invoked, so
    /// a crash mid-handler never causes a redelivery (at-most-once). Handler
    /// failures are logged and do not abort the drain.
    #[instrument(skip(self, handler))]
    pub async fn handle_due(&self, handler: &dyn AlarmHandler) -> Result<Vec<DrainResult>, AlarmError> {
        let now = self.clock.epoch_ms();
        let due = self.store.due_alarms(now).await?;
        let mut results = Vec::with_capacity(due.len());

        for alarm in due {
            let (rescheduled, deleted) = match alarm.repeat_interval {
                Some(interval) => {
                    let mut updated = alarm.clone();
                    updated.scheduled_at = now + interval;
                    self.store.update_alarm(&updated).await?;
                    (true, false)
                }
                None => {
                    self.store.delete_alarm(&alarm.id).await?;
                    (false, true)
                }
            };

            let outcome = handler.handle(&alarm).await;
            if let HandlerOutcome::Failed(reason) = &outcome {
                tracing::warn!(alarm.id = %alarm.id, alarm.type = %alarm.alarm_type, reason, "alarm handler failed");
            }

            results.push(DrainResult {
                id: alarm.id,
                alarm_type: alarm.alarm_type,
                rescheduled,
                deleted,
            });
        }

        self.rearm().await?;
        Ok(results)
    }

    /// Arm the slot for the earliest pending alarm, if its deadline differs
    /// from what's currently armed. With no pending alarms, the volatile
    /// fields are cleared and the slot is left as-is — the platform offers
    /// no disarm primitive (spec §9).
    #[instrument(skip(self))]
    pub async fn rearm(&self) -> Result<(), AlarmError> {
        let earliest = self.store.earliest_alarm().await?;
        let mut armed = self.armed.lock();
        match earliest {
            None => *armed = ArmedState::default(),
            Some(alarm) => {
                let unchanged =
                    armed.id.as_ref() == Some(&alarm.id) && armed.scheduled_at == Some(alarm.scheduled_at);
                if !unchanged {
                    self.wakeup.arm(alarm.scheduled_at);
                    armed.id = Some(alarm.id);
                    armed.scheduled_at = Some(alarm.scheduled_at);
                }
            }
        }
        Ok(())
    }

    pub fn current_armed(&self) -> ArmedState {
        self.armed.lock().clone()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
