// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `AlarmManager` as the `alarm_adapters::AlarmScheduler` implementation —
//! the inverted seam described in `alarm_adapters::scheduler` that lets the
//! Timer Adapter call back into the Alarm Manager without a crate cycle.

use alarm_adapters::{AlarmScheduler, SchedulerError};
use alarm_core::{AlarmId, AlarmType, Clock};
use alarm_storage::SqlDriver;
use async_trait::async_trait;
use serde_json::Value as Json;

use crate::manager::{AlarmManager, ScheduleAlarm};
use crate::platform::PlatformWakeup;

#[async_trait]
impl<D: SqlDriver, W: PlatformWakeup, C: Clock> AlarmScheduler for AlarmManager<D, W, C> {
    async fn schedule_xstate_alarm(&self, id: AlarmId, scheduled_at: u64, payload: Json) -> Result<(), SchedulerError> {
        self.schedule(ScheduleAlarm {
            id,
            alarm_type: AlarmType::xstate_delay(),
            scheduled_at,
            repeat_interval: None,
            payload,
        })
        .await
        .map_err(|e| SchedulerError(e.to_string()))
    }

    async fn cancel_alarm(&self, id: &AlarmId) -> Result<(), SchedulerError> {
        self.cancel(id).await.map_err(|e| SchedulerError(e.to_string()))
    }
}
