// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between the Timer Adapter and the Alarm Manager.
//!
//! `alarm-engine` depends on `alarm-adapters` (the Wakeup Handler dispatches
//! `xstate-delay` alarms to `TimerAdapter::deliver`), so the adapter cannot
//! hold a concrete `alarm_engine::AlarmManager` without a dependency cycle.
//! This narrow trait is the inverted seam: `alarm-engine::AlarmManager`
//! implements it, and `TimerAdapter` is generic over it.

use alarm_core::AlarmId;
use async_trait::async_trait;
use serde_json::Value as Json;

/// What the Timer Adapter needs from the Alarm Manager: insert an
/// `xstate-delay` alarm keyed by its derived id, and cancel by that id.
#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    async fn schedule_xstate_alarm(&self, id: AlarmId, scheduled_at: u64, payload: Json) -> Result<(), SchedulerError>;

    async fn cancel_alarm(&self, id: &AlarmId) -> Result<(), SchedulerError>;
}

/// Opaque error surface for `AlarmScheduler` failures. The adapter only
/// needs to log these (spec §4.3: "Errors from AM are logged and cause the
/// in-memory index entry to be removed"); it never interprets the cause.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SchedulerError(pub String);
