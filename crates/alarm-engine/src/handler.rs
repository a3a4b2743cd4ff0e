// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The handler contract `handleDue` invokes per due alarm, and the result
//! record it returns in drain order (spec §4.2 step 5).

use alarm_core::{AlarmId, AlarmType};
use async_trait::async_trait;

/// Outcome of a single handler invocation. Failures are captured here rather
/// than propagated — spec §7 requires the drain to swallow handler errors
/// and continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Ok,
    Failed(String),
}

impl HandlerOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, HandlerOutcome::Failed(_))
    }
}

/// Dispatched once per due alarm, after the alarm has already been deleted
/// or rescheduled in storage (spec §4.2: mutation precedes the handler call,
/// so a crash mid-handler never causes redelivery).
#[async_trait]
pub trait AlarmHandler: Send + Sync {
    async fn handle(&self, alarm: &alarm_core::Alarm) -> HandlerOutcome;
}

/// Per-alarm result of a `handleDue` drain, returned in drain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainResult {
    pub id: AlarmId,
    pub alarm_type: AlarmType,
    pub rescheduled: bool,
    pub deleted: bool,
}
