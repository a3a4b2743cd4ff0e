// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ScheduledEventRef` (spec §3): the in-memory-only index entry the Timer
//! Adapter rebuilds from persisted `xstate-delay` alarms on cold start. It
//! is advisory — the `alarms` table is authoritative, and this struct is
//! never itself persisted.

use alarm_core::{AlarmId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEventRef {
    pub source_session_id: SessionId,
    pub target_session_id: SessionId,
    pub event: Json,
    pub delay: u64,
    pub started_at: u64,
}

/// The payload shape an `xstate-delay` alarm carries, parsed at delivery
/// time by the Wakeup Handler and handed to `TimerAdapter::deliver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XStateAlarmData {
    pub event: Json,
    pub source_session_id: SessionId,
    pub target_session_id: SessionId,
    pub composed_id: String,
    pub alarm_id: AlarmId,
}
