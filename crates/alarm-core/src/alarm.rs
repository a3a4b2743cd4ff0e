// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Alarm` entity and its key-formation rules.
//!
//! Key formation is bit-exact by design: tests assert on the literal strings
//! these functions produce, so a composed id or derived alarm id must never
//! change shape without a matching spec update.

use crate::id::AlarmId;
use serde::{Deserialize, Serialize};

/// A single scheduled wakeup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub alarm_type: AlarmType,
    /// Absolute wall-clock deadline, ms since epoch.
    pub scheduled_at: u64,
    /// If set, firing reschedules at `now + repeat_interval` instead of
    /// deleting the row. Always `> 0` when present.
    pub repeat_interval: Option<u64>,
    pub payload: serde_json::Value,
    pub created_at: u64,
}

impl Alarm {
    /// Validates the invariants from the data model: `repeat_interval`
    /// absent or strictly positive.
    pub fn validate(&self) -> Result<(), AlarmValidationError> {
        if let Some(interval) = self.repeat_interval {
            if interval == 0 {
                return Err(AlarmValidationError::NonPositiveRepeatInterval);
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AlarmValidationError {
    #[error("repeat_interval must be > 0 when present")]
    NonPositiveRepeatInterval,
}

/// The alarm type tag.
///
/// Open for extension (any string is a valid `AlarmType`), closed for
/// dispatch (the Wakeup Handler recognizes exactly the two built-ins below;
/// everything else is handed to a user handler verbatim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmType(smol_str::SmolStr);

impl AlarmType {
    pub const XSTATE_DELAY: &'static str = "xstate-delay";
    pub const CACHE_CLEANUP: &'static str = "cache-cleanup";

    pub fn new(s: impl AsRef<str>) -> Self {
        Self(smol_str::SmolStr::new(s.as_ref()))
    }

    pub fn xstate_delay() -> Self {
        Self::new(Self::XSTATE_DELAY)
    }

    pub fn cache_cleanup() -> Self {
        Self::new(Self::CACHE_CLEANUP)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_xstate_delay(&self) -> bool {
        self.0 == Self::XSTATE_DELAY
    }

    pub fn is_cache_cleanup(&self) -> bool {
        self.0 == Self::CACHE_CLEANUP
    }
}

impl std::fmt::Display for AlarmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for AlarmType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Compose the `{sessionId}.{fsmEventKey}` identifier used to key a
/// scheduled FSM delayed event.
pub fn composed_id(session_id: &str, fsm_event_key: &str) -> String {
    format!("{session_id}.{fsm_event_key}")
}

/// Derive the persisted `alarms.id` for an xstate-delay composed id.
pub fn xstate_alarm_id(composed_id: &str) -> AlarmId {
    AlarmId::new(format!("xstate-{composed_id}"))
}

#[cfg(test)]
#[path = "alarm_tests.rs"]
mod tests;
