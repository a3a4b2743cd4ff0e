// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the host crate.

use std::path::PathBuf;

use crate::error::HostError;

/// Resolve the state directory the alarm database lives under:
/// `ALARM_STATE_DIR` > `XDG_STATE_HOME/alarms` > `~/.local/state/alarms`.
pub fn state_dir() -> Result<PathBuf, HostError> {
    if let Ok(dir) = std::env::var("ALARM_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("alarms"));
    }
    let home = std::env::var("HOME").map_err(|_| HostError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/alarms"))
}

/// `ALARM_ENABLE_ALARMS`, default `true`.
pub fn enable_alarms() -> bool {
    std::env::var("ALARM_ENABLE_ALARMS").ok().and_then(|s| s.parse().ok()).unwrap_or(true)
}

/// `ALARM_PERSISTED`, default `true`.
pub fn persisted() -> bool {
    std::env::var("ALARM_PERSISTED").ok().and_then(|s| s.parse().ok()).unwrap_or(true)
}

/// `ALARM_RETENTION_INTERVAL_MS`, default `300_000` (5 minutes), matching
/// spec.md §6's `retentionIntervalMs` default.
pub fn retention_interval_ms() -> u64 {
    std::env::var("ALARM_RETENTION_INTERVAL_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(300_000)
}
