// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use crate::env;
use crate::error::HostError;

/// Recognized construction-time options (spec §6).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// When `false`, the core is bypassed and the FSM's native timer is used
    /// instead (spec §6). Default `true`.
    pub enable_alarms: bool,
    /// Whether the surrounding runtime writes FSM snapshots. When `false`,
    /// there is nothing for the `cache-cleanup` retention sweep to prune, so
    /// `AlarmHost::start` does not schedule it. Default `true`.
    pub persisted: bool,
    /// Period, in ms, for the internal `cache-cleanup` recurring alarm.
    /// Default `300_000` (spec §6).
    pub retention_interval_ms: u64,
    /// Path to the SQLite file backing the `alarms`/`actor_meta`/`snapshots`
    /// tables. Not part of spec.md's configuration surface — this crate owns
    /// no other file or socket layout, unlike the surrounding runtime.
    pub db_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables, with the defaults
    /// named in spec.md §6.
    pub fn load() -> Result<Self, HostError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            enable_alarms: env::enable_alarms(),
            persisted: env::persisted(),
            retention_interval_ms: env::retention_interval_ms(),
            db_path: state_dir.join("alarms.db"),
        })
    }
}
