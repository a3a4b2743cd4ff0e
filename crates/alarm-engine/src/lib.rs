// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! alarm-engine: the Alarm Manager and the Wakeup Handler — the two
//! components that turn the persisted `alarms` table into at-most-once
//! delivery against a single platform wakeup slot (spec §4.2, §4.4).

pub mod error;
pub mod handler;
pub mod manager;
pub mod platform;
pub mod scheduler_impl;
pub mod wakeup;

pub use alarm_adapters::TimerAdapter;
pub use error::AlarmError;
pub use handler::{AlarmHandler, DrainResult, HandlerOutcome};
pub use manager::{AlarmManager, ArmedState, ScheduleAlarm};
pub use platform::{FakeWakeup, PlatformWakeup};
pub use wakeup::{UserHandler, WakeupHandler};
