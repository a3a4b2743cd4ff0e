// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use alarm_core::AlarmValidationError;
use crate::driver::DriverError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("alarm {0} failed validation: {1}")]
    InvalidAlarm(String, AlarmValidationError),

    #[error("alarm {0} already exists")]
    DuplicateAlarm(String),

    #[error("alarm {0} not found")]
    AlarmNotFound(String),

    #[error("schema bootstrap failed: {0}")]
    Bootstrap(#[source] DriverError),

    #[error("query failed: {0}")]
    Driver(#[from] DriverError),

    #[error("malformed payload for {0}: {1}")]
    MalformedRow(String, String),

    #[error("blocking task panicked: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
