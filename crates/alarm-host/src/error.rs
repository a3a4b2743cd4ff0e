// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use alarm_engine::AlarmError;
use alarm_storage::{DriverError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to open alarm database: {0}")]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Alarm(#[from] AlarmError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
