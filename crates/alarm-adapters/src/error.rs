// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::scheduler::SchedulerError;

/// Timer Adapter failures. Spec §7: these are logged at the boundary that
/// produces them and never propagate further — `TimerAdapter::schedule`
/// and `TimerAdapter::decode_payload` still return a `Result` so callers
/// and tests can observe the failure, but the Wakeup Handler (the only
/// internal caller of either) has nothing to hand such an error back to
/// and only logs.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("alarm manager rejected schedule: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("malformed xstate-delay payload: {0}")]
    MalformedPayload(String),
}
