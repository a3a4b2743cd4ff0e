// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `NOOP_CLOCK` (spec §4.3, §6): the timer source the surrounding runtime
//! installs as the FSM library's timer service when the Timer Adapter is
//! active. All real delays flow through the adapter's `schedule`/`cancel`;
//! this exists purely so the FSM library's own clock field is never left
//! dangling.

/// An opaque handle the FSM library's native timer interface would
/// otherwise use to cancel a pending `setTimeout`. Always non-zero so a
/// caller can distinguish "no timer" from "a timer that does nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(pub u64);

/// The FSM library's pluggable timer source interface.
pub trait TimerSource: Send + Sync {
    fn set_timeout(&self, delay_ms: u64) -> TimerToken;
    fn clear_timeout(&self, token: TimerToken);
}

/// Installed in place of the FSM library's real timer source whenever the
/// durable alarm subsystem is active: every delay is rerouted through
/// `TimerAdapter` instead, so this clock's own timeouts must never fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClock;

impl TimerSource for NoopClock {
    fn set_timeout(&self, _delay_ms: u64) -> TimerToken {
        TimerToken(1)
    }

    fn clear_timeout(&self, _token: TimerToken) {}
}

#[cfg(test)]
#[path = "timer_source_tests.rs"]
mod tests;
