// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Wakeup Handler (spec §4.4): invoked when the platform's armed slot
//! fires. Drains all due alarms through the Alarm Manager, dispatching each
//! to the xstate-delay relay path, the cache-cleanup retention sweep, or a
//! user-registered handler — closed for dispatch, open for extension
//! (spec §3).

use std::collections::HashMap;
use std::sync::Arc;

use alarm_adapters::{ActorRegistry, ActorSystem, TimerAdapter};
use alarm_core::{Alarm, Clock};
use alarm_storage::{SqlDriver, Store};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{instrument, warn};

use crate::error::AlarmError;
use crate::handler::{AlarmHandler, DrainResult, HandlerOutcome};
use crate::manager::AlarmManager;
use crate::platform::PlatformWakeup;

/// A user-defined handler for an alarm type WH doesn't recognize natively.
pub type UserHandler = Box<dyn Fn(&Alarm) -> HandlerOutcome + Send + Sync>;

pub struct WakeupHandler<D: SqlDriver, W: PlatformWakeup, C: Clock, Sys: ActorSystem> {
    manager: Arc<AlarmManager<D, W, C>>,
    adapter: Arc<TimerAdapter<AlarmManager<D, W, C>, C>>,
    store: Arc<Store<D>>,
    registry: Arc<dyn ActorRegistry>,
    system: Arc<Sys>,
    clock: C,
    retention_ms: u64,
    user_handlers: Mutex<HashMap<String, UserHandler>>,
}

impl<D: SqlDriver, W: PlatformWakeup, C: Clock, Sys: ActorSystem> WakeupHandler<D, W, C, Sys> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manager: Arc<AlarmManager<D, W, C>>,
        adapter: Arc<TimerAdapter<AlarmManager<D, W, C>, C>>,
        store: Arc<Store<D>>,
        registry: Arc<dyn ActorRegistry>,
        system: Arc<Sys>,
        clock: C,
        retention_ms: u64,
    ) -> Self {
        Self { manager, adapter, store, registry, system, clock, retention_ms, user_handlers: Mutex::new(HashMap::new()) }
    }

    /// Register a handler for a user-defined alarm type. Alarms tagged
    /// `xstate-delay` or `cache-cleanup` never reach user handlers — those
    /// two are dispatched natively ahead of this table.
    pub fn register_handler(&self, alarm_type: impl Into<String>, handler: UserHandler) {
        self.user_handlers.lock().insert(alarm_type.into(), handler);
    }

    /// Invoked by the platform when the armed wakeup slot fires (spec §4.4
    /// step 1-3). The handler may schedule additional alarms synchronously
    /// during drain; those rows won't be picked up by this drain (`due` was
    /// snapshotted at entry) but are considered on the rearm that follows.
    #[instrument(skip(self))]
    pub async fn on_wakeup(&self) -> Result<Vec<DrainResult>, AlarmError> {
        self.manager.handle_due(self).await
    }

    async fn handle_xstate_delay(&self, alarm: &Alarm) -> HandlerOutcome {
        let data = match self.adapter.decode_payload(&alarm.payload) {
            Ok(d) => d,
            Err(e) => {
                warn!(alarm.id = %alarm.id, error = %e, "corrupt xstate-delay payload, dropping");
                return HandlerOutcome::Failed(format!("corrupt payload: {e}"));
            }
        };

        match self.registry.resolve(&data.target_session_id) {
            Some(target) => {
                self.adapter.deliver(&data, target.as_ref(), self.system.as_ref());
                HandlerOutcome::Ok
            }
            None => {
                warn!(alarm.id = %alarm.id, target = %data.target_session_id, "delivery target actor not found");
                HandlerOutcome::Failed("target actor not found".to_string())
            }
        }
    }

    /// The internal recurring cache-cleanup maintenance alarm: a bounded,
    /// idempotent sweep of snapshot rows older than the retention window.
    async fn handle_cache_cleanup(&self) -> HandlerOutcome {
        let now = self.clock.epoch_ms();
        let cutoff = now.saturating_sub(self.retention_ms);
        match self.store.delete_snapshots_older_than(cutoff).await {
            Ok(removed) => {
                tracing::debug!(removed, cutoff, "cache-cleanup sweep complete");
                HandlerOutcome::Ok
            }
            Err(e) => HandlerOutcome::Failed(e.to_string()),
        }
    }

    fn dispatch_user_handler(&self, alarm: &Alarm) -> HandlerOutcome {
        let outcome = self.user_handlers.lock().get(alarm.alarm_type.as_str()).map(|f| f(alarm));
        match outcome {
            Some(outcome) => outcome,
            None => {
                warn!(alarm.id = %alarm.id, alarm.type = %alarm.alarm_type, "no handler registered for alarm type, dropping");
                HandlerOutcome::Ok
            }
        }
    }
}

#[async_trait]
impl<D: SqlDriver, W: PlatformWakeup, C: Clock, Sys: ActorSystem> AlarmHandler for WakeupHandler<D, W, C, Sys> {
    async fn handle(&self, alarm: &Alarm) -> HandlerOutcome {
        if alarm.alarm_type.is_xstate_delay() {
            return self.handle_xstate_delay(alarm).await;
        }
        if alarm.alarm_type.is_cache_cleanup() {
            return self.handle_cache_cleanup().await;
        }
        self.dispatch_user_handler(alarm)
    }
}

#[cfg(test)]
#[path = "wakeup_tests.rs"]
mod tests;
