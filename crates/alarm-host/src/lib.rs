// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! alarm-host: wires the Persistence Layer, Alarm Manager, Timer Adapter,
//! and Wakeup Handler into one unit, and performs cold-start recovery (spec
//! §5 "Hibernation").
//!
//! The surrounding runtime owns FSM actor construction and snapshot
//! rehydration; this crate owns everything downstream of "the alarm
//! database is open and the timer adapter index is warm".

pub mod config;
pub mod env;
pub mod error;

use std::sync::Arc;

use alarm_adapters::{ActorRegistry, ActorSystem, TimerAdapter};
use alarm_core::{AlarmId, AlarmType, Clock};
use alarm_engine::{AlarmManager, DrainResult, PlatformWakeup, ScheduleAlarm, UserHandler, WakeupHandler};
use alarm_storage::{RusqliteDriver, Store};
use tracing::info;

pub use config::Config;
pub use error::HostError;

type HostManager<W, C> = AlarmManager<RusqliteDriver, W, C>;
type HostAdapter<W, C> = TimerAdapter<HostManager<W, C>, C>;
type HostWakeupHandler<W, C, Sys> = WakeupHandler<RusqliteDriver, W, C, Sys>;

/// The assembled durable alarm subsystem for one compute unit.
pub struct AlarmHost<W: PlatformWakeup, C: Clock, Sys: ActorSystem> {
    config: Config,
    store: Arc<Store<RusqliteDriver>>,
    manager: Arc<HostManager<W, C>>,
    adapter: Arc<HostAdapter<W, C>>,
    wakeup_handler: Arc<HostWakeupHandler<W, C, Sys>>,
}

impl<W: PlatformWakeup, C: Clock, Sys: ActorSystem> AlarmHost<W, C, Sys> {
    /// Opens the alarm database, wires PL/AM/TA/WH together, and runs
    /// cold-start recovery. Returns `None` when `config.enable_alarms` is
    /// `false` — the caller should leave the FSM's native timer installed
    /// and never construct a host (spec §6).
    pub async fn start(
        config: Config,
        wakeup: Arc<W>,
        clock: C,
        registry: Arc<dyn ActorRegistry>,
        system: Arc<Sys>,
    ) -> Result<Option<Self>, HostError> {
        if !config.enable_alarms {
            info!("alarms disabled by configuration; FSM native timer remains active");
            return Ok(None);
        }

        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let driver = RusqliteDriver::open(config.db_path.to_string_lossy().as_ref())?;
        let store = Arc::new(Store::new(driver));
        let manager = Arc::new(AlarmManager::new(Arc::clone(&store), wakeup, clock.clone()));
        let adapter = Arc::new(TimerAdapter::new(Arc::clone(&manager), clock.clone()));
        let wakeup_handler = Arc::new(WakeupHandler::new(
            Arc::clone(&manager),
            Arc::clone(&adapter),
            Arc::clone(&store),
            registry,
            system,
            clock.clone(),
            config.retention_interval_ms,
        ));

        let host = Self { config, store, manager, adapter, wakeup_handler };
        host.recover(&clock).await?;
        info!("alarm host started");
        Ok(Some(host))
    }

    /// Cold-start recovery (spec §5): rebuild the Timer Adapter's index from
    /// persisted `xstate-delay` rows, ensure the internal retention alarm
    /// exists, then rearm. FSM actor rehydration from `ActorMeta`/`Snapshot`
    /// is the surrounding runtime's job — it reads those tables through
    /// `store()` before or after calling this.
    async fn recover(&self, clock: &C) -> Result<(), HostError> {
        let now = clock.epoch_ms();
        let alarms = self.store.list_alarms().await?;
        let restored = alarms.iter().filter(|a| a.alarm_type.is_xstate_delay() && a.scheduled_at > now).count();
        self.adapter.restore(&alarms, now);
        info!(restored, total = alarms.len(), "timer adapter index restored from cold start");

        if self.config.persisted && self.config.retention_interval_ms > 0 {
            self.ensure_cache_cleanup_alarm(now).await?;
        }

        self.manager.rearm().await?;
        Ok(())
    }

    /// Idempotent: a `cache-cleanup` alarm already on the queue (e.g. from a
    /// prior incarnation) is left untouched rather than duplicated.
    async fn ensure_cache_cleanup_alarm(&self, now: u64) -> Result<(), HostError> {
        let already_scheduled =
            self.store.list_alarms().await?.iter().any(|a| a.alarm_type.is_cache_cleanup());
        if already_scheduled {
            return Ok(());
        }
        self.manager
            .schedule(ScheduleAlarm {
                id: AlarmId::new("cache-cleanup"),
                alarm_type: AlarmType::cache_cleanup(),
                scheduled_at: now + self.config.retention_interval_ms,
                repeat_interval: Some(self.config.retention_interval_ms),
                payload: serde_json::json!({}),
            })
            .await?;
        Ok(())
    }

    /// Invoked by the surrounding runtime when the platform wakeup slot
    /// fires (spec §4.4).
    pub async fn on_wakeup(&self) -> Result<Vec<DrainResult>, HostError> {
        Ok(self.wakeup_handler.on_wakeup().await?)
    }

    /// Register a handler for a user-defined alarm type (spec §4.4).
    pub fn register_handler(&self, alarm_type: impl Into<String>, handler: UserHandler) {
        self.wakeup_handler.register_handler(alarm_type, handler);
    }

    /// Schedule an arbitrary alarm directly (spec §4.2 `schedule`). The
    /// `xstate-delay` type is normally reached through `adapter()` instead;
    /// this is the entry point for user-defined recurring or one-shot
    /// alarms that aren't FSM delayed events.
    pub async fn schedule(&self, opts: ScheduleAlarm) -> Result<(), HostError> {
        Ok(self.manager.schedule(opts).await?)
    }

    /// Cancel a previously scheduled alarm by id (spec §4.2 `cancel`).
    pub async fn cancel(&self, id: &AlarmId) -> Result<(), HostError> {
        Ok(self.manager.cancel(id).await?)
    }

    /// The FSM library's timer adapter, installed at actor construction in
    /// place of its native timer source (spec §9).
    pub fn adapter(&self) -> &Arc<HostAdapter<W, C>> {
        &self.adapter
    }

    /// Direct PL access for `ActorMeta`/`Snapshot` reads and writes, which
    /// belong to the surrounding runtime's FSM lifecycle (spec §3
    /// "Ownership").
    pub fn store(&self) -> &Arc<Store<RusqliteDriver>> {
        &self.store
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
