// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Persistence Layer: durable CRUD over `alarms`, plus the ambient
//! `actor_meta`/`snapshots` tables the Wakeup Handler's hibernation recovery
//! path reads during cold start.
//!
//! Every operation here may suspend the calling actor (spec §5) — it runs
//! through `spawn_blocking` so the async executor is never pinned on
//! synchronous SQLite I/O.

use std::sync::Arc;

use alarm_core::{Alarm, AlarmId, AlarmType};
use serde_json::Value as Json;
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::driver::{SqlDriver, SqlValue};
use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS alarms (
    id TEXT PRIMARY KEY,
    alarm_type TEXT NOT NULL,
    scheduled_at INTEGER NOT NULL,
    repeat_interval INTEGER,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS alarms_scheduled_at_idx ON alarms (scheduled_at);
CREATE INDEX IF NOT EXISTS alarms_type_idx ON alarms (alarm_type);

CREATE TABLE IF NOT EXISTS actor_meta (
    session_id TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    session_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (session_id, created_at)
);
"#;

/// Durable store over a single `SqlDriver`. Bootstraps its schema at most
/// once per process incarnation (spec §5's "schema bootstrap is idempotent
/// and runs once" testable property) via an async-aware once-cell — a plain
/// `std::sync::Once` can't propagate the `Result` a failed `CREATE TABLE`
/// produces across an await point.
pub struct Store<D: SqlDriver> {
    driver: Arc<D>,
    bootstrapped: OnceCell<()>,
}

impl<D: SqlDriver> Store<D> {
    pub fn new(driver: D) -> Self {
        Self { driver: Arc::new(driver), bootstrapped: OnceCell::new() }
    }

    #[instrument(skip(self))]
    async fn ensure_bootstrapped(&self) -> Result<(), StoreError> {
        self.bootstrapped
            .get_or_try_init(|| async {
                let driver = Arc::clone(&self.driver);
                run_blocking(move || {
                    for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                        driver.exec(statement, &[]).map_err(StoreError::Bootstrap)?;
                    }
                    Ok(())
                })
                .await
            })
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, alarm), fields(alarm.id = %alarm.id))]
    pub async fn insert_alarm(&self, alarm: &Alarm) -> Result<(), StoreError> {
        self.ensure_bootstrapped().await?;
        alarm.validate().map_err(|e| StoreError::InvalidAlarm(alarm.id.to_string(), e))?;

        let driver = Arc::clone(&self.driver);
        let id = alarm.id.to_string();
        let alarm_type = alarm.alarm_type.as_str().to_string();
        let scheduled_at = alarm.scheduled_at;
        let repeat_interval = alarm.repeat_interval;
        let payload = alarm.payload.to_string();
        let created_at = alarm.created_at;
        let id_for_conflict = id.clone();

        run_blocking(move || {
            let binds = vec![
                SqlValue::from(id),
                SqlValue::from(alarm_type),
                SqlValue::from(scheduled_at),
                SqlValue::from(repeat_interval),
                SqlValue::from(payload),
                SqlValue::from(created_at),
            ];
            driver
                .exec(
                    "INSERT INTO alarms (id, alarm_type, scheduled_at, repeat_interval, payload, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    &binds,
                )
                .map_err(|e| classify_insert_conflict(e, &id_for_conflict))?;
            Ok(())
        })
        .await
    }

    /// Updates an alarm's schedule and payload in place — the operation the
    /// Alarm Manager's rearm path uses, since a repeat firing replaces the
    /// row rather than delete-then-insert. Errors with `AlarmNotFound` if no
    /// row with this id exists (the `UPDATE` itself would silently affect
    /// zero rows otherwise). The existence check and the `UPDATE` are not
    /// one atomic statement; this relies on spec §5's single-threaded
    /// compute-unit model (no concurrent `cancel` can delete the row
    /// between the two).
    #[instrument(skip(self, alarm), fields(alarm.id = %alarm.id))]
    pub async fn update_alarm(&self, alarm: &Alarm) -> Result<(), StoreError> {
        self.ensure_bootstrapped().await?;
        alarm.validate().map_err(|e| StoreError::InvalidAlarm(alarm.id.to_string(), e))?;

        if self.get_alarm(&alarm.id).await?.is_none() {
            return Err(StoreError::AlarmNotFound(alarm.id.to_string()));
        }

        let driver = Arc::clone(&self.driver);
        let id = alarm.id.to_string();
        let alarm_type = alarm.alarm_type.as_str().to_string();
        let scheduled_at = alarm.scheduled_at;
        let repeat_interval = alarm.repeat_interval;
        let payload = alarm.payload.to_string();
        let created_at = alarm.created_at;

        run_blocking(move || {
            let binds = vec![
                SqlValue::from(alarm_type),
                SqlValue::from(scheduled_at),
                SqlValue::from(repeat_interval),
                SqlValue::from(payload),
                SqlValue::from(created_at),
                SqlValue::from(id),
            ];
            driver.exec(
                "UPDATE alarms SET alarm_type = ?1, scheduled_at = ?2, repeat_interval = ?3, \
                 payload = ?4, created_at = ?5 WHERE id = ?6",
                &binds,
            )?;
            Ok(())
        })
        .await
    }

    /// Upsert semantics: inserts if absent, replaces if present. Not used by
    /// `AlarmManager::schedule()`, which calls `insert_alarm` directly and
    /// surfaces a duplicate id as an error rather than silently upserting
    /// (spec §7 "no silent upsert"); this exists for callers that do want
    /// replace-if-present semantics for a client-supplied id.
    #[instrument(skip(self, alarm), fields(alarm.id = %alarm.id))]
    pub async fn put_alarm(&self, alarm: &Alarm) -> Result<(), StoreError> {
        match self.insert_alarm(alarm).await {
            Ok(()) => Ok(()),
            Err(StoreError::DuplicateAlarm(_)) => self.update_alarm(alarm).await,
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_alarm(&self, id: &AlarmId) -> Result<(), StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        let id = id.to_string();
        run_blocking(move || {
            driver.exec("DELETE FROM alarms WHERE id = ?1", &[SqlValue::from(id)])?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_alarms_by_type(&self, alarm_type: &AlarmType) -> Result<u64, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        let alarm_type = alarm_type.as_str().to_string();
        run_blocking(move || {
            let rows = driver
                .exec("SELECT id FROM alarms WHERE alarm_type = ?1", &[SqlValue::from(alarm_type.clone())])?
                .normalize();
            let count = rows.len() as u64;
            driver.exec("DELETE FROM alarms WHERE alarm_type = ?1", &[SqlValue::from(alarm_type)])?;
            Ok(count)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_alarm(&self, id: &AlarmId) -> Result<Option<Alarm>, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        let id = id.to_string();
        run_blocking(move || {
            let rows = driver
                .exec("SELECT id, alarm_type, scheduled_at, repeat_interval, payload, created_at FROM alarms WHERE id = ?1", &[SqlValue::from(id)])?
                .normalize();
            rows.into_iter().next().map(row_to_alarm).transpose()
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_alarms(&self) -> Result<Vec<Alarm>, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        run_blocking(move || {
            let rows = driver
                .exec("SELECT id, alarm_type, scheduled_at, repeat_interval, payload, created_at FROM alarms ORDER BY scheduled_at ASC", &[])?
                .normalize();
            rows.into_iter().map(row_to_alarm).collect()
        })
        .await
    }

    /// Alarms with `scheduled_at <= now`, ascending — what the Alarm
    /// Manager's `handleDue` drains on each tick.
    #[instrument(skip(self))]
    pub async fn due_alarms(&self, now: u64) -> Result<Vec<Alarm>, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        run_blocking(move || {
            let rows = driver
                .exec(
                    "SELECT id, alarm_type, scheduled_at, repeat_interval, payload, created_at \
                     FROM alarms WHERE scheduled_at <= ?1 ORDER BY scheduled_at ASC",
                    &[SqlValue::from(now)],
                )?
                .normalize();
            rows.into_iter().map(row_to_alarm).collect()
        })
        .await
    }

    /// The single earliest-scheduled alarm across all types, or `None` if
    /// the table is empty — what the Timer Adapter rearms the host's single
    /// platform timer against.
    #[instrument(skip(self))]
    pub async fn earliest_alarm(&self) -> Result<Option<Alarm>, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        run_blocking(move || {
            let rows = driver
                .exec(
                    "SELECT id, alarm_type, scheduled_at, repeat_interval, payload, created_at \
                     FROM alarms ORDER BY scheduled_at ASC LIMIT 1",
                    &[],
                )?
                .normalize();
            rows.into_iter().next().map(row_to_alarm).transpose()
        })
        .await
    }

    /// Persists arbitrary per-session actor metadata read back during cold
    /// start recovery (spec §7).
    #[instrument(skip(self, value))]
    pub async fn put_actor_meta(&self, session_id: &str, value: &Json, updated_at: u64) -> Result<(), StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        let session_id = session_id.to_string();
        let value = value.to_string();
        run_blocking(move || {
            driver.exec(
                "INSERT INTO actor_meta (session_id, value, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(session_id) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                &[SqlValue::from(session_id), SqlValue::from(value), SqlValue::from(updated_at)],
            )?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_actor_meta(&self, session_id: &str) -> Result<Option<Json>, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        let session_id = session_id.to_string();
        run_blocking(move || {
            let rows = driver
                .exec("SELECT value FROM actor_meta WHERE session_id = ?1", &[SqlValue::from(session_id.clone())])?
                .normalize();
            match rows.into_iter().next() {
                Some(row) => {
                    let text = row.get_text("value").unwrap_or_default();
                    serde_json::from_str(text)
                        .map(Some)
                        .map_err(|e| StoreError::MalformedRow(session_id, e.to_string()))
                }
                None => Ok(None),
            }
        })
        .await
    }

    #[instrument(skip(self, value))]
    pub async fn put_snapshot(&self, session_id: &str, value: &Json, created_at: u64) -> Result<(), StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        let session_id = session_id.to_string();
        let value = value.to_string();
        run_blocking(move || {
            driver.exec(
                "INSERT INTO snapshots (session_id, created_at, value) VALUES (?1, ?2, ?3)",
                &[SqlValue::from(session_id), SqlValue::from(created_at), SqlValue::from(value)],
            )?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn latest_snapshot(&self, session_id: &str) -> Result<Option<Json>, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        let session_id = session_id.to_string();
        run_blocking(move || {
            let rows = driver
                .exec(
                    "SELECT value FROM snapshots WHERE session_id = ?1 ORDER BY created_at DESC LIMIT 1",
                    &[SqlValue::from(session_id.clone())],
                )?
                .normalize();
            match rows.into_iter().next() {
                Some(row) => {
                    let text = row.get_text("value").unwrap_or_default();
                    serde_json::from_str(text)
                        .map(Some)
                        .map_err(|e| StoreError::MalformedRow(session_id, e.to_string()))
                }
                None => Ok(None),
            }
        })
        .await
    }

    /// Prunes snapshot history older than `older_than` (spec §6 retention
    /// sweep), returning the number of rows removed.
    #[instrument(skip(self))]
    pub async fn delete_snapshots_older_than(&self, older_than: u64) -> Result<u64, StoreError> {
        self.ensure_bootstrapped().await?;
        let driver = Arc::clone(&self.driver);
        run_blocking(move || {
            let rows = driver
                .exec("SELECT session_id FROM snapshots WHERE created_at < ?1", &[SqlValue::from(older_than)])?
                .normalize();
            let count = rows.len() as u64;
            driver.exec("DELETE FROM snapshots WHERE created_at < ?1", &[SqlValue::from(older_than)])?;
            Ok(count)
        })
        .await
    }
}

fn classify_insert_conflict(err: crate::driver::DriverError, id: &str) -> StoreError {
    if err.0.to_lowercase().contains("unique") || err.0.to_lowercase().contains("constraint") {
        StoreError::DuplicateAlarm(id.to_string())
    } else {
        StoreError::Driver(err)
    }
}

fn row_to_alarm(row: crate::driver::Row) -> Result<Alarm, StoreError> {
    let id = row.get_text("id").unwrap_or_default().to_string();
    let payload_text = row.get_text("payload").unwrap_or_default();
    let payload: Json = serde_json::from_str(payload_text).map_err(|e| StoreError::MalformedRow(id.clone(), e.to_string()))?;
    Ok(Alarm {
        id: AlarmId::new(&id),
        alarm_type: AlarmType::new(row.get_text("alarm_type").unwrap_or_default()),
        scheduled_at: row.get_i64("scheduled_at").unwrap_or_default() as u64,
        repeat_interval: row.get_i64("repeat_interval").map(|v| v as u64),
        payload,
        created_at: row.get_i64("created_at").unwrap_or_default() as u64,
    })
}

/// Runs a synchronous closure on the blocking pool, collapsing a join
/// failure into the same `StoreError` surface as a driver error.
async fn run_blocking<F, T>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
