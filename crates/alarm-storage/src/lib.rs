// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! alarm-storage: the durable alarm subsystem's Persistence Layer.
//!
//! `SqlDriver` abstracts over the platform's `sql.exec` primitive and its
//! three result shapes; `RusqliteDriver` is the production implementation;
//! `Store` is the typed CRUD surface the Alarm Manager and Wakeup Handler
//! build on.

pub mod driver;
pub mod error;
pub mod sqlite;
pub mod store;

pub use driver::{DriverError, Row, RowBatch, SqlDriver, SqlResult, SqlValue};
pub use error::StoreError;
pub use sqlite::RusqliteDriver;
pub use store::Store;
