// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for SlotSwap CLI

pub mod config;
pub mod health;
pub mod migrate;

pub use self::config::ConfigCommand;
pub use self::migrate::MigrateCommand;
