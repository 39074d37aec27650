// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod error;
pub mod event;
pub mod notification;
pub mod repository;
pub mod server_config;
pub mod swap;
pub mod user;
