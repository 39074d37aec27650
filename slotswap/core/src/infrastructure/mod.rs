// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod credentials;
pub mod db;
pub mod notification_bus;
pub mod repositories;
