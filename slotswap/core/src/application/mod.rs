// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod auth_service;
pub mod event_service;
pub mod identity;
pub mod repository_factory;
pub mod summary;
pub mod swap_service;
