// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! SlotSwap core
//!
//! Users list calendar slots, offer some of them for exchange and negotiate
//! one-to-one swaps with other users.
//!
//! # Architecture
//!
//! - **domain**: aggregates, the swap state machine, repository and
//!   notification ports, configuration manifest
//! - **application**: event, swap negotiation and auth services
//! - **infrastructure**: in-memory and PostgreSQL stores, notification bus,
//!   credentials
//! - **presentation**: axum router, SSE notification stream, error mapping

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
