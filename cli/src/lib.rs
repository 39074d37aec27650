// Copyright (c) 2026 SlotSwap Contributors
// SPDX-License-Identifier: AGPL-3.0
//! SlotSwap CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Server bootstrap and operator commands for the `slotswap` binary

pub mod commands;
pub mod logging;
pub mod server;
