// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entity types, store contract, fan-out events and external interfaces.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types shared by every other layer; no I/O

pub mod agent;
pub mod config;
pub mod connection;
pub mod conversation;
pub mod events;
pub mod llm;
pub mod repository;
