// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! FlowOne Core
//!
//! Backend of the FlowOne Voice studio: an in-memory store of agents,
//! connections and conversations, an AI collaborator that configures and
//! role-plays those agents, and a notification hub that relays canvas
//! events between connected clients.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, use cases, adapters and the HTTP/WebSocket
//!   surface, assembled by the `flowone` binary

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
