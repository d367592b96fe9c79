//! # mezuro
//!
//! The Mezuro metric configuration server: an axum HTTP API over the
//! `mezuro-core` catalog, a clap CLI to seed and inspect it, and a client
//! for the metric collector service.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  apps/mezuro                         │
//! │                                                      │
//! │  ┌──────────┐   ┌────────────┐   ┌────────────────┐  │
//! │  │   CLI    │   │  HTTP API  │   │  Collectors    │  │
//! │  │  (clap)  │   │  (axum)    │──▶│  (reqwest)     │  │
//! │  └────┬─────┘   └─────┬──────┘   └────────────────┘  │
//! │       └───────┬───────┘                              │
//! │               ▼                                      │
//! │        ┌─────────────┐                               │
//! │        │ mezuro-core │                               │
//! │        └─────────────┘                               │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod collector;
pub mod config;
