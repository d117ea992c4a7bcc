//! # Branch Store Server
//!
//! TCP line-protocol server for multi-branch retail back-ends.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Store Server                                     │
//! │                                                                         │
//! │  clients ───► TCP (5050) ───► handler ───► store-core / store-db       │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                              audit sink                                 │
//! │                        (logs/transactions.log)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary lives in `main.rs`; everything else is exposed as a
//! library so the integration tests can drive a real listener on an
//! ephemeral port.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod session;
