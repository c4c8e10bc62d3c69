//! Temporal Lab — the idle-economy core.
//!
//! Artifacts produce temporal energy; energy buys upgrades and repairs
//! anomalies; repairs raise timeline stability; full stability allows a
//! prestige that trades the run for permanent shards.
//!
//! Layering, leaf first:
//!   catalog / config / state   static content, tunables, plain data
//!   production                 pure queries over a state snapshot
//!   engine                     validate-then-mutate actions
//!   snapshot / store           versioned JSON blobs in SQLite
//!   session                    engine + store + save policy
//!   simulator                  deterministic autoplay for balance checks

pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod production;
pub mod rng;
pub mod session;
pub mod simulator;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;
