//! Core types, traits and the aggregation engine for rinkstat.
//!
//! This crate is free of database dependencies. Storage backends (e.g.
//! `rinkstat-store-sqlite`) implement [`store::EventStore`] and
//! [`store::StatsStore`]; everything else is computed here.

// We intentionally use native `async fn` in traits.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod config;
pub mod derive;
pub mod engine;
pub mod error;
pub mod event;
pub mod materialize;
pub mod metric;
pub mod rank;
pub mod record;
pub mod scope;
pub mod store;

pub use error::{Error, Result};
