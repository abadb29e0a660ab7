//! serpwatch - keyword ranking monitor.
//!
//! Periodically snapshots search rankings for tracked keywords, records
//! where tracked sites appear, and compares the canonical/hreflang signals
//! a page serves to a generic bot and to Googlebot.

// Model types use `from_str` methods that return Option<Self>,
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod http_client;
pub mod migrations;
pub mod models;
pub mod parsers;
pub mod providers;
pub mod repository;
pub mod scheduler;
pub mod schema;
pub mod services;
pub mod utils;
