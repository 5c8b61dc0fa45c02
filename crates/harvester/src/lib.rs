//! harvester - repository metadata crawling and working-tree fetching.
//!
//! The library behind the `harvestd` daemon. Two long-running pipelines
//! share a relational store: the crawler harvests repository, user and
//! organization metadata from hosting providers, and the fetcher keeps an
//! on-disk (optionally tarred) working copy of every recorded repository.
//! A process-wide leaky-bucket throttle back-pressures the fetcher when
//! recoverable errors spike.
//!
//! # Features
//!
//! - `postgres` (default) / `sqlite` - sea-orm driver selection; sqlite
//!   backs the integration tests.
//! - `migrate` - enables [`migration`] and [`db::connect_and_migrate`]
//!   for bootstrapping a fresh schema.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod daemon;
pub mod db;
pub mod entity;
pub mod fetcher;
pub mod github;
pub mod repo;
pub mod store;
pub mod throttle;

#[cfg(feature = "migrate")]
pub mod migration;

pub use config::Config;
pub use daemon::{DaemonError, DaemonOptions};
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use throttle::{Status, Throttle};
