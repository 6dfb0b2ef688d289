//! stackgen: a Laravel + Angular full-stack project generator.
//!
//! # Architecture
//!
//! Most of the crate is thin glue over external tools: [`toolchain`] probes
//! the generators the tool depends on, [`db`] drives the MySQL client
//! binary, and [`scaffold`] shells out to composer and the Angular CLI
//! before patching the generated trees with starter templates.
//!
//! The part with real moving pieces is [`devserver`]: it owns the two
//! long-running dev-server processes for a generated project: ordered
//! startup behind a readiness barrier, marker detection over chunked
//! output, one consolidated ready report, and exactly-once teardown when
//! the operator interrupts the session.

pub mod config;
pub mod db;
pub mod devserver;
pub mod scaffold;
pub mod toolchain;
pub mod ui;
