//! # cycletrace
//!
//! Command-line front end for `cycletrace-core`: stage catalog loading,
//! query building and in-memory execution over JSON event logs.

pub mod cli;
pub mod config;
