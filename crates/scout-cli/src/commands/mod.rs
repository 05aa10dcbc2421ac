//! Subcommand implementations.

pub mod browse;
pub mod index;
pub mod query;
