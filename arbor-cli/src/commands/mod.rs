//! Subcommands

pub mod browse;
pub mod resolve;
pub mod show;
pub mod view;
