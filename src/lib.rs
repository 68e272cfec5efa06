//! Dice notation parsing, iterated rolling and chat-sized rendering.
//!
//! The pipeline for one command is: strip advantage words ([`adv`]), compile
//! the expression once ([`iter::compile`]), evaluate it one or more times
//! against a shared [`roll::RollContext`] ([`iter`]), count successes against
//! a DC, then fit the result into a message ([`budget`]). [`commands`] wires
//! these together behind the chat commands.

pub mod adv;
pub mod budget;
pub mod commands;
pub mod common;
pub mod config;
pub mod iter;
pub mod parse;
pub mod roll;
pub mod stats;

pub use commands::{CommandError, DiceCommands, Reply, RollerSource};
pub use common::AdvType;
pub use config::{ConfigError, DiceConfig};
pub use stats::{InMemoryStats, StatsCollector};
