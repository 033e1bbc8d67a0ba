//! CLI module for phrasebook
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod auth;
pub mod commands;
pub mod config;
pub mod phrase;

pub use commands::{Cli, Commands};
