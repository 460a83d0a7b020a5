//! Command-line interface for uketsuke.
//!
//! This module provides the CLI structure and command handlers for the
//! `uke` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, EventAddCommand, EventCommand, EventUpdateCommand, ExportCommand, ExportFormat,
    ImportCommand, ListCommand, OutputFormat, RegisterCommand, SearchCommand, StatsCommand,
};

/// uke - Event registration and reception desk
///
/// Manages events and their registrations: seat capacity, check-in by QR
/// token, CSV import and export, and confirmation notifications.
#[derive(Debug, Parser)]
#[command(name = "uke")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage events
    #[command(subcommand)]
    Event(EventCommand),

    /// Register a participant for an event
    Register(RegisterCommand),

    /// Check a participant in by registration id or QR token
    Checkin {
        /// Registration id or QR token
        key: String,
    },

    /// Cancel a registration
    Cancel {
        /// Registration id
        id: String,

        /// Reason recorded with the cancellation
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// Show one registration by id or QR token
    Show {
        /// Registration id or QR token
        key: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List registrations
    List(ListCommand),

    /// Search registrations
    Search(SearchCommand),

    /// Show registration statistics
    Stats(StatsCommand),

    /// Export registrations to CSV or JSON
    Export(ExportCommand),

    /// Import registrations from a CSV file
    Import(ImportCommand),

    /// Send a reminder to registered participants of an event
    Remind {
        /// Event id
        event_id: String,
    },

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
