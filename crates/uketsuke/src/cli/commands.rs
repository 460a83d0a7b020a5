//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand, ValueEnum};

use crate::event::EventForm;
use crate::registration::RegistrationForm;

/// Event management commands.
#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// Create a new event
    Add(EventAddCommand),

    /// List all events with their seat usage
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show one event in detail
    Show {
        /// Event id
        event_id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Update event details
    Update(EventUpdateCommand),

    /// Close an event to new registrations
    Close {
        /// Event id
        event_id: String,
    },

    /// Delete an event
    Remove {
        /// Event id
        event_id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Event creation arguments.
#[derive(Debug, Args)]
pub struct EventAddCommand {
    /// Event name
    #[arg(long)]
    pub name: String,

    /// Event date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    pub time: Option<NaiveTime>,

    /// Venue
    #[arg(long, default_value = "")]
    pub location: String,

    /// Seat capacity
    #[arg(long)]
    pub capacity: u32,

    /// Free-form description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Last day registrations are accepted (YYYY-MM-DD)
    #[arg(long)]
    pub deadline: Option<NaiveDate>,

    /// Contact address shown to participants
    #[arg(long, default_value = "")]
    pub contact_email: String,
}

impl EventAddCommand {
    /// Convert the arguments into an event form.
    #[must_use]
    pub fn into_form(self) -> EventForm {
        EventForm {
            name: self.name,
            date: self.date,
            time: self.time,
            location: self.location,
            capacity: self.capacity,
            description: self.description,
            registration_deadline: self.deadline,
            contact_email: self.contact_email,
        }
    }
}

/// Event update arguments. Unset flags keep the current value.
#[derive(Debug, Args)]
pub struct EventUpdateCommand {
    /// Id of the event to update
    pub event_id: String,

    /// New event name
    #[arg(long)]
    pub name: Option<String>,

    /// New event date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// New start time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    pub time: Option<NaiveTime>,

    /// New venue
    #[arg(long)]
    pub location: Option<String>,

    /// New seat capacity
    #[arg(long)]
    pub capacity: Option<u32>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// New registration deadline (YYYY-MM-DD)
    #[arg(long)]
    pub deadline: Option<NaiveDate>,

    /// New contact address
    #[arg(long)]
    pub contact_email: Option<String>,
}

impl EventUpdateCommand {
    /// Merge the arguments over an existing form.
    #[must_use]
    pub fn merged_into(self, mut form: EventForm) -> EventForm {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(date) = self.date {
            form.date = date;
        }
        if let Some(time) = self.time {
            form.time = Some(time);
        }
        if let Some(location) = self.location {
            form.location = location;
        }
        if let Some(capacity) = self.capacity {
            form.capacity = capacity;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(deadline) = self.deadline {
            form.registration_deadline = Some(deadline);
        }
        if let Some(contact_email) = self.contact_email {
            form.contact_email = contact_email;
        }
        form
    }
}

/// Register command arguments.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Id of the event to register for
    #[arg(short, long)]
    pub event: String,

    /// Participant name
    #[arg(long)]
    pub name: String,

    /// Name reading (katakana)
    #[arg(long, default_value = "")]
    pub furigana: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Phone number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Company name
    #[arg(long, default_value = "")]
    pub company: String,

    /// Department, also used for notification routing
    #[arg(long, default_value = "")]
    pub department: String,

    /// Job title
    #[arg(long, default_value = "")]
    pub position: String,

    /// Free-form notes
    #[arg(long, default_value = "")]
    pub notes: String,
}

impl RegisterCommand {
    /// Convert the arguments into a registration form.
    #[must_use]
    pub fn into_form(self) -> RegistrationForm {
        RegistrationForm {
            event_id: self.event,
            name: self.name,
            furigana: self.furigana,
            email: self.email,
            phone: self.phone,
            company: self.company,
            department: self.department,
            position: self.position,
            notes: self.notes,
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Restrict to one event
    #[arg(short, long)]
    pub event: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// The search query (matches name, furigana, email, and company)
    pub query: String,

    /// Restrict to one event
    #[arg(short, long)]
    pub event: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Restrict to one event
    #[arg(short, long)]
    pub event: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Restrict to one event
    #[arg(short, long)]
    pub event: Option<String>,

    /// Export format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: ExportFormat,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// CSV file to import
    pub file: PathBuf,

    /// Event the imported registrations belong to
    #[arg(short, long)]
    pub event: String,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values with Japanese headers
    #[default]
    Csv,
    /// JSON envelope with metadata
    Json,
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("invalid time '{s}': {e}"))
}
