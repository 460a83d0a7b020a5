//! `uke` - CLI for uketsuke
//!
//! This binary provides the command-line interface for managing events and
//! working the reception desk: registrations, check-in, import/export, and
//! reminders.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;

use uketsuke::cli::{
    Cli, Command, ConfigCommand, EventCommand, ExportCommand, ExportFormat, ImportCommand,
    ListCommand, OutputFormat, RegisterCommand, SearchCommand, StatsCommand,
};
use uketsuke::notify::{EmailNotifier, Notifier, TeamsNotifier};
use uketsuke::store::{BlobStore, EventStore, FileBlobStore, RegistrationStore};
use uketsuke::{capacity, export, init_logging, Config, Event, EventForm, Reception, Registration};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Config inspection doesn't need the stores
    if let Command::Config(config_cmd) = &cli.command {
        return handle_config(&config, config_cmd);
    }

    let mut reception = open_reception(&config)?;

    match cli.command {
        Command::Event(cmd) => handle_event(&mut reception, cmd),
        Command::Register(cmd) => handle_register(&mut reception, cmd).await,
        Command::Checkin { key } => handle_checkin(&mut reception, &key).await,
        Command::Cancel { id, reason } => handle_cancel(&mut reception, &id, &reason).await,
        Command::Show { key, json } => handle_show(&reception, &key, json),
        Command::List(cmd) => handle_list(&reception, &cmd),
        Command::Search(cmd) => handle_search(&reception, &cmd),
        Command::Stats(cmd) => handle_stats(&reception, &cmd),
        Command::Export(cmd) => handle_export(&reception, &cmd),
        Command::Import(cmd) => handle_import(&mut reception, &cmd),
        Command::Remind { event_id } => handle_remind(&reception, &event_id).await,
        Command::Config(_) => Ok(()), // handled above
    }
}

/// Assemble the reception service from configuration.
fn open_reception(config: &Config) -> Result<Reception, Box<dyn std::error::Error>> {
    let blob: Arc<dyn BlobStore> = Arc::new(FileBlobStore::open(config.data_dir())?);
    let events = EventStore::open(Arc::clone(&blob));
    let registrations = RegistrationStore::open(blob);

    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    if config.email.enabled {
        notifiers.push(Arc::new(EmailNotifier::new()));
    }
    if config.teams.enabled {
        notifiers.push(Arc::new(TeamsNotifier::new(
            config.teams.default_webhook.clone(),
            config.teams.webhooks.clone(),
        )));
    }

    Ok(Reception::new(
        events,
        registrations,
        notifiers,
        config.tz_offset(),
    ))
}

fn handle_event(reception: &mut Reception, cmd: EventCommand) -> CliResult {
    match cmd {
        EventCommand::Add(add) => {
            let event = reception.events_mut().add(add.into_form())?;
            println!("Created event: {}", event.id);
            print_event(reception, &event);
        }
        EventCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(reception.events().all())?);
            } else if reception.events().count() == 0 {
                println!("No events.");
            } else {
                println!(
                    "{:<28} {:<12} {:<8} {:>9}  NAME",
                    "ID", "DATE", "STATUS", "SEATS"
                );
                for event in reception.events().all() {
                    let taken =
                        capacity::active_count(&reception.registrations().by_event(&event.id));
                    println!(
                        "{:<28} {:<12} {:<8} {:>4}/{:<4}  {}",
                        event.id,
                        event.date.to_string(),
                        event.status.to_string(),
                        taken,
                        event.capacity,
                        event.name
                    );
                }
            }
        }
        EventCommand::Show { event_id, json } => {
            let Some(event) = reception.events().get(&event_id) else {
                println!("No event found for {event_id}");
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print_event(reception, &event);
            }
        }
        EventCommand::Update(update) => {
            let event_id = update.event_id.clone();
            let Some(existing) = reception.events().get(&event_id) else {
                println!("No event found for {event_id}");
                return Ok(());
            };
            let base = EventForm {
                name: existing.name,
                date: existing.date,
                time: existing.time,
                location: existing.location,
                capacity: existing.capacity,
                description: existing.description,
                registration_deadline: existing.registration_deadline,
                contact_email: existing.contact_email,
            };
            let form = update.merged_into(base);
            if let Some(updated) = reception.events_mut().update(&event_id, form)? {
                println!("Updated event: {}", updated.id);
                print_event(reception, &updated);
            }
        }
        EventCommand::Close { event_id } => match reception.events_mut().close(&event_id) {
            Some(event) => println!("Closed event: {} ({})", event.id, event.name),
            None => println!("No event found for {event_id}"),
        },
        EventCommand::Remove { event_id, yes } => {
            if !yes {
                let kept = reception.registrations().by_event(&event_id).len();
                println!("This will delete the event. Its {kept} registrations are kept.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            match reception.events_mut().remove(&event_id) {
                Some(event) => println!("Removed event: {} ({})", event.id, event.name),
                None => println!("No event found for {event_id}"),
            }
        }
    }
    Ok(())
}

async fn handle_register(reception: &mut Reception, cmd: RegisterCommand) -> CliResult {
    let registration = reception.register(cmd.into_form()).await?;
    println!("Registered: {} ({})", registration.name, registration.id);
    println!("QR token:   {}", registration.qr_code);
    Ok(())
}

async fn handle_checkin(reception: &mut Reception, key: &str) -> CliResult {
    match reception.check_in(key).await? {
        Some(registration) => {
            println!("Checked in: {} ({})", registration.name, registration.id);
            if let Some(time) = registration.check_in_time {
                println!(
                    "Time:       {}",
                    export::format_local(time, reception.tz_offset())
                );
            }
        }
        None => println!("Not in a registered state (already checked in, or cancelled)."),
    }
    Ok(())
}

async fn handle_cancel(reception: &mut Reception, id: &str, reason: &str) -> CliResult {
    match reception.cancel(id, reason).await? {
        Some(registration) => {
            println!("Cancelled: {} ({})", registration.name, registration.id);
        }
        None => println!("No registration found for {id}, or it was already cancelled."),
    }
    Ok(())
}

fn handle_show(reception: &Reception, key: &str, json: bool) -> CliResult {
    let registration = reception
        .registrations()
        .get(key)
        .or_else(|| reception.registrations().find_by_qr(key));

    match registration {
        Some(registration) if json => {
            println!("{}", serde_json::to_string_pretty(&registration)?);
        }
        Some(registration) => print_registration(reception, &registration),
        None => println!("No registration found for {key}"),
    }
    Ok(())
}

fn handle_list(reception: &Reception, cmd: &ListCommand) -> CliResult {
    let rows = match &cmd.event {
        Some(event_id) => reception.registrations().by_event(event_id),
        None => reception.registrations().all().to_vec(),
    };
    render_registrations(reception, &rows, cmd.format)
}

fn handle_search(reception: &Reception, cmd: &SearchCommand) -> CliResult {
    let rows = reception
        .registrations()
        .search(&cmd.query, cmd.event.as_deref());
    if rows.is_empty() {
        println!("No matches for \"{}\"", cmd.query);
        return Ok(());
    }
    render_registrations(reception, &rows, cmd.format)
}

fn handle_stats(reception: &Reception, cmd: &StatsCommand) -> CliResult {
    let stats = reception.registrations().statistics(cmd.event.as_deref());
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        match &cmd.event {
            Some(event_id) => match reception.events().get(event_id) {
                Some(event) => println!("Statistics for {} ({event_id})", event.name),
                None => println!("Statistics for {event_id}"),
            },
            None => println!("Statistics (all events)"),
        }
        println!("-----------------------");
        println!("Total:         {}", stats.total);
        println!("Registered:    {}", stats.registered);
        println!("Attended:      {}", stats.attended);
        println!("Cancelled:     {}", stats.cancelled);
        println!("Check-in rate: {}%", stats.check_in_rate);
    }
    Ok(())
}

fn handle_export(reception: &Reception, cmd: &ExportCommand) -> CliResult {
    let rows = match &cmd.event {
        Some(event_id) => reception.registrations().by_event(event_id),
        None => reception.registrations().all().to_vec(),
    };

    let payload = match cmd.format {
        ExportFormat::Csv => match export::export_csv(&rows, reception.tz_offset()) {
            Some(csv) => csv,
            None => {
                println!("No registrations to export.");
                return Ok(());
            }
        },
        ExportFormat::Json => export::export_json(&rows)?,
    };

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, &payload)?;
            println!("Exported {} registrations to {}", rows.len(), path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}

fn handle_import(reception: &mut Reception, cmd: &ImportCommand) -> CliResult {
    let text = std::fs::read_to_string(&cmd.file)?;
    let forms = export::import_csv(&text, &cmd.event)?;
    let parsed = forms.len();
    let imported = reception.registrations_mut().import(forms);
    println!("Imported {imported} of {parsed} parsed rows.");
    Ok(())
}

async fn handle_remind(reception: &Reception, event_id: &str) -> CliResult {
    let count = reception.remind(event_id).await?;
    println!("Reminders sent for {count} registrations.");
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data directory:  {}", config.data_dir().display());
                println!();
                println!("[Export]");
                println!("  UTC offset:      {:+} hours", config.export.tz_offset_hours);
                println!();
                println!("[Email]");
                println!("  Enabled:         {}", config.email.enabled);
                println!();
                println!("[Teams]");
                println!("  Enabled:         {}", config.teams.enabled);
                println!(
                    "  Default webhook: {}",
                    if config.teams.default_webhook.is_empty() {
                        "(unset)"
                    } else {
                        config.teams.default_webhook.as_str()
                    }
                );
                println!("  Channels:        {}", config.teams.webhooks.len());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
    }
    Ok(())
}

fn print_event(reception: &Reception, event: &Event) {
    let registrations = reception.registrations().by_event(&event.id);
    let available = capacity::available(event, &registrations);

    println!("Name:       {}", event.name);
    match event.time {
        Some(time) => println!("Date:       {} {}", event.date, time.format("%H:%M")),
        None => println!("Date:       {}", event.date),
    }
    if !event.location.is_empty() {
        println!("Location:   {}", event.location);
    }
    println!("Status:     {}", event.status);
    println!("Capacity:   {} ({available} seats left)", event.capacity);
    if let Some(deadline) = event.registration_deadline {
        println!("Deadline:   {deadline}");
    }
    println!(
        "Accepting:  {}",
        if reception.can_register(event) {
            "yes"
        } else {
            "no"
        }
    );
}

fn print_registration(reception: &Reception, registration: &Registration) {
    let offset = reception.tz_offset();

    println!("Id:         {}", registration.id);
    println!("Name:       {}", registration.name);
    if !registration.furigana.is_empty() {
        println!("Furigana:   {}", registration.furigana);
    }
    println!("Email:      {}", registration.email);
    if !registration.company.is_empty() {
        println!("Company:    {}", registration.company);
    }
    if !registration.department.is_empty() {
        println!("Department: {}", registration.department);
    }
    match reception.events().get(&registration.event_id) {
        Some(event) => println!("Event:      {} ({})", event.name, event.id),
        None => println!("Event:      {}", registration.event_id),
    }
    println!("Status:     {}", registration.status);
    println!(
        "Registered: {}",
        export::format_local(registration.registered_at, offset)
    );
    if let Some(time) = registration.check_in_time {
        println!("Checked in: {}", export::format_local(time, offset));
    }
    if let Some(time) = registration.cancelled_at {
        println!("Cancelled:  {}", export::format_local(time, offset));
        if let Some(reason) = &registration.cancel_reason {
            if !reason.is_empty() {
                println!("Reason:     {reason}");
            }
        }
    }
    println!("QR token:   {}", registration.qr_code);
}

fn render_registrations(
    reception: &Reception,
    rows: &[Registration],
    format: OutputFormat,
) -> CliResult {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Plain => {
            for registration in rows {
                println!(
                    "{}  {}  {}  {}",
                    registration.id, registration.status, registration.name, registration.email
                );
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No registrations.");
                return Ok(());
            }
            let offset = reception.tz_offset();
            println!(
                "{:<28} {:<10} {:<20} {:<28} REGISTERED",
                "ID", "STATUS", "NAME", "EMAIL"
            );
            for registration in rows {
                println!(
                    "{:<28} {:<10} {:<20} {:<28} {}",
                    registration.id,
                    registration.status.to_string(),
                    registration.name,
                    registration.email,
                    export::format_local(registration.registered_at, offset)
                );
            }
        }
    }
    Ok(())
}
