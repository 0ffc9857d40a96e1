//! agenda - Terminal Appointment Book
//!
//! Books contacts into free hourly slots and keeps the appointments in a
//! local JSON file or a remote spreadsheet. Runs as a terminal UI by
//! default; subcommands cover scripted use.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, fmt::writer::BoxMakeWriter, prelude::*};

use agenda::application::{App, AppMode};
use agenda::domain::{AppointmentStore, BookingRequest, BookingService, TimeSlot};
use agenda::infrastructure::{AppConfig, BackendKind, CsvExporter, load_config, open_store};
use agenda::presentation::{render_ui, InputHandler};

#[derive(Parser)]
#[command(name = "agenda", version, about = "Book and manage appointments from the terminal")]
struct Cli {
    /// Config file (defaults to <config dir>/agenda/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store backend: file, sheets or memory
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// JSON file used by the file backend
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive appointment book (default)
    Tui,
    /// Print appointments sorted by date and time
    List {
        /// Print as JSON instead of labels
        #[arg(long)]
        json: bool,
    },
    /// Book an appointment
    Book {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Hour as HH:00, 09:00 through 17:00
        #[arg(long)]
        time: TimeSlot,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete the appointment booked at a date and hour
    Cancel {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: TimeSlot,
    },
    /// Show the free hours on a date
    Slots {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Write all appointments to a CSV file
    Export { path: PathBuf },
}

/// Entry point for the agenda application.
///
/// Loads configuration, sets up logging, opens the configured store and
/// either runs the terminal UI or a single subcommand.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    if let Some(data) = cli.data {
        config.store.file.path = data;
    }

    let command = cli.command.unwrap_or(Command::Tui);
    let log_file = matches!(command, Command::Tui).then(|| config.log_file());
    init_tracing(log_file.as_deref());

    let booking = booking_service(&config)?;

    match command {
        Command::Tui => run_tui(booking),
        Command::List { json } => list(&booking, json),
        Command::Book {
            name,
            email,
            phone,
            date,
            time,
            description,
        } => {
            let mut booking = booking;
            let appointment = booking.submit(&BookingRequest {
                name,
                email,
                phone,
                date,
                time,
                description,
            })?;
            println!("Booked {}", appointment.label());
            Ok(())
        }
        Command::Cancel { date, time } => {
            let mut booking = booking;
            let Some(appointment) = booking.find(date, time)? else {
                bail!("no appointment at {} {}", date, time);
            };
            booking.cancel(&appointment)?;
            println!("Deleted {}", appointment.label());
            Ok(())
        }
        Command::Slots { date } => {
            let free = booking.free_slots(date)?;
            if free.is_empty() {
                println!("No free hours on {}", date);
            }
            for slot in free {
                println!("{}", slot);
            }
            Ok(())
        }
        Command::Export { path } => {
            let agenda = booking.agenda();
            if let Some(err) = agenda.error {
                return Err(err.into());
            }
            let filename = path.to_str().context("export path must be valid UTF-8")?;
            CsvExporter::export_appointments(&agenda.appointments, filename).map_err(anyhow::Error::msg)?;
            println!("Exported {} appointments to {}", agenda.appointments.len(), filename);
            Ok(())
        }
    }
}

fn booking_service(config: &AppConfig) -> Result<BookingService<Box<dyn AppointmentStore>>> {
    let store = open_store(&config.store)?;
    let booking = BookingService::new(store);
    Ok(match config.booking.window_days {
        0 => booking,
        days => booking.with_booking_window(days),
    })
}

fn list(booking: &BookingService<Box<dyn AppointmentStore>>, json: bool) -> Result<()> {
    let agenda = booking.agenda();
    if let Some(err) = agenda.error {
        return Err(err.into());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&agenda.appointments)?);
    } else if agenda.is_empty() {
        println!("No appointments scheduled.");
    } else {
        for label in agenda.labels() {
            println!("{}", label);
        }
    }
    Ok(())
}

/// Sets up the tracing subscriber.
///
/// `AGENDA_LOG` holds the filter and `AGENDA_LOG_FORMAT=json` switches to
/// JSON lines. When `log_file` is given (the terminal UI owns stderr) logs
/// are appended there, and dropped if the file cannot be opened.
fn init_tracing(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_env("AGENDA_LOG")
        .unwrap_or_else(|_| EnvFilter::new("agenda=info,warn"));

    let writer = match log_file {
        Some(path) => match open_log_file(path) {
            Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
            Err(_) => BoxMakeWriter::new(io::sink),
        },
        None => BoxMakeWriter::new(io::stderr),
    };

    let format = std::env::var("AGENDA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(writer))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_ansi(log_file.is_none()).with_writer(writer))
                .init();
        }
    }
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Runs the terminal UI until the user quits.
fn run_tui(booking: BookingService<Box<dyn AppointmentStore>>) -> Result<()> {
    info!(backend = booking.store().backend_name(), "starting terminal ui");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(booking);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

/// Main application event loop.
///
/// Handles terminal rendering and keyboard input processing.
/// Continues running until the user presses 'q' on the appointment list
/// or Ctrl+C anywhere.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                    KeyCode::Char('q') if app.mode == AppMode::Browse => return Ok(()),
                    _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                }
            }
        }
    }
}
