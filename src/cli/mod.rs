use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};

pub mod admin;
pub mod appointments;
pub mod availability;
pub mod init;
pub mod login;
pub mod migrate;
pub mod serve;

use crate::core::{AppConfig, init_tracing};
use crate::scheduling::slot_key::parse_instant;
use crate::scheduling::week::TimeOfDay;
use crate::session::Role;

#[derive(Subcommand)]
enum Command {
    /// Initialize the clinic database
    Init {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Migrate the db schema
    Migrate {
        #[arg(long, action, default_value = "false")]
        db: bool,
    },
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Store a session for the given email
    Login {
        #[arg(long, required_unless_present = "url")]
        email: Option<String>,
        /// Defaults to admin for @admin.edu addresses
        #[arg(long, value_enum)]
        role: Option<Role>,
        /// Take the session from a URL's `session` query parameter
        #[arg(long, conflicts_with = "email")]
        url: Option<String>,
    },
    /// Forget the stored session
    Logout {},
    /// Show the stored session
    Whoami {},
    /// Show available times for a week
    Calendar {
        #[arg(long = "type", default_value = "general")]
        appointment_type: String,
        #[arg(long, value_enum, default_value = "all")]
        filter: TimeOfDay,
        /// 0 for this week, 1 for next week
        #[arg(long, default_value = "0")]
        week: u8,
    },
    /// Book an appointment
    Book {
        #[arg(long = "type", default_value = "general")]
        appointment_type: String,
        /// Start time, e.g. 2024-01-08T09:00
        #[arg(long)]
        start: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your appointments
    Mine {},
    /// Replace the notes on an appointment
    Notes {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List new times for an appointment or move it to one of them
    Reschedule {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        start: Option<String>,
    },
    /// Cancel an appointment
    Cancel {
        #[arg(long)]
        id: i64,
    },
    /// Show the admin block-time grid
    Grid {
        /// Any date in the week to show
        #[arg(long)]
        week: Option<NaiveDate>,
    },
    /// Block or unblock a time
    Toggle {
        #[arg(long)]
        start: String,
    },
    /// Show the admin grid and keep booked times fresh
    Watch {
        #[arg(long)]
        week: Option<NaiveDate>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub fn parse_start(raw: &str) -> Result<NaiveDateTime> {
    parse_instant(raw, &Local).ok_or_else(|| anyhow!("Invalid start time \"{}\"", raw))
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    let config = AppConfig::default();

    if !matches!(args.command, Some(Command::Serve { .. })) {
        init_tracing(format!("{}=info", env!("CARGO_CRATE_NAME")));
    }

    // Handle each sub command
    match args.command {
        Some(Command::Init { db }) => {
            init::run(db, &config).await?;
        }
        Some(Command::Migrate { db }) => {
            migrate::run(db, &config).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await?;
        }
        Some(Command::Login { email, role, url }) => {
            login::login(&config, email, role, url)?;
        }
        Some(Command::Logout {}) => {
            login::logout(&config)?;
        }
        Some(Command::Whoami {}) => {
            login::whoami(&config);
        }
        Some(Command::Calendar {
            appointment_type,
            filter,
            week,
        }) => {
            availability::calendar(&config, &appointment_type, filter, week.try_into()?).await?;
        }
        Some(Command::Book {
            appointment_type,
            start,
            notes,
        }) => {
            availability::book(&config, &appointment_type, parse_start(&start)?, notes).await?;
        }
        Some(Command::Mine {}) => {
            appointments::mine(&config).await?;
        }
        Some(Command::Notes { id, notes }) => {
            appointments::notes(&config, id, notes).await?;
        }
        Some(Command::Reschedule { id, start }) => {
            let start = start.as_deref().map(parse_start).transpose()?;
            appointments::reschedule(&config, id, start).await?;
        }
        Some(Command::Cancel { id }) => {
            appointments::cancel(&config, id).await?;
        }
        Some(Command::Grid { week }) => {
            admin::grid(&config, week).await?;
        }
        Some(Command::Toggle { start }) => {
            admin::toggle(&config, parse_start(&start)?).await?;
        }
        Some(Command::Watch { week }) => {
            admin::watch(&config, week).await?;
        }
        None => {}
    }

    Ok(())
}
