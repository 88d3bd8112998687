use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use shared::{BookingStatus, CompanionFilter, CreateBookingRequest, EnergyType, PresenceNature};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;
mod output;

use api::ApiClient;

// Default server URL
const DEFAULT_SERVER: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "sathi")]
#[command(about = "Browse companions and manage bookings on a Sathi server")]
#[command(version)]
struct Cli {
    /// Server URL (overrides config)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Auth token (overrides config)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: Option<String>,
        /// Never prompted for; pass it here or through SATHI_PASSWORD
        #[arg(long, env = "SATHI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Login to the Sathi server
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Never prompted for; pass it here or through SATHI_PASSWORD
        #[arg(long, env = "SATHI_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Logout from the Sathi server
    Logout,
    /// Show current login status
    Whoami,
    /// List available companions
    Companions {
        /// Match against name or city
        #[arg(long)]
        search: Option<String>,
        /// Only this energy type (e.g. calm_listener)
        #[arg(long)]
        energy: Option<EnergyType>,
    },
    /// Request a booking
    Book {
        companion_id: String,
        /// Session date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Start time, HH:MM
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        /// Duration in whole hours (1-6)
        #[arg(long)]
        hours: u32,
        #[arg(long)]
        venue: String,
        #[arg(long)]
        address: String,
        /// Kind of presence (e.g. cafe_companion)
        #[arg(long)]
        nature: PresenceNature,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your bookings
    Bookings,
    /// List your confirmed bookings from today onward
    Active,
    /// Cancel one of your bookings
    Cancel { booking_id: String },
    /// Show what cancelling now would refund
    Quote { booking_id: String },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Administrator commands
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (server, token)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

#[derive(Subcommand)]
enum AdminAction {
    /// List every booking with client and companion
    Bookings,
    /// Set a booking's status (pending, confirmed, completed, cancelled)
    Status {
        booking_id: String,
        status: BookingStatus,
    },
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time {:?}, expected HH:MM", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sathi=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = config::Config::load().unwrap_or_default();
    let server = cli
        .server
        .clone()
        .or(config.remote.server.clone())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let client = ApiClient::new(&server, cli.token.clone().or(config.remote.token.clone()));

    match cli.command {
        Commands::Register {
            email,
            password,
            full_name,
        } => auth::register(&mut config, &server, email, password, full_name).await?,
        Commands::Login { email, password } => {
            auth::login(&mut config, &server, email, password).await?
        }
        Commands::Logout => auth::logout(&mut config)?,
        Commands::Whoami => auth::whoami(&config, &server),
        Commands::Companions { search, energy } => {
            let filter = CompanionFilter {
                search,
                energy_type: energy,
            };
            let companions = client.companions(&filter).await?;
            if companions.is_empty() {
                println!("No companions match");
            }
            for c in &companions {
                println!("{}", output::companion_line(c));
            }
        }
        Commands::Book {
            companion_id,
            date,
            time,
            hours,
            venue,
            address,
            nature,
            phone,
            notes,
        } => {
            let booking = client
                .create_booking(&CreateBookingRequest {
                    companion_id,
                    booking_date: date,
                    start_time: time,
                    duration_hours: hours,
                    venue_name: venue,
                    venue_address: address,
                    presence_nature: nature,
                    special_notes: notes,
                    phone,
                })
                .await?;
            println!("\x1b[1;32m✅ Booking requested\x1b[0m");
            println!("{}", output::booking_line(&booking));
        }
        Commands::Bookings => {
            let bookings = client.my_bookings().await?;
            if bookings.is_empty() {
                println!("No bookings yet");
            }
            for view in &bookings {
                println!("{}", output::client_booking_line(view));
            }
        }
        Commands::Active => {
            let active = client.active_bookings().await?;
            if active.is_empty() {
                println!("No confirmed upcoming bookings");
            }
            for view in &active {
                println!("{}", output::client_booking_line(view));
            }
        }
        Commands::Cancel { booking_id } => {
            let resp = client.transition(&booking_id, BookingStatus::Cancelled).await?;
            println!("{}", output::booking_line(&resp.booking));
            if let Some(refund) = &resp.refund {
                println!("{}", output::refund_line(refund));
            }
        }
        Commands::Quote { booking_id } => {
            let quote = client.refund_quote(&booking_id).await?;
            println!("{}", output::refund_line(&quote));
        }
        Commands::Config { action } => handle_config_command(&mut config, action)?,
        Commands::Admin { action } => match action {
            AdminAction::Bookings => {
                for view in client.admin_bookings().await? {
                    println!("{}", output::admin_booking_line(&view));
                }
            }
            AdminAction::Status { booking_id, status } => {
                let resp = client.transition(&booking_id, status).await?;
                tracing::info!("Booking {} set to {}", booking_id, status);
                println!("{}", output::booking_line(&resp.booking));
            }
        },
    }

    Ok(())
}

fn handle_config_command(config: &mut config::Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "server" => config.remote.server = Some(value),
                "token" => config.remote.token = Some(value),
                _ => anyhow::bail!("Unknown config key: {}. Valid keys: server, token", key),
            }
            config.save()?;
            println!("Configuration saved");
        }
        ConfigAction::Get { key } => {
            let value = match key.as_str() {
                "server" => config.remote.server.clone().unwrap_or_default(),
                "token" => config.remote.token.as_ref().map(|_| "****").unwrap_or_default().to_string(),
                _ => anyhow::bail!("Unknown config key: {}", key),
            };
            println!("{}", value);
        }
        ConfigAction::Show => {
            println!("server: {}", config.remote.server.clone().unwrap_or_default());
            println!("token: {}", config.remote.token.as_ref().map(|_| "****").unwrap_or_default());
            println!("user_id: {}", config.remote.user_id.clone().unwrap_or_default());
        }
        ConfigAction::Path => {
            let path = config::Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn book_parses_typed_arguments() {
        let cli = Cli::try_parse_from([
            "sathi", "book", "meera", "--date", "2026-10-20", "--time", "18:30", "--hours", "3",
            "--venue", "Roastery", "--address", "Banjara Hills", "--nature", "cafe_companion",
            "--phone", "+91 98765 43210",
        ])
        .unwrap();
        match cli.command {
            Commands::Book { time, nature, hours, .. } => {
                assert_eq!(time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
                assert_eq!(nature, PresenceNature::CafeCompanion);
                assert_eq!(hours, 3);
            }
            _ => panic!("expected book"),
        }
    }

    #[test]
    fn active_is_a_command() {
        assert!(matches!(
            Cli::try_parse_from(["sathi", "active"]).unwrap().command,
            Commands::Active
        ));
    }

    #[test]
    fn unknown_status_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["sathi", "admin", "status", "b1", "refunded"]).is_err());
        assert!(Cli::try_parse_from(["sathi", "admin", "status", "b1", "completed"]).is_ok());
    }
}
