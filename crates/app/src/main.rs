//! momo - turns a mobile-money SMS export into categorised transaction records.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "momo")]
#[command(version, about = "Extract and classify mobile-money SMS transactions", long_about = None)]
struct Cli {
    /// Engine config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Category rule table (TOML); overrides the config file
    #[arg(long, global = true)]
    categories: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an SMS backup archive into transaction records
    Extract {
        /// SMS backup XML file
        archive: PathBuf,

        /// Where to write accepted records as JSON (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append-only log of rejected messages
        #[arg(long, default_value = "unprocessed_sms.log")]
        audit_log: PathBuf,

        /// Audit log line format (text, json)
        #[arg(long, default_value = "text")]
        audit_format: String,

        /// Clock for rendering timestamps (local, utc, +02:00); overrides the config file
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Print the category a message body would be assigned
    Classify {
        /// Message body
        body: String,
    },

    /// Print the ordered category rule table
    Categories {
        /// Emit JSON instead of a plain listing
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = commands::Settings {
        config: cli.config,
        categories: cli.categories,
    };

    let result = match cli.command {
        Commands::Extract {
            archive,
            output,
            audit_log,
            audit_format,
            timezone,
        } => commands::extract(
            &settings,
            &commands::ExtractArgs {
                archive,
                output,
                audit_log,
                audit_format,
                timezone,
            },
        ),
        Commands::Classify { body } => commands::classify(&settings, &body),
        Commands::Categories { json } => commands::categories(&settings, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
