//! meet-recorder: CLI host for the recording engine.
//!
//! Runs the detector against JSON page fixtures and manages the persisted
//! feature flag under `~/.meet-recorder/`.
//!
//! ## Subcommands
//!
//! - `simulate`: Drive the detector over a fixture in virtual (or real) time
//! - `inspect`: Show what every UI query resolves to in a fixture
//! - `enable` / `disable`: Toggle the `extensionEnabled` flag
//! - `status`: Print the flag and storage locations

mod inspect;
mod logging;
mod simulate;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use meet_recorder_core::{FileSettingsStore, SettingsStore, StorageConfig};
use meet_recorder_protocol::DetectionMethod;

#[derive(Parser)]
#[command(name = "meet-recorder")]
#[command(about = "Automatic meeting recording engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Dom,
    Polling,
}

impl From<MethodArg> for DetectionMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Dom => DetectionMethod::Dom,
            MethodArg::Polling => DetectionMethod::Polling,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run detection and activation against a page fixture
    Simulate {
        /// JSON page fixture
        #[arg(value_name = "FIXTURE")]
        fixture: PathBuf,

        /// Detection method named in the start request
        #[arg(long, value_enum, default_value_t = MethodArg::Dom)]
        method: MethodArg,

        /// recorder.toml to use instead of the one under the storage root
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop at this virtual time instead of running until idle
        #[arg(long)]
        until_ms: Option<u64>,

        /// Print the phase trace before the summary
        #[arg(long)]
        trace: bool,

        /// Sleep through delays instead of jumping over them
        #[arg(long)]
        realtime: bool,
    },

    /// Show what each UI query matches in a page fixture
    Inspect {
        #[arg(value_name = "FIXTURE")]
        fixture: PathBuf,
    },

    /// Enable automatic recording
    Enable,

    /// Disable automatic recording
    Disable,

    /// Show the feature flag and storage paths
    Status,
}

fn main() {
    let storage = match StorageConfig::from_home() {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("meet-recorder: {}", e);
            std::process::exit(1);
        }
    };
    let _logging_guard = logging::init(&storage.logs_dir());
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            fixture,
            method,
            config,
            until_ms,
            trace,
            realtime,
        } => simulate::run(
            &storage,
            simulate::SimulateOptions {
                fixture,
                method: method.into(),
                config,
                until_ms,
                trace,
                realtime,
            },
        ),
        Commands::Inspect { fixture } => inspect::run(&fixture),
        Commands::Enable => set_enabled(&storage, true),
        Commands::Disable => set_enabled(&storage, false),
        Commands::Status => {
            print_status(&storage);
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "meet-recorder failed");
        eprintln!("meet-recorder: {}", e);
        std::process::exit(1);
    }
}

fn set_enabled(storage: &StorageConfig, enabled: bool) -> meet_recorder_core::Result<()> {
    let store = FileSettingsStore::new(storage.settings_file());
    store.set_extension_enabled(enabled)?;
    tracing::info!(enabled, path = %store.path().display(), "Extension flag written");
    println!(
        "Automatic recording {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn print_status(storage: &StorageConfig) {
    let store = FileSettingsStore::new(storage.settings_file());
    println!("extensionEnabled: {}", store.extension_enabled());
    println!("settings: {}", storage.settings_file().display());
    println!("config:   {}", storage.config_file().display());
    println!("logs:     {}", storage.logs_dir().display());
}
