//! prescription-ocr - Handwritten prescription recognition
//!
//! Reads handwritten prescription images with a CTC recognition model,
//! saves results to the pharmacy backend, and evaluates the model offline
//! against a labeled validation set.

mod app;
mod backend;
mod config;
mod evaluation;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::{EvaluateOptions, PredictOptions, PrescriptionApp};
use crate::config::AppConfig;
use crate::evaluation::MatchMode;

/// Handwritten prescription OCR
#[derive(Parser, Debug)]
#[command(name = "rx-ocr")]
#[command(about = "Recognize handwritten prescriptions and evaluate the recognition model")]
struct Args {
    /// Configuration file (defaults to config.toml in the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the text in one prescription image
    Predict {
        /// Image file (jpg, jpeg or png)
        image: PathBuf,

        /// Save the prediction to the backend
        #[arg(long)]
        save: bool,

        /// Pharmacist the saved prescription belongs to
        #[arg(long)]
        pharmacist_id: Option<i64>,
    },
    /// Evaluate the model against a labeled CSV dataset
    Evaluate {
        /// CSV file of image_path,label rows
        dataset: PathBuf,

        /// The first row is data, not a header
        #[arg(long)]
        no_header: bool,

        /// Directory relative image paths are resolved against
        #[arg(long)]
        image_root: Option<PathBuf>,

        /// How predicted characters are credited (overrides config)
        #[arg(long, value_enum)]
        match_mode: Option<MatchMode>,

        /// Also write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// List prescriptions saved by a pharmacist
    History {
        #[arg(long)]
        pharmacist_id: i64,
    },
    /// Delete old files from the upload folder
    Cleanup,
    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only results
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => storage::get_config_dir()?.join("config.toml"),
    };
    let mut config = load_or_default_config(&config_path)?;
    config.apply_env();

    let app = PrescriptionApp::new(config);

    match args.command {
        Command::Predict {
            image,
            save,
            pharmacist_id,
        } => app.predict(&PredictOptions {
            image,
            save,
            pharmacist_id,
        })?,
        Command::Evaluate {
            dataset,
            no_header,
            image_root,
            match_mode,
            json,
        } => {
            let settings = &app.config().evaluation;
            app.evaluate(&EvaluateOptions {
                dataset,
                has_header: settings.has_header && !no_header,
                image_root,
                match_mode: match_mode.unwrap_or(settings.match_mode),
                json,
            })?
        }
        Command::History { pharmacist_id } => app.history(pharmacist_id)?,
        Command::Cleanup => {
            let removed = app.cleanup()?;
            println!("Removed {} old file(s)", removed);
        }
        Command::Config { init } => {
            if init && !config_path.exists() {
                config::save_config(&AppConfig::default(), &config_path)?;
                info!("Wrote default configuration to {:?}", config_path);
            }
            println!("# {}", config_path.display());
            print!("{}", toml::to_string_pretty(app.config())?);
        }
    }

    Ok(())
}

/// Load configuration from file, falling back to defaults when absent
fn load_or_default_config(path: &std::path::Path) -> Result<AppConfig> {
    if path.exists() {
        let config = config::load_config(path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }
    info!("Using default configuration");
    Ok(AppConfig::default())
}
