use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use chemviz_telemetry::{DiagnosticLayer, TelemetryOptions};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "chemviz")]
#[command(about = "Chemviz - chemical equipment parameter visualizer client", long_about = None)]
struct Cli {
    /// Backend API base URL (overrides config.toml and CHEMVIZ_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding config.toml and session.toml
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print the underlying causes of failures after the command
    #[arg(long, global = true)]
    diagnostics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long, env = "CHEMVIZ_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(short, long, env = "CHEMVIZ_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Log in right after the account is created
        #[arg(long)]
        login: bool,
    },
    /// Forget the stored session token
    Logout,
    /// Show whether a session is stored and which backend is used
    Status,
    /// List recent uploads
    History,
    /// Show the dashboard for an upload
    Show {
        /// Upload to show (defaults to the most recent)
        #[arg(long)]
        id: Option<i64>,
        /// Only list rows containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Upload an equipment CSV file
    Upload { file: Option<PathBuf> },
    /// Download the PDF report
    Report {
        /// Directory to save report.pdf into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (diagnostics, mut receiver) = if cli.diagnostics {
        let (layer, receiver) = DiagnosticLayer::channel();
        (Some(layer), Some(receiver))
    } else {
        (None, None)
    };

    if let Err(e) = chemviz_telemetry::init(TelemetryOptions {
        json: cli.json_logs,
        diagnostics,
    })
    .context("Failed to initialize logging")
    {
        eprintln!("{}", format!("Error: {:#}", e).red());
        return ExitCode::FAILURE;
    }

    let result = commands::run(&cli).await;

    if let Some(receiver) = receiver.as_mut() {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        if !events.is_empty() {
            eprint!("{}", render::diagnostics(&events));
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            ExitCode::FAILURE
        }
    }
}
