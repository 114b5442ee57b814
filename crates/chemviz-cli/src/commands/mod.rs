use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use chemviz_application::DashboardController;
use chemviz_core::config::ClientConfig;
use chemviz_infrastructure::{ConfigService, FileTokenRepository};
use chemviz_interaction::HttpEquipmentApi;

use crate::{Cli, Commands, render};

mod auth;
mod dashboard;

/// Everything a command needs, wired from the config file.
pub struct App {
    pub config: ClientConfig,
    pub tokens: Arc<FileTokenRepository>,
    pub controller: DashboardController,
}

impl App {
    fn bootstrap(cli: &Cli) -> Result<Self> {
        let base = cli.config_dir.as_deref();
        let mut config = ConfigService::new(base)?
            .load()
            .context("Failed to load configuration")?;
        if let Some(url) = &cli.api_url {
            config = config.with_api_base_url(url.as_str());
        }
        if let Commands::Report { out: Some(dir) } = &cli.command {
            config.download_dir = Some(dir.clone());
        }
        tracing::debug!(api_base_url = %config.api_base_url, "Configuration loaded");

        let api = Arc::new(HttpEquipmentApi::new(config.clone())?);
        let tokens = Arc::new(FileTokenRepository::new(base)?);
        let controller = DashboardController::new(api, tokens.clone())
            .with_download_dir(config.download_dir());

        Ok(Self {
            config,
            tokens,
            controller,
        })
    }

    /// Prints and drains pending notices.
    pub fn flush_notices(&mut self) {
        for notice in self.controller.take_notices() {
            println!("{}", render::notice(&notice));
        }
    }

    /// Prints pending notices, then hands back `result` with anyhow context.
    pub fn finish<T>(&mut self, result: chemviz_core::error::Result<T>) -> Result<T> {
        self.flush_notices();
        Ok(result?)
    }
}

pub async fn run(cli: &Cli) -> Result<()> {
    let mut app = App::bootstrap(cli)?;

    match &cli.command {
        Commands::Login { username, password } => {
            let password = password_or_stdin(password.as_deref())?;
            auth::login(&mut app, username, &password).await
        }
        Commands::Register {
            username,
            email,
            password,
            login,
        } => {
            let password = password_or_stdin(password.as_deref())?;
            auth::register(&mut app, username, email, &password, *login).await
        }
        Commands::Logout => auth::logout(&mut app).await,
        Commands::Status => auth::status(&mut app).await,
        Commands::History => dashboard::history(&mut app).await,
        Commands::Show { id, search } => dashboard::show(&mut app, *id, search.as_deref()).await,
        Commands::Upload { file } => dashboard::upload(&mut app, file.as_deref()).await,
        Commands::Report { .. } => dashboard::report(&mut app).await,
        Commands::Health => dashboard::health(&app).await,
    }
}

fn password_or_stdin(password: Option<&str>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password.to_string());
    }

    eprint!("{}", "Password: ".bright_black());
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
