use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use chemviz_core::api::UploadFile;
use chemviz_core::session::AuthState;
use chemviz_core::upload::UploadId;

use super::App;
use crate::render;

/// Mounts the controller and fails unless a stored session exists.
async fn mount_authenticated(app: &mut App) -> Result<()> {
    let state = app.controller.mount().await;
    app.flush_notices();
    if state != AuthState::Authenticated {
        bail!("Not logged in. Run `chemviz login` first.");
    }
    Ok(())
}

pub async fn history(app: &mut App) -> Result<()> {
    mount_authenticated(app).await?;
    print!("{}", render::history(app.controller.history()));
    Ok(())
}

pub async fn show(app: &mut App, id: Option<i64>, search: Option<&str>) -> Result<()> {
    mount_authenticated(app).await?;

    if let Some(id) = id {
        let result = app.controller.select(UploadId(id));
        app.finish(result)?;
    }
    if let Some(search) = search {
        let result = app.controller.set_search(search);
        app.finish(result)?;
    }

    match app.controller.view() {
        Some(view) => print!("{}", render::dashboard(&view, app.controller.search())),
        None => println!("{}", "No uploads yet. Run `chemviz upload <file>`.".bright_black()),
    }
    Ok(())
}

pub async fn upload(app: &mut App, file: Option<&Path>) -> Result<()> {
    mount_authenticated(app).await?;

    let file = match file {
        Some(path) => Some(read_upload_file(path).await?),
        None => None,
    };

    let result = app.controller.upload(file).await;
    let id = app.finish(result)?;
    println!("{}", format!("Uploaded as #{}", id).green());

    if let Some(view) = app.controller.view() {
        print!("{}", render::dashboard(&view, app.controller.search()));
    }
    Ok(())
}

async fn read_upload_file(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;
    Ok(UploadFile::new(file_name, bytes))
}

/// Saves into `--out` when given; bootstrap applies it to the config.
pub async fn report(app: &mut App) -> Result<()> {
    mount_authenticated(app).await?;

    let result = app.controller.download_report().await;
    let path = app.finish(result)?;
    println!("{}", format!("Report saved to {}", path.display()).green());
    Ok(())
}

pub async fn health(app: &App) -> Result<()> {
    let status = app
        .controller
        .check_health()
        .await
        .with_context(|| format!("Backend at {} is unreachable", app.config.api_base_url))?;
    println!("{} {}", "Backend:".bold(), status.green());
    Ok(())
}
