use anyhow::Result;
use colored::Colorize;

use chemviz_core::session::AuthState;

use super::App;

pub async fn login(app: &mut App, username: &str, password: &str) -> Result<()> {
    let result = app.controller.login(username, password).await;
    app.finish(result)?;

    let uploads = app.controller.history().items().len();
    println!("{}", format!("Logged in as {}", username).green());
    println!("{}", format!("{} upload(s) in history", uploads).bright_black());
    Ok(())
}

pub async fn register(
    app: &mut App,
    username: &str,
    email: &str,
    password: &str,
    then_login: bool,
) -> Result<()> {
    let result = if then_login {
        app.controller
            .register_and_login(username, email, password)
            .await
    } else {
        app.controller
            .register(username, email, password)
            .await
            .map(|_| ())
    };
    app.finish(result)?;

    if then_login {
        println!("{}", format!("Logged in as {}", username).green());
    }
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    app.controller.logout().await;
    app.flush_notices();
    println!("{}", "Logged out".green());
    Ok(())
}

pub async fn status(app: &mut App) -> Result<()> {
    let state = app.controller.mount().await;
    app.flush_notices();

    match state {
        AuthState::Authenticated => println!("{}", "Logged in".green()),
        AuthState::Unauthenticated => println!("{}", "Not logged in".yellow()),
    }
    println!("API:     {}", app.config.api_base_url);
    println!("Session: {}", app.tokens.path().display());
    Ok(())
}
