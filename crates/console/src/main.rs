use anyhow::Context;
use clap::Parser;

use metroconsole_console::{Args, Command, ConsoleConfig, ConsoleContext};
use metroconsole_session::LoginRequest;

const ENV_PASSWORD: &str = "METROCONSOLE_PASSWORD";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = Args::parse().into_command();

    let config = ConsoleConfig::from_env().context("invalid configuration")?;
    metroconsole_observability::init_with(config.log_filter.as_deref(), config.log_json);

    let ctx = ConsoleContext::from_config(config)?;

    match command {
        Command::Logout => {
            ctx.logout();
            tracing::info!("stored credential cleared");
            return Ok(());
        }
        Command::Login { username } => {
            let password = std::env::var(ENV_PASSWORD).unwrap_or_default();
            if let Err(e) = ctx.login(LoginRequest::new(username, password)).await {
                eprintln!("{}", e.user_message());
            }
        }
        Command::Show => {
            ctx.start().await;
        }
    }

    let report = serde_json::to_string_pretty(&ctx.report())?;
    println!("{report}");
    Ok(())
}
