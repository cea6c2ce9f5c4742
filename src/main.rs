use clap::Parser;
use minimarket_views::args::{Args, Command, SessionCommand};
use minimarket_views::{commands, AppContext, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().minimarket_home().path();

    match args.command() {
        Command::Init => commands::init(home).await?.print(),
        command => {
            let mut ctx = AppContext::load(Config::load(home).await?).await;
            run(&mut ctx, command).await?
        }
    }
    Ok(())
}

async fn run(ctx: &mut AppContext, command: &Command) -> Result<()> {
    let _: () = match command {
        Command::Init => commands::init(ctx.config().root()).await?.print(),
        Command::View(view_args) => commands::view(ctx, view_args).await?.print(),
        Command::Settings(settings_args) => commands::settings(ctx, settings_args.update())
            .await?
            .print(),
        Command::Session(session_args) => match session_args.action() {
            SessionCommand::Show => commands::session_show(ctx)?.print(),
            SessionCommand::Start { user } => commands::session_start(ctx, user).await?.print(),
            SessionCommand::Logout => commands::session_logout(ctx).await?.print(),
        },
        Command::Alertas(alertas_args) => commands::alertas(ctx, alertas_args.todas())
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => {
            // Only this package's library and binary log at the requested level.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
