use std::io;
use std::process::ExitCode;

use anyhow::Context;
use client_logging::client_info;
use frame_search_core::AppState;
use frame_search_engine::EngineHandle;

pub mod app;
pub mod cli;
pub mod config;
pub mod effects;
pub mod logging;
pub mod ui;

use app::Coordinator;
use cli::{Cli, Commands};
use effects::EffectRunner;
use ui::render::TerminalRenderer;

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(service_url) = cli.service_url {
        config.service_url = service_url;
    }
    if let Some(destination) = cli.log {
        config.log = destination;
    }
    logging::initialize(config.log, config.level_filter()?, &config.log_file);
    client_info!("frame-search starting service_url={}", config.service_url);

    let engine = EngineHandle::new(config.engine_settings()).context("starting engine")?;
    let mut coordinator = Coordinator::new(
        AppState::with_service_url(config.service_url.as_str()),
        EffectRunner::new(engine),
        TerminalRenderer::new(io::stdout()),
    );

    let succeeded = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            coordinator.run_shell()?;
            true
        }
        Commands::Upload { video, title } => coordinator.upload_once(video, title)?,
        Commands::Search { query, save_dir } => coordinator.search_once(query, save_dir)?,
    };
    client_info!("frame-search exiting succeeded={}", succeeded);
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
