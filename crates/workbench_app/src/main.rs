mod app;
mod cli;
mod config;
mod effects;
mod export;
mod persistence;
mod render;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use workbench_core::Msg;
use workbench_engine::{EngineHandle, OutputDir};
use workbench_logging::{wb_info, LogDestination, DEFAULT_LOG_FILE};

use app::App;
use cli::{Cli, Commands};
use config::{AppConfig, API_BASE_ENV};
use effects::EffectRunner;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILE.into());
    workbench_logging::initialize(LogDestination::File(log_file), level);

    let config = AppConfig::load()?.with_overrides(
        std::env::var(API_BASE_ENV).ok(),
        cli.api_base.clone(),
        cli.output_dir.clone(),
    );
    wb_info!("Using backend {}", config.api_base);

    let output = OutputDir::new(config.resolved_output_dir());
    let engine = EngineHandle::new(config.client_settings())?;
    let mut app = App::new(EffectRunner::new(engine, output));

    match cli.command {
        Commands::Ask {
            message,
            doc,
            timeout,
            tab,
        } => {
            for path in &doc {
                app.add_text_document(path)?;
            }
            app.ask(&message, timeout.map(Duration::from_secs));
            app.print_tab(tab.into());
        }
        Commands::Chat { timeout } => app.chat(timeout.map(Duration::from_secs))?,
        Commands::Upload { path } => app.upload(&path.to_string_lossy()),
        Commands::Export => app.dispatch(Msg::ExportRequested),
        Commands::Show { tab } => {
            app.print_conversation();
            app.print_tab(tab.into());
        }
        Commands::NewCase => app.dispatch(Msg::NewCase),
        Commands::SaveConfig => {
            let path = AppConfig::config_path()?;
            config.save_to(&path)?;
            println!("Config written to {}", path.display());
        }
    }

    app.shutdown();
    Ok(())
}
