use clap::Parser;

use orchestrix::cli::{Cli, Commands};
use orchestrix::config::ConfigLoader;
use orchestrix::db::run_migrations;
use orchestrix::logger::init_logger;
use orchestrix::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_config_file(path),
        None => match ConfigLoader::new() {
            Ok(loader) => loader,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                std::process::exit(1);
            }
        },
    };

    let settings = match loader.load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logger(&settings.logger) {
        eprintln!("Logger initialization error: {e}");
        std::process::exit(1);
    }

    match cli.command {
        Some(Commands::Migrate) => {
            run_migrations(&settings.database.url).await?;
            tracing::info!("Migration operation completed successfully");
            Ok(())
        }
        Some(Commands::Serve { dry_run: true }) => {
            // Settings already validated by the loader; nothing left to do.
            tracing::info!("Dry-run validation completed successfully");
            Ok(())
        }
        Some(Commands::Serve { dry_run: false }) | None => {
            match Server::new(settings).run().await {
                Ok(()) => {
                    tracing::info!("Server shutdown completed successfully");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Server error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
