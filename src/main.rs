use std::path::Path;

use clap::{Parser, Subcommand};
use csv2sql::{config, logfiles, run};

#[derive(Parser)]
#[command(name = "csv2sql", about = "csv2sql - CSV upload, normalization and SQL export service")]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
	/// Run the HTTP service (default)
	Run,
	/// Delete log files older than the retention window and exit
	CleanupLogs,
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	let settings = match config::load() {
		Ok(s) => s,
		Err(e) => {
			eprintln!("failed to load config, using defaults: {}", e);
			config::Settings::default()
		}
	};

	if let Err(e) = logfiles::init_logging(
		Path::new(&settings.logs_dir),
		settings.log_level.to_level_filter(),
	) {
		eprintln!("failed to initialize logging: {}", e);
	}

	match cli.command.unwrap_or(Commands::Run) {
		Commands::CleanupLogs => {
			let store =
				logfiles::LogStore::new(&settings.logs_dir, settings.log_retention_days);
			match store.cleanup() {
				Ok(removed) => println!("removed {} old log files", removed),
				Err(e) => {
					eprintln!("log cleanup failed: {}", e);
					std::process::exit(1);
				}
			}
		}
		Commands::Run => {
			if let Err(e) = run(settings).await {
				log::error!("server exited with error: {:#}", e);
				std::process::exit(1);
			}
		}
	}
}
