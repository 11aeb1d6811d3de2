//! Main entry point for the espeto order service.
//!
//! This binary wires the order store, the chat transports, the lifecycle
//! engine and the operator HTTP API into one process. Components are
//! pluggable: each seam is created by the factory registered under the name
//! the configuration selects.

use clap::Parser;
use espeto_config::Config;
use espeto_core::{Bot, BotBuilder, BotError, BotFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the order service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the order service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the bot with all registered implementations
/// 5. Runs the bot and the operator API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).with_target(true).init();

	tracing::info!("Started espeto service");

	// Load configuration
	let config = Config::from_file(&args.config.to_string_lossy())?;
	tracing::info!("Loaded configuration");

	// Build the bot with registered implementations
	let bot = build_bot(config.clone())?;
	let bot = Arc::new(bot);

	// Ctrl-C cancels the process-wide shutdown token
	let shutdown = bot.shutdown_token();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::info!("Shutdown signal received");
			shutdown.cancel();
		}
	});

	let api_enabled = config.api.as_ref().is_some_and(|api| api.enabled);

	if api_enabled {
		let api_config = config.api.as_ref().unwrap().clone();

		// Run the bot and the API server concurrently
		let bot_task = bot.run();
		let api_task = server::start_server(
			api_config,
			bot.engine().clone(),
			bot.outbound().clone(),
			bot.shutdown_token(),
		);

		tokio::select! {
			result = bot_task => {
				tracing::info!("Bot finished");
				result?;
			}
			result = api_task => {
				tracing::info!("API server finished");
				result?;
			}
		}
	} else {
		// Run only the bot
		tracing::info!("Starting bot only");
		bot.run().await?;
	}

	tracing::info!("Stopped espeto service");
	Ok(())
}

/// Builds the bot with all registered seam implementations.
///
/// Every implementation each seam crate ships is registered under its
/// configuration name; the configuration's `primary` picks the one used.
fn build_bot(config: Config) -> Result<Bot, BotError> {
	let factories = BotFactories {
		store_factories: espeto_store::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
		inbound_factories: espeto_chat::get_all_inbound_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
		outbound_factories: espeto_chat::get_all_outbound_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
	};

	BotBuilder::new(config).build(factories)
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_CONFIG: &str = r#"
[service]
menu_url = "https://example.com/cardapio"
contact = "+55 68 9000-0000"

[store]
primary = "memory"
[store.implementations.memory]

[chat.inbound]
primary = "webhook"
[chat.inbound.implementations.webhook]
port = 3102

[chat.outbound]
primary = "memory"
[chat.outbound.implementations.memory]

[api]
enabled = false
"#;

	#[test]
	fn test_args_default_values() {
		let args = Args {
			config: PathBuf::from("config.toml"),
			log_level: "info".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_build_bot_with_minimal_config() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let result = build_bot(config);
		assert!(result.is_ok(), "Failed to build bot: {:?}", result.err());
	}

	#[test]
	fn test_build_bot_with_file_config() {
		let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("test_config.toml");
		std::fs::write(&config_path, TEST_CONFIG).expect("Failed to write config");

		let config =
			Config::from_file(&config_path.to_string_lossy()).expect("Failed to load config");
		assert_eq!(config.store.primary, "memory");
		assert!(!config.api.unwrap().enabled);
	}
}
