//! `valudash` - CLI for the currency-exchange registry dashboard
//!
//! This binary renders the dashboard in the terminal and manages the
//! runtime feature flags gating its panels.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use valutadash::cli::{Cli, Command, ConfigCommand, FlagsCommand};
use valutadash::dashboard::DashboardShell;
use valutadash::resolver;
use valutadash::{
    init_logging, Capability, CapabilityCategory, Config, FileFlagPersistence, FlagStore,
    FlagTable,
};
use valutadash_data::{
    setup_polling, DataService, FileRecordFetcher, MockAuthService, SheetsDataService,
    StaticDataService, TelemetrySink, TracingTelemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Flags(flags_cmd) => handle_flags(&config, flags_cmd),
        Command::Dashboard => handle_dashboard(&config).await,
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

/// Resolve the session flag store from the table and the persisted copy.
fn build_store(config: &Config) -> (FlagStore, FlagTable) {
    let table = FlagTable::load(&config.production_table_path());
    let persistence = Box::new(FileFlagPersistence::new(config.persistence_path()));
    let store = FlagStore::resolve(config.environment(), &table, persistence);
    (store, table)
}

fn handle_flags(config: &Config, cmd: FlagsCommand) -> Result<()> {
    let (mut store, table) = build_store(config);
    match cmd {
        FlagsCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.flags())?);
            } else {
                println!("Feature flags ({})", config.environment());
                for category in [
                    CapabilityCategory::Visualization,
                    CapabilityCategory::Integration,
                    CapabilityCategory::Advanced,
                ] {
                    println!("[{category}]");
                    for capability in Capability::ALL
                        .into_iter()
                        .filter(|c| c.category() == category)
                    {
                        let state = if store.is_enabled(capability) { "on" } else { "off" };
                        println!("  {:<26} {state}", capability.name());
                    }
                }
            }
        }
        FlagsCommand::Set { capability, state } => {
            store.update_flag(capability, state.as_bool());
            println!(
                "{} -> {}",
                capability.name(),
                if state.as_bool() { "on" } else { "off" }
            );
        }
        FlagsCommand::EnableAll => {
            store.enable_all();
            println!("All capabilities enabled.");
        }
        FlagsCommand::DisableAll => {
            store.disable_all();
            println!("All capabilities disabled.");
        }
        FlagsCommand::Reset => {
            let default = resolver::environment_default(config.environment(), &table);
            store.reset(default);
            println!(
                "Flags reset to the {} default; persisted copy cleared.",
                config.environment()
            );
        }
    }
    Ok(())
}

async fn handle_dashboard(config: &Config) -> Result<()> {
    let (store, _table) = build_store(config);
    let telemetry: Arc<dyn TelemetrySink> = Arc::new(TracingTelemetry::new());

    // The live source is consulted only while its gating capability is on
    let live = store.is_enabled(Capability::GoogleSheets) && config.data.use_live_source;
    let data: Arc<dyn DataService> = match (&config.data.endpoint, live) {
        (Some(endpoint), true) => Arc::new(SheetsDataService::new(
            Box::new(FileRecordFetcher::new(endpoint)),
            telemetry.clone(),
        )),
        _ => Arc::new(StaticDataService::new()),
    };

    let poll = store.is_enabled(Capability::RealTimeSync).then(|| {
        setup_polling(
            data.clone(),
            config.data.polling_interval_minutes,
            || debug!("background refresh tick"),
        )
    });

    let auth = Arc::new(MockAuthService::with_user(MockAuthService::test_user()));
    let mut shell = DashboardShell::new(data, auth, telemetry);
    let rendered = shell.render_settled(&store).await?;
    print!("{rendered}");

    if let Some(handle) = poll {
        handle.cancel();
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let (store, table) = build_store(config);
    if json {
        let status = serde_json::json!({
            "environment": config.environment().to_string(),
            "flag_table_source": table.source.to_string(),
            "enabled": store.flags().enabled_count(),
            "capabilities": store.flags().len(),
            "persistence": store.persistence_location(),
            "version": Config::app_version(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("valudash status");
        println!("---------------");
        println!("Environment:    {}", config.environment());
        println!("Flag table:     {}", table.source);
        println!(
            "Enabled flags:  {}/{}",
            store.flags().enabled_count(),
            store.flags().len()
        );
        println!("Persisted copy: {}", store.persistence_location());
        println!("Version:        {}", Config::app_version());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("Environment:          {}", config.environment());
                println!("[flags]");
                println!(
                    "  Production table:   {}",
                    config.production_table_path().display()
                );
                println!(
                    "  Persisted copy:     {}",
                    config.persistence_path().display()
                );
                println!();
                println!("[data]");
                println!("  Live source:        {}", config.data.use_live_source);
                println!(
                    "  Endpoint:           {}",
                    config.data.endpoint.as_deref().unwrap_or("(none)")
                );
                println!(
                    "  Polling interval:   {} min",
                    config.data.polling_interval_minutes
                );
                println!();
                println!("[deploy]");
                println!("  Build command:      {}", config.deploy.build_command.join(" "));
                println!(
                    "  Publish command:    {}",
                    if config.deploy.publish_command.is_empty() {
                        "(unconfigured)".to_string()
                    } else {
                        config.deploy.publish_command.join(" ")
                    }
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
