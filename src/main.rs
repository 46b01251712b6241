mod api;
mod filters;
mod models;
mod offload;
mod utils;

use actix_web::{web, App, HttpServer};
use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::routes;
use crate::filters::commit::CommitController;
use crate::filters::defaults::load_factory_defaults;
use crate::filters::editor::FilterEditor;
use crate::filters::manager::FilterManager;
use crate::filters::store::DoubleBufferStore;
use crate::models::config::{AppConfig, Credentials, SecurityMode};
use crate::models::filter::FilterId;
use crate::offload::engine::BpfFilterEngine;
use crate::offload::link::InterfaceLink;
use crate::utils::error::{AppError, AppResult};
use crate::utils::logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Packet filter offload manager with REST API")]
struct Args {
    /// Network interface the offload is attached to
    #[clap(short, long, default_value = "wlan0")]
    interface: String,

    /// Address for the REST API server
    #[clap(long, default_value = "127.0.0.1")]
    bind_address: String,

    /// Port for the REST API server
    #[clap(short, long, default_value = "3000")]
    port: u16,

    /// Maximum number of filters per list
    #[clap(long, default_value = "10")]
    max_filters: usize,

    /// JSON file with the factory default filters (built-in board defaults if omitted)
    #[clap(long)]
    factory_defaults: Option<PathBuf>,

    /// Network to associate with after a commit
    #[clap(long, env = "PF_WIFI_SSID", default_value = "")]
    ssid: String,

    /// Passphrase of the network
    #[clap(long, env = "PF_WIFI_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Security mode of the network
    #[clap(long, value_enum, default_value = "wpa2-psk")]
    security: SecurityMode,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> AppResult<AppConfig> {
        if self.max_filters == 0 || self.max_filters > usize::from(FilterId::MAX) {
            return Err(AppError::ConfigError(format!(
                "max filters must be between 1 and {}, got {}",
                FilterId::MAX,
                self.max_filters
            )));
        }

        Ok(AppConfig {
            interface: self.interface,
            bind_address: self.bind_address,
            port: self.port,
            // one extra slot for the terminator
            list_capacity: self.max_filters + 1,
            factory_defaults: self.factory_defaults,
            credentials: Credentials {
                ssid: self.ssid,
                password: self.password,
                security: self.security,
            },
        })
    }
}

/// Wire the filter lists to the host interface
fn build_manager(config: &AppConfig) -> AppResult<FilterManager> {
    let defaults =
        load_factory_defaults(config.factory_defaults.as_deref(), config.list_capacity)?;
    let store = DoubleBufferStore::new(config.list_capacity, defaults);

    let link = InterfaceLink::new(&config.interface);
    info!("Offload link bound to interface {}", link.interface());
    let controller = CommitController::new(
        Box::new(link),
        Box::new(BpfFilterEngine::new(&config.interface)),
        config.credentials.clone(),
    );

    Ok(FilterManager::new(FilterEditor::new(store), controller))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger with specified level
    logging::init_logger(logging::get_log_level(&args.log_level));

    info!("Starting pfoffload v{}", env!("CARGO_PKG_VERSION"));

    // Create application config
    let config = args.into_config()?;
    info!("Configuration: {}", serde_json::to_string(&config)?);

    let mut manager = build_manager(&config)?;
    if let Err(e) = manager.start() {
        warn!("Continuing without association: {}", e);
    }

    // The monitor is shared on its own so status reads skip the manager lock
    let monitor = web::Data::new(manager.monitor());
    let app_state = web::Data::new(Arc::new(Mutex::new(manager)));

    info!(
        "Starting pfoffload API server on {}:{}",
        config.bind_address, config.port
    );

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(monitor.clone())
            .configure(routes::configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_includes_terminator_slot() {
        let args = Args::parse_from(["pfoffload", "--max-filters", "6", "--ssid", "lab"]);
        let config = args.into_config().unwrap();
        assert_eq!(config.list_capacity, 7);
        assert_eq!(config.credentials.security, SecurityMode::Wpa2Psk);

        let manager = build_manager(&config).unwrap();
        assert_eq!(manager.snapshot().max_filters, 6);
    }

    #[test]
    fn rejects_zero_filters() {
        let args = Args::parse_from(["pfoffload", "--max-filters", "0"]);
        assert!(matches!(args.into_config(), Err(AppError::ConfigError(_))));
    }
}
