//! Nftsniper - NFT Collection Sniper
//!
//! Watches NFT collections and auto-buys listings under a price ceiling.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use nftsniper_core::{parse_contract, AppConfig, TaskEvent};
use nftsniper_data::ListingDiscovery;
use nftsniper_engine::{EventNotifier, TaskScheduler};
use nftsniper_execution::{DryRunProtocol, PurchaseOrchestrator};
use nftsniper_observability::init_logging;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Configuration file path
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main application state
struct App {
    config: AppConfig,
    scheduler: TaskScheduler<ListingDiscovery, DryRunProtocol>,
    notifier: Arc<EventNotifier>,
}

impl App {
    /// Create a new application instance
    fn new(config: AppConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        if !config.execution.dry_run {
            anyhow::bail!(
                "live submission requires a signing backend; set execution.dry_run = true"
            );
        }

        let discovery = Arc::new(ListingDiscovery::new(&config.discovery, config.network));
        let protocol = Arc::new(DryRunProtocol::new());
        let orchestrator = PurchaseOrchestrator::new(protocol, config.execution.clone());
        let notifier = Arc::new(EventNotifier::new());
        let scheduler = TaskScheduler::new(discovery, orchestrator, Arc::clone(&notifier));

        Ok(Self {
            config,
            scheduler,
            notifier,
        })
    }

    /// Load main configuration
    fn load_config() -> Result<(AppConfig, Option<String>)> {
        let config_path = std::env::var("NFTSNIPER_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path))?;
            let config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path))?;
            Ok((config, Some(config_path)))
        } else {
            Ok((AppConfig::default(), None))
        }
    }

    /// Register tasks from the config and run until they all finish or a
    /// shutdown signal arrives
    async fn run(&mut self) -> Result<()> {
        info!("Starting Nftsniper...");

        if self.config.tasks.is_empty() {
            warn!("No tasks configured, nothing to watch");
            return Ok(());
        }

        for spec in self.config.tasks.clone() {
            let contract = parse_contract(&spec.contract)
                .with_context(|| format!("Invalid task contract: {}", spec.contract))?;
            register_logging_observer(&self.notifier, contract);

            self.scheduler
                .add_task(spec)
                .await
                .with_context(|| format!("Failed to add task for {contract}"))?;
        }

        info!(
            tasks = self.scheduler.task_count().await,
            network = ?self.config.network,
            dry_run = self.config.execution.dry_run,
            "Nftsniper started"
        );

        let mut check = interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = check.tick() => {
                    if self.scheduler.task_count().await == 0 {
                        info!("All tasks satisfied");
                        break;
                    }
                }
            }
        }

        self.scheduler.shutdown().await;
        info!("Nftsniper stopped");
        Ok(())
    }
}

/// Subscribe a log-line observer for one contract's task events
fn register_logging_observer(notifier: &EventNotifier, contract: Address) {
    notifier.on(contract, |event| match event {
        TaskEvent::StartBuy(e) => info!(
            contract = %e.contract,
            listing_id = %e.listing_id,
            price = %e.price,
            "Purchase attempt starting"
        ),
        TaskEvent::BuySuccess(e) => info!(
            contract = %e.contract,
            tx_hash = %e.tx_hash,
            price = %e.price,
            success_count = e.success_count,
            "Purchase succeeded"
        ),
        TaskEvent::BuyError(e) => warn!(
            contract = %e.contract,
            listing_id = ?e.listing_id,
            reason = %e.reason,
            "Purchase attempt failed"
        ),
        TaskEvent::NoData(e) => debug!(
            contract = %e.contract,
            detail = %e.detail,
            "Nothing purchasable this cycle"
        ),
        TaskEvent::TaskEnd(e) => info!(
            contract = %e.contract,
            success_count = e.success_count,
            target_count = e.target_count,
            "Task finished"
        ),
        TaskEvent::GenericError(e) => warn!(
            contract = %e.contract,
            message = %e.message,
            "Poll cycle failed upstream"
        ),
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_source) = App::load_config()?;
    init_logging(&config.logging);

    match &config_source {
        Some(path) => info!(path = %path, "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    let mut app = App::new(config)?;
    app.run().await
}
