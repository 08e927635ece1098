//! Hookwire launcher
//!
//! Boots the in-process host, loads the built-in module and drives the host
//! tick loop until interrupted.

use std::sync::Arc;
use std::time::Duration;

use hookwire_config::{DuplicatePlugins, HookwireConfig};
use hookwire_events::EventBus;
use hookwire_extensions::{DuplicatePolicy, ExtensionManager};
use hookwire_game::{BuiltinModule, Host, MemoryHost};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Host simulation rate
const TICK_INTERVAL: Duration = Duration::from_micros(1_000_000 / 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, load_error) = match HookwireConfig::load_default() {
        Ok(config) => (config, None),
        Err(e) => (HookwireConfig::default(), Some(e)),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Hookwire {} starting up", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        warn!("Failed to load {}: {}", hookwire_config::DEFAULT_CONFIG_FILE, e);
        warn!("Using default configuration");
    }
    config.display();

    let host = MemoryHost::from_config(&config);
    let policy = match config.duplicate_plugins {
        DuplicatePlugins::Error => DuplicatePolicy::Error,
        DuplicatePlugins::Overwrite => DuplicatePolicy::Overwrite,
    };
    let manager = ExtensionManager::new(Arc::new(EventBus::new())).with_duplicate_policy(policy);
    manager.bind_constant::<dyn Host>(host.clone());
    manager.bind_constant(Arc::new(config));

    manager.load(&BuiltinModule)?;
    if let Err(e) = manager.initialize() {
        error!("Extension initialization failed: {}", e);
        return Err(e.into());
    }

    for plugin in manager.plugins() {
        info!("Loaded plugin {} {} by {}", plugin.name, plugin.version, plugin.author);
    }
    info!("Host is running with {} plugins", manager.plugin_count());

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => host.tick(),
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down");
    if !host.save_world() {
        info!("World save on shutdown was canceled");
    }
    manager.shutdown();
    Ok(())
}
