//! lingua server node
//!
//! Serves translations from a YAML file tree and keeps them in sync with
//! the remote translation-management service:
//! 1. Loads every configured namespace into the in-memory registry
//! 2. Answers the admin API (health, sync, sessions, resolve, reload)
//! 3. Optionally runs a full sync of all namespaces on a timer
//!
//! Usage:
//!   lingua-node --config lingua.toml

use anyhow::{Context, Result};
use clap::Parser;
use lingua_node::{AppState, NodeConfig, build_router, spawn_periodic_sync};
use lingua_registry::{HotCache, MissingKeyLog, Registry, Resolver};
use lingua_remote::{HttpRemoteClient, LocaleMapper};
use lingua_store::{ContentStore, FileContentStore, HashLedger};
use lingua_sync::{LocalBroadcastHub, PeerListener, SyncEngine};
use lingua_types::ServerId;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lingua-node")]
#[command(about = "lingua localization server node")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "lingua.toml")]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    info!("lingua node starting...");
    let mut config = NodeConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.remote = config.remote.with_env_credential();
    config.validate()?;
    let bind = config.bind_addr()?;

    let store: Arc<dyn ContentStore> = Arc::new(
        FileContentStore::open(config.store.clone())
            .await
            .context("opening content store")?,
    );
    let ledger = match &config.ledger_path {
        Some(path) => HashLedger::open(path.clone())
            .await
            .with_context(|| format!("opening hash ledger {}", path.display()))?,
        None => HashLedger::in_memory(),
    };
    let mapper = LocaleMapper::new(&config.remote.locales);
    let remote = Arc::new(HttpRemoteClient::new(config.remote.clone()).context("creating remote client")?);

    let registry = Arc::new(Registry::new());
    let cache = Arc::new(HotCache::new(&config.cache));
    let missing = Arc::new(MissingKeyLog::new());
    let resolver = Arc::new(Resolver::with_missing_log(
        Arc::clone(&registry),
        Arc::clone(&cache),
        config.resolver.clone(),
        Arc::clone(&missing),
    ));

    // In-process stand-in for a cross-host transport: with a single engine
    // every message is its own echo. Swap in another PeerBroadcaster here.
    let hub = LocalBroadcastHub::default();
    let mut engine = SyncEngine::new(config.sync.clone(), registry, cache, store, remote)
        .with_ledger(Arc::new(ledger))
        .with_mapper(mapper)
        .with_missing_log(missing)
        .with_broadcaster(Arc::new(hub.clone()));
    if let Some(id) = &config.server.server_id {
        engine = engine.with_server_id(id.parse::<ServerId>()?);
    }
    let engine = Arc::new(engine);
    info!("Server id: {}", engine.server_id());

    for namespace in config.sync.namespace_names() {
        match engine.refresh_namespace(&namespace).await {
            Ok(count) => info!("Loaded namespace {} ({} entries)", namespace, count),
            Err(e) => warn!("Failed to load namespace {}: {}", namespace, e),
        }
    }

    let _listener = PeerListener::new(Arc::clone(&engine)).spawn(hub.subscribe());
    if let Some(period) = config.sync_interval() {
        info!("Periodic sync every {}s", period.as_secs());
        spawn_periodic_sync(Arc::clone(&engine), period);
    }

    let app = build_router(AppState {
        engine: Arc::clone(&engine),
        resolver,
    });
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("Admin API listening on {}", bind);

    println!("\n========================================");
    println!("  lingua node running");
    println!("========================================");
    println!("  Server id:  {}", engine.server_id());
    println!("  Admin API:  http://{}/api/v1/health", bind);
    println!("  Namespaces: {}", config.sync.namespace_names().join(", "));
    println!("========================================\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("admin API failed")?;
    info!("lingua node stopped");
    Ok(())
}
