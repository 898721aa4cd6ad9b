//! Application startup
//!
//! Parses arguments, initialises logging, builds the registry through
//! discovery and drives the requested command on a tokio runtime.

use crate::app::args::{Cli, CliCommand};
use crate::app::display;
use crate::engine::api::Engine;
use crate::plugin::api::{
    default_plugin_dir, load_directory, register_builtins, PluginCategory, ScanConfig,
    SharedPluginRegistry,
};
use crate::storage::api::MemoryStore;
use clap::Parser;
use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Process entry point called from main
pub fn startup() {
    let cli = Cli::parse();

    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    if let Err(e) = crate::core::logging::init_logging(Some(&cli.log_level), use_color) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let registry = SharedPluginRegistry::new();
    register_builtins(&registry).await;

    let plugin_dir = cli.plugin_dir.clone().unwrap_or_else(default_plugin_dir);
    if plugin_dir.is_dir() {
        load_directory(&registry, &plugin_dir).await?;
    } else {
        log::debug!(
            "Plugin directory {} not present, skipping manifest discovery",
            plugin_dir.display()
        );
    }

    match cli.command {
        CliCommand::List { category } => {
            let mut descriptors = registry.list_meta().await;
            if let Some(raw) = category {
                let category = PluginCategory::from_str(&raw)
                    .map_err(|_| format!("unknown category '{}'", raw))?;
                descriptors.retain(|descriptor| descriptor.category == category);
            }
            display::plugin_table(&descriptors).printstd();
            println!("{} plugins registered", descriptors.len());
        }

        CliCommand::Run {
            target,
            plugins,
            workspace,
            target_id,
            workers,
            proxy,
            timeout,
        } => {
            if plugins.is_empty() {
                return Err("no plugins requested; pass --plugins id[,id...]".into());
            }

            let store = Arc::new(MemoryStore::new());
            let engine =
                Engine::new(registry, store.clone()).with_worker_capacity(workers);
            engine.on_event(|event| display::print_event(event));

            let mut config = ScanConfig::new(&target);
            config.proxy = proxy;
            config.timeout = timeout;

            let job_id = engine
                .run(workspace, target_id, plugins, config, false)
                .await?;
            log::info!("Dispatched job {}", job_id);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        log::warn!("Interrupt received, cancelling job {}", job_id);
                        engine.cancel(job_id).await;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {}
                }

                let terminal = store
                    .job(job_id)
                    .map(|job| job.status.is_terminal())
                    .unwrap_or(true);
                if terminal && engine.active_job_count() == 0 {
                    break;
                }
            }

            display::print_summary(&store, job_id, target_id);
        }
    }

    Ok(())
}
