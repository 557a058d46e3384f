use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use titlesync_core::{
    ControllerConfig, InteractionController, MemoryTitleStore, RefreshConfig, RefreshCoordinator,
    RefreshStatus,
};

use crate::shutdown;
use crate::source::SimulatedSource;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches.get_one::<PathBuf>("config"))?;

    match matches.subcommand() {
        Some(("refresh", sub_matches)) => handle_refresh_command(sub_matches, config),
        Some(("run", sub_matches)) => handle_run_command(sub_matches, config),
        Some(("config", sub_matches)) => handle_config_command(sub_matches, &config),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

/// Load config from an explicit path, or from `~/.titlesync/config.toml`.
fn load_config(path: Option<&PathBuf>) -> Result<RefreshConfig, Box<dyn std::error::Error>> {
    let result = match path {
        Some(path) => titlesync_core::load_config_file(path),
        None => titlesync_core::load_config(),
    };
    result.map_err(|e| -> Box<dyn std::error::Error> {
        eprintln!("Could not load config: {}", e);
        error!(event = "cli.config.load_failed", error = %e);
        e.into()
    })
}

/// Apply `--timeout-ms` if given.
fn apply_overrides(matches: &ArgMatches, mut config: RefreshConfig) -> RefreshConfig {
    if let Some(timeout_ms) = matches.get_one::<u64>("timeout-ms") {
        config.fetch_timeout_ms = *timeout_ms;
    }
    config
}

fn build_runtime(config: &RefreshConfig) -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
}

fn build_coordinator(config: &RefreshConfig, source: SimulatedSource) -> RefreshCoordinator {
    let store = Arc::new(MemoryTitleStore::new(config.initial_title.as_str()));
    RefreshCoordinator::with_timeout(store, Arc::new(source), config.fetch_timeout())
}

fn handle_refresh_command(
    matches: &ArgMatches,
    config: RefreshConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = apply_overrides(matches, config);
    let latency_ms = matches.get_one::<u64>("latency-ms").copied().unwrap_or(0);
    let source = SimulatedSource::new(Duration::from_millis(latency_ms))
        .with_always_fail(matches.get_flag("fail"));
    let coordinator = build_coordinator(&config, source);

    info!(
        event = "cli.refresh_started",
        timeout_ms = config.fetch_timeout_ms,
        latency_ms = latency_ms,
    );

    let runtime = build_runtime(&config)?;
    match runtime.block_on(coordinator.refresh_title()) {
        Ok(()) => {
            println!("Title: {}", *coordinator.title().borrow());
            info!(event = "cli.refresh_completed");
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Title unchanged: {}", *coordinator.title().borrow());
            error!(
                event = "cli.refresh_failed",
                error = %e,
                error_code = e.error_code(),
            );
            Err(e.into())
        }
    }
}

fn handle_run_command(
    matches: &ArgMatches,
    config: RefreshConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = apply_overrides(matches, config);
    let latency = Duration::from_millis(matches.get_one::<u64>("latency-ms").copied().unwrap_or(0));
    let source = SimulatedSource::new(latency)
        .with_fail_every(matches.get_one::<u64>("fail-every").copied());
    let coordinator = build_coordinator(&config, source);
    let start_taps = matches.get_flag("taps");

    info!(
        event = "cli.run_started",
        worker_threads = config.worker_threads,
        refresh_interval_secs = config.refresh_interval_secs,
    );

    let runtime = build_runtime(&config)?;
    runtime.block_on(async move {
        let controller = InteractionController::start(coordinator, ControllerConfig::from(&config));
        if start_taps {
            controller.on_interaction_start();
        }

        let token = CancellationToken::new();
        let signal_token = token.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown::wait_for_shutdown_signal(signal_token).await {
                warn!(
                    event = "cli.run.signal_handler_failed",
                    error = %e,
                    "Signal handler failed; stop the process another way",
                );
            }
        });

        watch_controller(&controller, token).await;
        controller.shutdown();
    });

    info!(event = "cli.run_completed");
    Ok(())
}

/// Print title, tap and refresh-status changes until `token` is cancelled.
async fn watch_controller(controller: &InteractionController, token: CancellationToken) {
    let mut title = controller.title();
    let mut state = controller.state();
    let mut status = controller.refresh_status();

    println!("Title: {}", *title.borrow_and_update());
    println!("{}", state.borrow_and_update().display_text());

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            Ok(()) = title.changed() => {
                println!("Title: {}", *title.borrow_and_update());
            }
            Ok(()) = state.changed() => {
                println!("{}", state.borrow_and_update().display_text());
            }
            Ok(()) = status.changed() => {
                let snapshot = status.borrow_and_update().clone();
                report_status(&snapshot);
                if snapshot.last_error.is_some() {
                    controller.dismiss_error();
                }
            }
        }
    }
}

fn report_status(status: &RefreshStatus) {
    if status.is_refreshing() {
        println!("Refreshing...");
    } else if let Some(e) = &status.last_error {
        eprintln!("{}", e);
    }
}

fn handle_config_command(
    matches: &ArgMatches,
    config: &RefreshConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}
