use anyhow::Result;
use lib_parking::{FeedListener, SpotRegistry};
use parking_servers::parking_logic::{config, console, display, logger};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::load_config().resolve();
    let log_path = logger::setup_logging("server_parking", &settings.log_dir, &settings.log_level)?;
    log::info!("Logging to {}", log_path.display());

    let registry = Arc::new(SpotRegistry::new());
    let listener = FeedListener::new(settings.feed.clone(), Arc::clone(&registry));
    let feed_status = listener.status();

    if settings.feed_enabled {
        log::info!("Starting feed listener for {}", settings.feed.addr());
        let feed_handle = listener.start();
        tokio::spawn(async move {
            match feed_handle.await {
                Ok(report) => log::warn!(
                    "Feed listener stopped ({} applied, {} skipped): {}. Continuing in local mode.",
                    report.applied,
                    report.skipped,
                    report.ended_by
                ),
                Err(e) => log::error!("Feed listener task failed: {}", e),
            }
        });
    } else {
        log::info!("Feed disabled. Running in local mode.");
    }

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    // Subscribed before the console exists so an early quit is never missed.
    let mut quit = shutdown_tx.subscribe();

    let display_handle = tokio::spawn(display::run(
        Arc::clone(&registry),
        feed_status.clone(),
        settings.refresh_interval,
        shutdown_tx.subscribe(),
    ));

    let console_handle = tokio::spawn(console::run(
        Arc::clone(&registry),
        feed_status,
        console::spawn_stdin_reader(),
        shutdown_tx.clone(),
    ));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = quit.recv() => {
            log::info!("Shutdown requested from console.");
        }
    }

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    // Wait for components to shut down
    let _ = tokio::try_join!(display_handle, console_handle);

    let state = registry.state();
    log::info!(
        "Shutdown complete. {} of {} spots occupied.",
        state.occupied_count,
        state.total_spots
    );
    Ok(())
}
