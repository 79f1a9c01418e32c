use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use jemallocator::Jemalloc;
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use pulse::models::Notification;
use pulse::utils::{format_change, format_number, format_time_ago, NumberStyle};
use pulse::{Dashboard, DashboardHandle, MarketSummary, MockTokenSource, Settings, StoreSnapshot};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings =
        Settings::new().context("Failed to load settings from pulse.* and PULSE_* variables")?;

    let level = settings
        .log_level
        .as_deref()
        .unwrap_or("info")
        .parse::<LevelFilter>()
        .context("Invalid log_level")?;

    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to install logger")?;

    let source = Arc::new(MockTokenSource::new(&settings.mock, &settings.updates));
    let (dashboard, handle) = Dashboard::new(&settings, source);

    let cancellation_token = CancellationToken::new();

    let dashboard_token = cancellation_token.child_token();
    let dashboard_handle = tokio::spawn(async move {
        if let Err(e) = dashboard.run(dashboard_token).await {
            error!("Dashboard failed: {:#}", e);
        }
    });

    info!(
        "Dashboard started - prices refresh every {:?} while real-time updates are on",
        settings.refresh_interval()
    );

    handle.load(None).await?;

    let monitor_token = cancellation_token.child_token();
    let monitor_handle = tokio::spawn(monitor(handle, monitor_token));

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("Dashboard running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    info!("Finishing all tasks...");
    cancellation_token.cancel();

    let _ = monitor_handle.await;
    let _ = dashboard_handle.await;

    info!("Dashboard stopped");
    Ok(())
}

/// Log a one-line view of the dashboard whenever its state changes.
async fn monitor(handle: DashboardHandle, cancellation_token: CancellationToken) {
    let mut state = handle.state();
    let mut notifications = handle.notifications();

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                log_snapshot(&snapshot);
            }
            changed = notifications.changed() => {
                if changed.is_err() {
                    break;
                }
                log_latest_notification(&mut notifications);
            }
        }
    }
}

fn log_snapshot(snapshot: &StoreSnapshot) {
    if snapshot.loading {
        return;
    }
    if let Some(e) = &snapshot.error {
        warn!("Showing {} cached tokens, last load failed: {}", snapshot.total, e);
    }

    let summary = MarketSummary::from_tokens(&snapshot.visible);
    info!(
        "[{} | {:?} {:?}] {}/{} visible | {}",
        snapshot.params.category,
        snapshot.params.sort_field,
        snapshot.params.sort_direction,
        snapshot.visible.len(),
        snapshot.total,
        summary
    );

    if let Some(first) = snapshot.visible.first() {
        info!(
            "  top: {} {} {} mcap {} ({})",
            first.symbol,
            format_number(first.price, NumberStyle::CURRENCY),
            format_change(first.price_change_24h),
            format_number(first.market_cap, NumberStyle::COMPACT_CURRENCY),
            format_time_ago(first.created_at, Utc::now())
        );
    }
}

fn log_latest_notification(notifications: &mut watch::Receiver<Arc<Vec<Notification>>>) {
    let list = notifications.borrow_and_update().clone();
    if let Some(latest) = list.first().filter(|n| !n.read) {
        info!("[{:?}] {}: {}", latest.kind, latest.title, latest.message);
    }
}
