//! Task wiring.
//!
//! Ingress feeds the tracker, the tracker feeds the notifier, and the control
//! server shares mute state and the photo cache with the notifier. Every hop
//! is an unbounded channel; tasks stop when their input channel closes.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use dmon_api::metrics::init_metrics;
use dmon_api::AppState;
use dmon_notifier::{print_notifier, HealthPinger, MuteState, Notifier, PhotoCache};
use dmon_tracker::Tracker;

use crate::cli::Args;
use crate::config::Config;
use crate::error::{WorkerError, WorkerResult};
use crate::ingress::{open_input, Ingress};

/// How long pending notifications may take to go out after input ends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether to install the Prometheus recorder (`METRICS_ENABLED`, default on).
pub fn metrics_enabled() -> bool {
    std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true)
}

/// Run every task until the detection input ends or Ctrl-C is received.
pub async fn run(args: Args, config: Config) -> WorkerResult<()> {
    let metrics_handle = if metrics_enabled() {
        match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "failed to install metrics recorder; /metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (notify_tx, notify_rx) = mpsc::unbounded_channel();
    let (ping_tx, ping_rx) = mpsc::unbounded_channel();
    let mute = MuteState::new();
    let photos = PhotoCache::new();

    let tracker = Tracker::new(config.tracker.clone(), config.criteria()?);
    let tracker_task = tokio::spawn(tracker.run(event_rx, notify_tx.clone()));

    let notifier_task = if args.print {
        info!("printing notifications to stdout; ntfy disabled");
        tokio::spawn(print_notifier(notify_rx))
    } else {
        let notifier = Notifier::new(
            config.notifier.clone(),
            config.enrichment.clone(),
            mute.clone(),
            photos.clone(),
        )?;
        tokio::spawn(notifier.run(notify_rx))
    };

    let pinger = HealthPinger::new(&config.health_pinger())?;
    tokio::spawn(pinger.run(ping_rx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let state = AppState::new(mute, photos, notify_tx);
    let web = config.web.clone();
    let mut server_task: JoinHandle<Result<(), dmon_api::ApiError>> = tokio::spawn(async move {
        dmon_api::serve(&web, state, metrics_handle, async move {
            shutdown_rx.await.ok();
        })
        .await
    });

    let reader = open_input(&args.input).await?;
    let ingress = Ingress::new(&config.model, event_tx, ping_tx);

    tokio::select! {
        result = ingress.run(reader) => {
            let forwarded = result?;
            info!(forwarded, "detection input ended");
        }
        result = &mut server_task => {
            return match result {
                Ok(Ok(())) => Err(WorkerError::task_failed("control server exited")),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => Err(WorkerError::task_failed(format!("control server panicked: {}", e))),
            };
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            return Ok(());
        }
    }

    // Server state holds a notification sender; it must stop before the notifier can drain.
    if let Err(e) = tracker_task.await {
        error!(error = %e, "tracker task failed");
    }
    shutdown_tx.send(()).ok();
    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "control server error"),
        Err(e) => error!(error = %e, "control server task failed"),
    }
    if tokio::time::timeout(DRAIN_TIMEOUT, notifier_task).await.is_err() {
        warn!("timed out delivering pending notifications");
    }

    info!("Shutdown complete");
    Ok(())
}
