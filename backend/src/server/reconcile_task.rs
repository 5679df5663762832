//! Periodic orphaned-picture sweep.

use std::time::Duration;

use actix_web::rt::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::domain::{PictureReconciler, ReconciliationReport, TraceId};

/// Run one sweep under a fresh trace id. Failures are logged and reported
/// as `None`; the next tick tries again.
pub async fn sweep_once(reconciler: &PictureReconciler) -> Option<ReconciliationReport> {
    let trace_id = TraceId::generate();
    trace_id.instrument(async {
        match reconciler.sweep().await {
            Ok(report) => Some(report),
            Err(err) => {
                error!(trace_id = %trace_id, error = %err, "picture reconciliation failed");
                None
            }
        }
    })
    .await
}

/// Sweep every `interval` on the actix runtime, starting one interval after
/// start-up.
pub fn spawn_reconciler(reconciler: PictureReconciler, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "picture reconciliation scheduled");
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_once(&reconciler).await;
        }
    })
}
