use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::reconciliation::ReconciliationService;

/// Spawn the periodic reconciliation loop. The first pass runs immediately,
/// then one per interval. A failed pass is logged and the loop simply waits
/// for the next tick; nothing here panics.
pub fn spawn_reconciliation_loop(
    service: ReconciliationService,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        log::info!(
            "Reconciliation scheduler started (every {}s)",
            every.as_secs()
        );

        loop {
            ticker.tick().await;

            match service.run_reconciliation().await {
                Ok(outcome) if outcome.activated > 0 || outcome.disabled > 0 => {
                    log::info!(
                        "Reconciliation pass promoted {} record(s), retired {} candidate(s)",
                        outcome.activated,
                        outcome.disabled
                    );
                }
                Ok(_) => {
                    log::debug!("Reconciliation pass found nothing to promote");
                }
                Err(err) => {
                    log::error!("Reconciliation pass failed: {}", err);
                }
            }
        }
    })
}
