use std::time::Duration;

use invoice_settlement_engine::TickReport;
use log::*;
use tokio::task::JoinHandle;

use crate::server::ServerMonitor;

/// Starts the monitor worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_monitor_worker(monitor: ServerMonitor, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // No catch-up ticks after a slow one
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("🕰️ Invoice monitor started. Ticking every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running monitor tick");
            match monitor.tick().await {
                Ok(report) => log_report(&report),
                Err(e) => error!("🕰️ Error running monitor tick: {e}"),
            }
        }
    })
}

pub fn log_report(report: &TickReport) {
    if report.is_quiet() {
        debug!("🕰️ {report}");
        return;
    }
    info!("🕰️ {report}");
    debug!("🕰️ Expired: {}", id_list(&report.expired));
    debug!("🕰️ Confirmed: {}", id_list(&report.confirmed));
    debug!("🕰️ Settled: {}", id_list(&report.settled));
    debug!("🕰️ Deferred: {}", id_list(&report.deferred));
    for failure in &report.failed {
        warn!("🕰️ Invoice {} failed this tick. {}", failure.id, failure.reason);
    }
}

fn id_list<T: ToString>(ids: &[T]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<String>>().join(", ")
}
