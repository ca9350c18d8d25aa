use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use futures_util::{stream, StreamExt};
use log::*;
use tokio::time::{timeout_at, Instant};

use crate::{
    db_types::{Invoice, InvoiceStatus},
    events::{InvoiceExpiredEvent, PaymentReceivedEvent},
    isp_api::{
        detection::DetectionPolicy,
        errors::MonitorError,
        monitor_objects::{FailedInvoice, TickReport},
        settlement_api::SettlementApi,
    },
    traits::{PriceOracle, SettlementGatewayDatabase, SettlementGatewayError, WalletCapability},
};

#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    /// Invoices not started before this much time has passed are left for the next tick
    pub tick_budget: Duration,
    /// How many invoices are processed at the same time
    pub concurrency: usize,
    pub detection: DetectionPolicy,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self { tick_budget: Duration::from_secs(45), concurrency: 4, detection: DetectionPolicy::default() }
    }
}

/// The polling monitor. Each [`tick`](InvoiceMonitor::tick) looks at every open invoice and moves it along its
/// lifecycle: expiring it, confirming a detected payment, or settling it.
///
/// The monitor keeps no state between ticks. Everything it decides is re-read from the store, so a failed settlement
/// is simply retried on the next tick.
#[derive(Clone)]
pub struct InvoiceMonitor<B, W, P> {
    settlement: SettlementApi<B, W, P>,
    options: MonitorOptions,
}

impl<B, W, P> Debug for InvoiceMonitor<B, W, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InvoiceMonitor ({:?})", self.options)
    }
}

impl<B, W, P> InvoiceMonitor<B, W, P> {
    pub fn new(settlement: SettlementApi<B, W, P>, options: MonitorOptions) -> Self {
        Self { settlement, options }
    }

    pub fn settlement(&self) -> &SettlementApi<B, W, P> {
        &self.settlement
    }
}

impl<B, W, P> InvoiceMonitor<B, W, P>
where
    B: SettlementGatewayDatabase,
    W: WalletCapability,
    P: PriceOracle,
{
    /// One pass over all open invoices.
    ///
    /// Failures are per invoice and never stop the pass. The only error returned is failing to load the invoices in
    /// the first place.
    pub async fn tick(&self) -> Result<TickReport, MonitorError> {
        let started = Instant::now();
        let deadline = started + self.options.tick_budget;
        let invoices = self.settlement.db().fetch_open_invoices().await?;
        debug!("🕰️ Checking {} open invoices", invoices.len());
        let mut report = stream::iter(invoices)
            .map(|invoice| self.process_invoice(invoice, deadline))
            .buffer_unordered(self.options.concurrency.max(1))
            .fold(TickReport::default(), |acc, r| async move { acc.merge(r) })
            .await;
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(report)
    }

    async fn process_invoice(&self, invoice: Invoice, deadline: Instant) -> TickReport {
        let id = invoice.id.clone();
        let mut report = TickReport::default();
        if Instant::now() >= deadline {
            trace!("🕰️ Out of time. Invoice {id} is deferred to the next tick");
            report.deferred.push(id);
            return report;
        }
        let invoice = match invoice.status {
            InvoiceStatus::Pending => match self.check_pending(invoice, deadline, &mut report).await {
                Some(invoice) => invoice,
                None => return report,
            },
            InvoiceStatus::Confirmed => invoice,
            status => {
                trace!("🕰️ Invoice {id} is {status}. Nothing to do.");
                report.unchanged += 1;
                return report;
            },
        };
        if Instant::now() >= deadline {
            trace!("🕰️ Out of time. Settlement of invoice {id} is deferred to the next tick");
            report.deferred.push(id);
            return report;
        }
        // Once started, a settlement runs to completion regardless of the deadline
        match self.settlement.settle(&invoice.id).await {
            Ok(_) => report.settled.push(id),
            Err(e) if e.is_rejection() => {
                debug!("🕰️ Invoice {id} was skipped. {e}");
                report.unchanged += 1;
            },
            Err(e) => report.failed.push(FailedInvoice { id, reason: e.to_string() }),
        }
        report
    }

    /// Expires or confirms a pending invoice. Returns the invoice if it was confirmed and should be settled now.
    async fn check_pending(&self, invoice: Invoice, deadline: Instant, report: &mut TickReport) -> Option<Invoice> {
        let db = self.settlement.db();
        let producers = self.settlement.producers();
        let id = invoice.id.clone();
        if invoice.price_lock.is_expired_at(Utc::now()) {
            match db.mark_invoice_expired(&id).await {
                Ok(invoice) => {
                    info!("🕰️ Invoice {id} has expired without payment");
                    producers.publish_invoice_expired(InvoiceExpiredEvent::new(invoice));
                    report.expired.push(id);
                },
                Err(SettlementGatewayError::StatusConflict { actual, .. }) => {
                    debug!("🕰️ Invoice {id} moved to {actual} before it could be expired");
                    report.unchanged += 1;
                },
                Err(e) => {
                    warn!("🕰️ Could not expire invoice {id}. {e}");
                    report.failed.push(FailedInvoice { id, reason: e.to_string() });
                },
            }
            return None;
        }
        let history = match timeout_at(deadline, self.settlement.wallet().history(&invoice.receiving_address)).await {
            Ok(Ok(history)) => history,
            Ok(Err(e)) => {
                warn!("🕰️ Could not fetch the transaction history for invoice {id}. {e}");
                report.failed.push(FailedInvoice { id, reason: e.to_string() });
                return None;
            },
            Err(_) => {
                debug!("🕰️ History query for invoice {id} ran past the tick budget. Deferred to the next tick.");
                report.deferred.push(id);
                return None;
            },
        };
        let Some(payment) = self.options.detection.find_payment(&invoice, &history) else {
            trace!("🕰️ No payment yet for invoice {id}");
            report.unchanged += 1;
            return None;
        };
        match db.mark_invoice_confirmed(&id, &payment.tx_hash).await {
            Ok(invoice) => {
                info!("🕰️ Payment for invoice {id} detected in {}", payment.tx_hash);
                producers.publish_payment_received(PaymentReceivedEvent::new(invoice.clone(), payment.tx_hash.clone()));
                report.confirmed.push(id);
                Some(invoice)
            },
            Err(SettlementGatewayError::StatusConflict { actual, .. }) => {
                debug!("🕰️ Invoice {id} moved to {actual} before it could be confirmed");
                report.unchanged += 1;
                None
            },
            Err(e) => {
                warn!("🕰️ Could not confirm invoice {id}. {e}");
                report.failed.push(FailedInvoice { id, reason: e.to_string() });
                None
            },
        }
    }
}
