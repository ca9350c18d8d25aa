use std::fmt::Debug;

use chrono::Duration;
use isp_common::ASSET_CODE;
use log::*;

use crate::{
    db_types::{Invoice, InvoiceId, InvoiceStatus, LogType, NewLogEntry, NewSettlement, Settlement},
    events::{EventProducers, FundsRecoveredEvent, SettlementCompletedEvent, SettlementFailedEvent},
    helpers::stable_amount,
    isp_api::errors::SettlementError,
    traits::{PriceOracle, SettlementGatewayDatabase, WalletCapability},
};

#[derive(Debug, Clone)]
pub struct SettlementOptions {
    /// The custodial exchange address that all funds are swept to
    pub exchange_address: String,
    /// The stable asset that settlements are recorded in
    pub stable_currency: String,
    /// The currency the oracle is asked to quote the settlement asset in
    pub reference_currency: String,
    /// How long a settlement run may hold its claim on an invoice before others may take over
    pub claim_lease: Duration,
}

impl SettlementOptions {
    pub fn new<S: Into<String>>(exchange_address: S) -> Self {
        Self { exchange_address: exchange_address.into(), ..Default::default() }
    }
}

impl Default for SettlementOptions {
    fn default() -> Self {
        Self {
            exchange_address: String::default(),
            stable_currency: "USDT".to_string(),
            reference_currency: "usd".to_string(),
            claim_lease: Duration::minutes(10),
        }
    }
}

/// `SettlementApi` moves the funds of a paid invoice to the exchange and records what they were worth.
///
/// It owns the at-most-once guarantee: every run takes out a claim on the invoice first, and a broadcast sweep is
/// recorded before anything else happens, so a retry never sweeps the same invoice twice.
#[derive(Clone)]
pub struct SettlementApi<B, W, P> {
    db: B,
    wallet: W,
    oracle: P,
    options: SettlementOptions,
    producers: EventProducers,
}

impl<B, W, P> Debug for SettlementApi<B, W, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({})", self.options.exchange_address)
    }
}

impl<B, W, P> SettlementApi<B, W, P> {
    pub fn new(db: B, wallet: W, oracle: P, options: SettlementOptions, producers: EventProducers) -> Self {
        Self { db, wallet, oracle, options, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn options(&self) -> &SettlementOptions {
        &self.options
    }

    pub fn producers(&self) -> &EventProducers {
        &self.producers
    }
}

impl<B, W, P> SettlementApi<B, W, P>
where
    B: SettlementGatewayDatabase,
    W: WalletCapability,
    P: PriceOracle,
{
    /// Sweeps and converts the funds of a `confirmed` invoice and marks it `settled`.
    ///
    /// Invoices in any other state are rejected with [`SettlementError::NotReadyForSettlement`], and invoices that are
    /// being settled elsewhere with [`SettlementError::SettlementInProgress`]. Neither case changes anything.
    ///
    /// Any other failure leaves the invoice `confirmed`, with an `error` entry in its audit trail, so that the next
    /// call can try again.
    pub async fn settle(&self, id: &InvoiceId) -> Result<Settlement, SettlementError> {
        let result = self.try_settle(id).await;
        if let Err(e) = &result {
            if e.is_rejection() {
                debug!("💸️ Settlement of invoice {id} was not attempted. {e}");
            } else {
                self.record_failure(id, "Settlement", e).await;
            }
        }
        result
    }

    /// Sweeps funds that arrived at an `expired` invoice's address to the exchange.
    ///
    /// The invoice stays `expired` and no settlement is recorded; converting the recovered funds is left to an
    /// operator. Funds can only be recovered once per invoice.
    pub async fn recover_expired(&self, id: &InvoiceId) -> Result<Invoice, SettlementError> {
        let result = self.try_recover(id).await;
        if let Err(e) = &result {
            if e.is_rejection() {
                debug!("💸️ Recovery of invoice {id} was not attempted. {e}");
            } else {
                self.record_failure(id, "Recovery", e).await;
            }
        }
        result
    }

    async fn try_settle(&self, id: &InvoiceId) -> Result<Settlement, SettlementError> {
        let invoice = self.db.fetch_invoice(id).await?.ok_or_else(|| SettlementError::InvoiceNotFound(id.clone()))?;
        if invoice.status != InvoiceStatus::Confirmed {
            return Err(SettlementError::NotReadyForSettlement { id: id.clone(), status: invoice.status });
        }
        let invoice = self
            .db
            .claim_invoice(id, InvoiceStatus::Confirmed, self.options.claim_lease)
            .await
            .map_err(SettlementError::from_claim_error)?;
        let result = self.settle_claimed(invoice).await;
        if result.is_err() {
            self.release(id).await;
        }
        result
    }

    async fn settle_claimed(&self, invoice: Invoice) -> Result<Settlement, SettlementError> {
        let id = &invoice.id;
        let sweep_tx_hash = match &invoice.sweep_tx_hash {
            Some(tx_hash) => {
                info!("💸️ Invoice {id} was already swept in {tx_hash}. Resuming at conversion.");
                tx_hash.clone()
            },
            None => self.sweep_and_record(&invoice, LogType::Settlement).await?.0,
        };
        let quote = self.oracle.quote(&self.options.reference_currency).await?;
        let stable = stable_amount(invoice.amount_asset, quote.rate)?;
        let currency = self.options.stable_currency.clone();
        let details = format!(
            "Settled {} as {stable} {currency} at {} {}/{ASSET_CODE}. Sweep transaction: {sweep_tx_hash}",
            invoice.amount_asset,
            quote.rate,
            quote.currency.to_uppercase()
        );
        let settlement =
            NewSettlement::completed(id.clone(), invoice.amount_asset, stable, currency, quote.rate, sweep_tx_hash);
        let log = NewLogEntry::new(LogType::Settlement, details).for_invoice(id);
        let (invoice, settlement) = self.db.complete_settlement(settlement, log).await?;
        info!(
            "💸️ Invoice {} settled. {} converted to {} {} in {}",
            invoice.id, settlement.asset_amount, settlement.stable_amount, settlement.currency, settlement.tx_hash
        );
        self.producers.publish_settlement_completed(SettlementCompletedEvent::new(invoice, settlement.clone()));
        Ok(settlement)
    }

    async fn try_recover(&self, id: &InvoiceId) -> Result<Invoice, SettlementError> {
        let invoice = self.db.fetch_invoice(id).await?.ok_or_else(|| SettlementError::InvoiceNotFound(id.clone()))?;
        if invoice.status != InvoiceStatus::Expired {
            let reason = format!("Only expired invoices can be recovered, but this one is {}", invoice.status);
            return Err(SettlementError::NotRecoverable { id: id.clone(), reason });
        }
        if let Some(tx_hash) = &invoice.sweep_tx_hash {
            let reason = format!("Funds were already recovered in {tx_hash}");
            return Err(SettlementError::NotRecoverable { id: id.clone(), reason });
        }
        let invoice = self
            .db
            .claim_invoice(id, InvoiceStatus::Expired, self.options.claim_lease)
            .await
            .map_err(SettlementError::from_claim_error)?;
        let result = self.recover_claimed(invoice).await;
        self.release(id).await;
        result
    }

    async fn recover_claimed(&self, invoice: Invoice) -> Result<Invoice, SettlementError> {
        let history = self.wallet.history(&invoice.receiving_address).await.map_err(SettlementError::WalletError)?;
        if history.is_empty() {
            return Err(SettlementError::NothingToSweep);
        }
        let (tx_hash, invoice) = self.sweep_and_record(&invoice, LogType::Recovery).await?;
        warn!(
            "💸️ A late payment to expired invoice {} has been recovered in {tx_hash}. The funds have not been converted.",
            invoice.id
        );
        self.producers.publish_funds_recovered(FundsRecoveredEvent::new(invoice.clone(), tx_hash));
        Ok(invoice)
    }

    /// Broadcasts the sweep, then immediately records it. From here on, retries resume at conversion.
    async fn sweep_and_record(
        &self,
        invoice: &Invoice,
        log_type: LogType,
    ) -> Result<(String, Invoice), SettlementError> {
        let id = &invoice.id;
        let credential =
            invoice.spending_credential.as_ref().ok_or_else(|| SettlementError::MissingCredential(id.clone()))?;
        let destination = self.options.exchange_address.as_str();
        let tx_hash = self.wallet.sweep(credential, destination).await?;
        info!("💸️ Funds for invoice {id} swept to {destination} in {tx_hash}");
        let details = format!("Swept funds from {} to {destination} in {tx_hash}", invoice.receiving_address);
        let log = NewLogEntry::new(log_type, details).for_invoice(id);
        match self.db.record_sweep(id, &tx_hash, log).await {
            Ok(invoice) => Ok((tx_hash, invoice)),
            Err(e) => {
                error!(
                    "💸️ Sweep {tx_hash} for invoice {id} was broadcast, but could not be recorded. This invoice needs \
                     manual reconciliation. {e}"
                );
                Err(SettlementError::SweepNotRecorded { id: id.clone(), tx_hash, reason: e.to_string() })
            },
        }
    }

    async fn release(&self, id: &InvoiceId) {
        if let Err(e) = self.db.release_claim(id).await {
            warn!("💸️ Could not release the claim on invoice {id}. It will lapse when the lease runs out. {e}");
        }
    }

    async fn record_failure(&self, id: &InvoiceId, operation: &str, error: &SettlementError) {
        warn!("💸️ {operation} of invoice {id} failed. {error}");
        let entry = NewLogEntry::error(format!("{operation} failed. {error}")).for_invoice(id);
        if let Err(e) = self.db.append_log(entry).await {
            error!("💸️ Could not write the failure of invoice {id} to the audit log. {e}");
        }
        self.producers.publish_settlement_failed(SettlementFailedEvent::new(id.clone(), error.to_string()));
    }
}
