use std::fmt::Debug;

use chrono::Duration;
use log::*;
use rust_decimal::Decimal;

use crate::{
    db_types::{Invoice, NewInvoice, NewLogEntry, PriceLock},
    events::{EventProducers, InvoiceCreatedEvent},
    helpers::asset_amount_for_fiat,
    isp_api::{errors::InvoiceFlowError, invoice_objects::InvoiceRequest},
    traits::{NewAddress, PriceOracle, SettlementGatewayDatabase, WalletCapability},
};

/// `InvoiceFlowApi` issues new invoices: it locks in the current price and hands out a fresh receiving address.
pub struct InvoiceFlowApi<B, W, P> {
    db: B,
    wallet: W,
    oracle: P,
    price_lock_duration: Duration,
    producers: EventProducers,
}

impl<B, W, P> Debug for InvoiceFlowApi<B, W, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InvoiceFlowApi")
    }
}

impl<B, W, P> InvoiceFlowApi<B, W, P> {
    pub fn new(db: B, wallet: W, oracle: P, price_lock_duration: Duration, producers: EventProducers) -> Self {
        Self { db, wallet, oracle, price_lock_duration, producers }
    }
}

impl<B, W, P> InvoiceFlowApi<B, W, P>
where
    B: SettlementGatewayDatabase,
    W: WalletCapability,
    P: PriceOracle,
{
    /// Creates a `pending` invoice for `request.amount_fiat` in `request.currency`.
    ///
    /// The amount due in the settlement asset is fixed now, at the current oracle rate, and stays valid for the price
    /// lock duration.
    pub async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice, InvoiceFlowError> {
        if request.amount_fiat <= Decimal::ZERO {
            return Err(InvoiceFlowError::InvalidAmount(format!("{} is not a positive amount", request.amount_fiat)));
        }
        let currency = request.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(InvoiceFlowError::InvalidAmount("A currency is required".to_string()));
        }
        let quote = self.oracle.quote(&currency).await?;
        let amount_asset = asset_amount_for_fiat(request.amount_fiat, quote.rate)?;
        let NewAddress { address, credential } = self.wallet.new_address().await?;
        let lock = PriceLock::new(quote.rate, self.price_lock_duration);
        let new_invoice = NewInvoice::new(
            request.merchant_id,
            address,
            credential,
            amount_asset,
            request.amount_fiat,
            currency,
            lock,
        );
        let invoice = self.db.insert_invoice(new_invoice).await?;
        let details = format!(
            "Invoice created for {} {} ({}) at {} until {}",
            invoice.amount_fiat,
            invoice.currency,
            invoice.amount_asset,
            invoice.price_lock.rate,
            invoice.price_lock.expires_at
        );
        if let Err(e) = self.db.append_log(NewLogEntry::info(details).for_invoice(&invoice.id)).await {
            warn!("🧾️ Invoice {} was created, but the audit log entry could not be written. {e}", invoice.id);
        }
        info!("🧾️ Invoice {} created. Pay {} to {}", invoice.id, invoice.amount_asset, invoice.receiving_address);
        self.producers.publish_invoice_created(InvoiceCreatedEvent::new(invoice.clone()));
        Ok(invoice)
    }
}
