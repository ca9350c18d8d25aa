use serde::Serialize;

use crate::db_types::{Invoice, InvoiceId, Settlement};

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceCreatedEvent {
    pub invoice: Invoice,
}

impl InvoiceCreatedEvent {
    pub fn new(invoice: Invoice) -> Self {
        Self { invoice }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceExpiredEvent {
    pub invoice: Invoice,
}

impl InvoiceExpiredEvent {
    pub fn new(invoice: Invoice) -> Self {
        Self { invoice }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceivedEvent {
    pub invoice: Invoice,
    /// The transaction that was accepted as payment
    pub tx_hash: String,
}

impl PaymentReceivedEvent {
    pub fn new(invoice: Invoice, tx_hash: String) -> Self {
        Self { invoice, tx_hash }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementCompletedEvent {
    pub invoice: Invoice,
    pub settlement: Settlement,
}

impl SettlementCompletedEvent {
    pub fn new(invoice: Invoice, settlement: Settlement) -> Self {
        Self { invoice, settlement }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementFailedEvent {
    pub invoice_id: InvoiceId,
    pub reason: String,
}

impl SettlementFailedEvent {
    pub fn new(invoice_id: InvoiceId, reason: String) -> Self {
        Self { invoice_id, reason }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FundsRecoveredEvent {
    pub invoice: Invoice,
    pub sweep_tx_hash: String,
}

impl FundsRecoveredEvent {
    pub fn new(invoice: Invoice, sweep_tx_hash: String) -> Self {
        Self { invoice, sweep_tx_hash }
    }
}

/// All lifecycle events, tagged with their kind when serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum EventType {
    InvoiceCreated(InvoiceCreatedEvent),
    InvoiceExpired(InvoiceExpiredEvent),
    PaymentReceived(PaymentReceivedEvent),
    SettlementCompleted(SettlementCompletedEvent),
    SettlementFailed(SettlementFailedEvent),
    FundsRecovered(FundsRecoveredEvent),
}

impl EventType {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvoiceCreated(_) => "invoice_created",
            Self::InvoiceExpired(_) => "invoice_expired",
            Self::PaymentReceived(_) => "payment_received",
            Self::SettlementCompleted(_) => "settlement_completed",
            Self::SettlementFailed(_) => "settlement_failed",
            Self::FundsRecovered(_) => "funds_recovered",
        }
    }

    pub fn invoice_id(&self) -> &InvoiceId {
        match self {
            Self::InvoiceCreated(e) => &e.invoice.id,
            Self::InvoiceExpired(e) => &e.invoice.id,
            Self::PaymentReceived(e) => &e.invoice.id,
            Self::SettlementCompleted(e) => &e.invoice.id,
            Self::SettlementFailed(e) => &e.invoice_id,
            Self::FundsRecovered(e) => &e.invoice.id,
        }
    }
}

impl From<InvoiceCreatedEvent> for EventType {
    fn from(e: InvoiceCreatedEvent) -> Self {
        Self::InvoiceCreated(e)
    }
}

impl From<InvoiceExpiredEvent> for EventType {
    fn from(e: InvoiceExpiredEvent) -> Self {
        Self::InvoiceExpired(e)
    }
}

impl From<PaymentReceivedEvent> for EventType {
    fn from(e: PaymentReceivedEvent) -> Self {
        Self::PaymentReceived(e)
    }
}

impl From<SettlementCompletedEvent> for EventType {
    fn from(e: SettlementCompletedEvent) -> Self {
        Self::SettlementCompleted(e)
    }
}

impl From<SettlementFailedEvent> for EventType {
    fn from(e: SettlementFailedEvent) -> Self {
        Self::SettlementFailed(e)
    }
}

impl From<FundsRecoveredEvent> for EventType {
    fn from(e: FundsRecoveredEvent) -> Self {
        Self::FundsRecovered(e)
    }
}
