use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use invoice_settlement_engine::events::{EventHandlers, EventHooks, EventType};
use log::*;
use reqwest::Client;

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

/// Forwards pipeline events to an HTTP endpoint as JSON.
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    client: Arc<Client>,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { url: url.to_string(), client: Arc::new(client) })
    }

    pub async fn post(&self, event: &EventType) {
        let id = event.invoice_id();
        match self.client.post(&self.url).json(event).send().await {
            Ok(res) if res.status().is_success() => {
                debug!("🔌️ Notification {} for invoice {id} delivered", event.kind())
            },
            Ok(res) => warn!("🔌️ Notification {} for invoice {id} was refused. {}", event.kind(), res.status()),
            Err(e) => warn!("🔌️ Could not deliver notification {} for invoice {id}. {e}", event.kind()),
        }
    }
}

/// Hooks every pipeline event. Each one is written to the log as an outbound message, and POSTed to the webhook if
/// there is one. Delivery failures are logged and otherwise ignored.
pub fn create_notification_handlers(webhook: Option<WebhookNotifier>) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let w = webhook.clone();
    hooks.on_invoice_created(move |ev| notify(w.clone(), ev.into()));
    let w = webhook.clone();
    hooks.on_invoice_expired(move |ev| notify(w.clone(), ev.into()));
    let w = webhook.clone();
    hooks.on_payment_received(move |ev| notify(w.clone(), ev.into()));
    let w = webhook.clone();
    hooks.on_settlement_completed(move |ev| notify(w.clone(), ev.into()));
    let w = webhook.clone();
    hooks.on_settlement_failed(move |ev| notify(w.clone(), ev.into()));
    hooks.on_funds_recovered(move |ev| notify(webhook.clone(), ev.into()));
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}

fn notify(webhook: Option<WebhookNotifier>, event: EventType) -> BoxFuture<'static, ()> {
    info!("🔌️ ✉️ [{}] {}", event.invoice_id(), describe(&event));
    match webhook {
        Some(webhook) => Box::pin(async move { webhook.post(&event).await }),
        None => Box::pin(async {}),
    }
}

/// A one-line, human readable summary of an event.
pub fn describe(event: &EventType) -> String {
    match event {
        EventType::InvoiceCreated(e) => format!(
            "New invoice for {} {}. Pay {} to {} before {}",
            e.invoice.amount_fiat,
            e.invoice.currency,
            e.invoice.amount_asset,
            e.invoice.receiving_address,
            e.invoice.price_lock.expires_at
        ),
        EventType::InvoiceExpired(e) => {
            format!("Invoice expired unpaid. The price lock ended at {}", e.invoice.price_lock.expires_at)
        },
        EventType::PaymentReceived(e) => format!("Payment received in transaction {}", e.tx_hash),
        EventType::SettlementCompleted(e) => format!(
            "Settled {} as {} {} (sweep {})",
            e.settlement.asset_amount, e.settlement.stable_amount, e.settlement.currency, e.settlement.tx_hash
        ),
        EventType::SettlementFailed(e) => format!("Settlement failed. {}", e.reason),
        EventType::FundsRecovered(e) => format!("Late payment recovered to the exchange in {}", e.sweep_tx_hash),
    }
}
