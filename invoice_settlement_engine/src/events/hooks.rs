use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    FundsRecoveredEvent,
    Handler,
    InvoiceCreatedEvent,
    InvoiceExpiredEvent,
    PaymentReceivedEvent,
    SettlementCompletedEvent,
    SettlementFailedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub invoice_created_producer: Vec<EventProducer<InvoiceCreatedEvent>>,
    pub invoice_expired_producer: Vec<EventProducer<InvoiceExpiredEvent>>,
    pub payment_received_producer: Vec<EventProducer<PaymentReceivedEvent>>,
    pub settlement_completed_producer: Vec<EventProducer<SettlementCompletedEvent>>,
    pub settlement_failed_producer: Vec<EventProducer<SettlementFailedEvent>>,
    pub funds_recovered_producer: Vec<EventProducer<FundsRecoveredEvent>>,
}

impl EventProducers {
    pub fn publish_invoice_created(&self, event: InvoiceCreatedEvent) {
        publish(&self.invoice_created_producer, event);
    }

    pub fn publish_invoice_expired(&self, event: InvoiceExpiredEvent) {
        publish(&self.invoice_expired_producer, event);
    }

    pub fn publish_payment_received(&self, event: PaymentReceivedEvent) {
        publish(&self.payment_received_producer, event);
    }

    pub fn publish_settlement_completed(&self, event: SettlementCompletedEvent) {
        publish(&self.settlement_completed_producer, event);
    }

    pub fn publish_settlement_failed(&self, event: SettlementFailedEvent) {
        publish(&self.settlement_failed_producer, event);
    }

    pub fn publish_funds_recovered(&self, event: FundsRecoveredEvent) {
        publish(&self.funds_recovered_producer, event);
    }
}

fn publish<E: Clone + Send + Sync>(producers: &[EventProducer<E>], event: E) {
    for producer in producers {
        producer.publish_event(event.clone());
    }
}

pub struct EventHandlers {
    pub on_invoice_created: Option<EventHandler<InvoiceCreatedEvent>>,
    pub on_invoice_expired: Option<EventHandler<InvoiceExpiredEvent>>,
    pub on_payment_received: Option<EventHandler<PaymentReceivedEvent>>,
    pub on_settlement_completed: Option<EventHandler<SettlementCompletedEvent>>,
    pub on_settlement_failed: Option<EventHandler<SettlementFailedEvent>>,
    pub on_funds_recovered: Option<EventHandler<FundsRecoveredEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_invoice_created: hooks.on_invoice_created.map(|f| EventHandler::new(buffer_size, f)),
            on_invoice_expired: hooks.on_invoice_expired.map(|f| EventHandler::new(buffer_size, f)),
            on_payment_received: hooks.on_payment_received.map(|f| EventHandler::new(buffer_size, f)),
            on_settlement_completed: hooks.on_settlement_completed.map(|f| EventHandler::new(buffer_size, f)),
            on_settlement_failed: hooks.on_settlement_failed.map(|f| EventHandler::new(buffer_size, f)),
            on_funds_recovered: hooks.on_funds_recovered.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_invoice_created {
            result.invoice_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_invoice_expired {
            result.invoice_expired_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_received {
            result.payment_received_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_settlement_completed {
            result.settlement_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_settlement_failed {
            result.settlement_failed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_funds_recovered {
            result.funds_recovered_producer.push(handler.subscribe());
        }
        result
    }

    pub fn start_handlers(self) {
        if let Some(handler) = self.on_invoice_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_invoice_expired {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_received {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_settlement_completed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_settlement_failed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_funds_recovered {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_invoice_created: Option<Handler<InvoiceCreatedEvent>>,
    pub on_invoice_expired: Option<Handler<InvoiceExpiredEvent>>,
    pub on_payment_received: Option<Handler<PaymentReceivedEvent>>,
    pub on_settlement_completed: Option<Handler<SettlementCompletedEvent>>,
    pub on_settlement_failed: Option<Handler<SettlementFailedEvent>>,
    pub on_funds_recovered: Option<Handler<FundsRecoveredEvent>>,
}

impl EventHooks {
    pub fn on_invoice_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(InvoiceCreatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_invoice_created = Some(Arc::new(f));
        self
    }

    pub fn on_invoice_expired<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(InvoiceExpiredEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_invoice_expired = Some(Arc::new(f));
        self
    }

    pub fn on_payment_received<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentReceivedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_payment_received = Some(Arc::new(f));
        self
    }

    pub fn on_settlement_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SettlementCompletedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_settlement_completed = Some(Arc::new(f));
        self
    }

    pub fn on_settlement_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SettlementFailedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_settlement_failed = Some(Arc::new(f));
        self
    }

    pub fn on_funds_recovered<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(FundsRecoveredEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_funds_recovered = Some(Arc::new(f));
        self
    }
}
