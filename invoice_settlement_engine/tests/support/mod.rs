#![allow(dead_code)]

pub mod fakes;
pub mod prepare_env;

use std::str::FromStr;

use chrono::Duration;
use fakes::{FakeWallet, FixedPriceOracle};
use invoice_settlement_engine::{
    db_types::{Invoice, InvoiceId, LogType, NewInvoice, PriceLock},
    events::EventProducers,
    InvoiceFlowApi,
    InvoiceManagement,
    InvoiceMonitor,
    InvoiceQueryApi,
    MonitorOptions,
    SettlementApi,
    SettlementGatewayDatabase,
    SettlementOptions,
    SqliteDatabase,
};
use isp_common::{Satoshis, Secret};
use prepare_env::{prepare_test_env, random_db_path};
use rust_decimal::Decimal;

pub const EXCHANGE_ADDRESS: &str = "bitcoincash:qexchangecustody";

pub type TestSettlementApi = SettlementApi<SqliteDatabase, FakeWallet, FixedPriceOracle>;
pub type TestMonitor = InvoiceMonitor<SqliteDatabase, FakeWallet, FixedPriceOracle>;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("Not a valid decimal")
}

/// A complete pipeline wired to a fresh SQLite database, a fake wallet and a fixed-price oracle.
#[derive(Debug)]
pub struct TestSystem {
    pub db: SqliteDatabase,
    pub wallet: FakeWallet,
    pub oracle: FixedPriceOracle,
    pub monitor: TestMonitor,
    pub invoices: InvoiceFlowApi<SqliteDatabase, FakeWallet, FixedPriceOracle>,
    pub queries: InvoiceQueryApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_options(MonitorOptions::default(), EventProducers::default()).await
    }

    pub async fn with_options(monitor_options: MonitorOptions, producers: EventProducers) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let wallet = FakeWallet::default();
        let oracle = FixedPriceOracle::new(Decimal::from(300));
        let settlement = SettlementApi::new(
            db.clone(),
            wallet.clone(),
            oracle.clone(),
            SettlementOptions::new(EXCHANGE_ADDRESS),
            producers.clone(),
        );
        let monitor = InvoiceMonitor::new(settlement, monitor_options);
        let invoices =
            InvoiceFlowApi::new(db.clone(), wallet.clone(), oracle.clone(), Duration::minutes(15), producers);
        let queries = InvoiceQueryApi::new(db.clone());
        Self { db, wallet, oracle, monitor, invoices, queries }
    }

    pub fn settlement(&self) -> &TestSettlementApi {
        self.monitor.settlement()
    }

    /// Stores an invoice directly, bypassing the oracle. A negative `valid_for` gives an invoice whose price lock has
    /// already lapsed.
    pub async fn insert_invoice(&self, id: &str, coins: &str, rate: &str, valid_for: Duration) -> Invoice {
        let amount = Satoshis::from_coins(dec(coins)).expect("Not a valid amount");
        let rate = dec(rate);
        let fiat = amount.to_coins() * rate;
        let invoice = NewInvoice::new(
            "merchant-1".to_string(),
            format!("bitcoincash:q{id}"),
            Secret::new(format!("wif-{id}")),
            amount,
            fiat,
            "USD".to_string(),
            PriceLock::new(rate, valid_for),
        )
        .with_id(InvoiceId::from(id));
        self.db.insert_invoice(invoice).await.expect("Error inserting invoice")
    }

    /// A `pending` invoice that is still within its price lock.
    pub async fn pending_invoice(&self, id: &str, coins: &str, rate: &str) -> Invoice {
        self.insert_invoice(id, coins, rate, Duration::minutes(15)).await
    }

    /// A `confirmed` invoice, paid by `payment_tx`.
    pub async fn confirmed_invoice(&self, id: &str, coins: &str, rate: &str, payment_tx: &str) -> Invoice {
        let invoice = self.pending_invoice(id, coins, rate).await;
        self.db.mark_invoice_confirmed(&invoice.id, payment_tx).await.expect("Error confirming invoice")
    }

    pub async fn invoice(&self, id: &str) -> Invoice {
        self.db.fetch_invoice(&InvoiceId::from(id)).await.expect("Error fetching invoice").expect("No such invoice")
    }

    pub async fn log_types(&self, id: &str) -> Vec<LogType> {
        let logs = self.db.fetch_logs_for_invoice(&InvoiceId::from(id)).await.expect("Error fetching logs");
        logs.into_iter().map(|l| l.log_type).collect()
    }

    pub async fn tear_down(self) {
        prepare_env::tear_down(self.db).await;
    }
}
