use chrono::{DateTime, Duration, Utc};
use invoice_settlement_engine::{
    db_types::{Invoice, InvoiceId, InvoiceStatus, LogEntry, NewInvoice, NewLogEntry, NewSettlement, Settlement},
    traits::{AddressTransaction, NewAddress, PriceQuote},
    InvoiceManagement,
    InvoiceQueryError,
    PriceOracle,
    PriceOracleError,
    SettlementGatewayDatabase,
    SettlementGatewayError,
    WalletCapability,
    WalletError,
};
use isp_common::Secret;
use mockall::mock;

mock! {
    pub Store {}
    impl Clone for Store {
        fn clone(&self) -> Self;
    }
    impl InvoiceManagement for Store {
        async fn fetch_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, InvoiceQueryError>;
        async fn fetch_invoice_by_address(&self, address: &str) -> Result<Option<Invoice>, InvoiceQueryError>;
        async fn fetch_open_invoices(&self) -> Result<Vec<Invoice>, InvoiceQueryError>;
        async fn fetch_stuck_invoices(&self, older_than: DateTime<Utc>) -> Result<Vec<Invoice>, InvoiceQueryError>;
        async fn fetch_settlement_for_invoice(&self, id: &InvoiceId) -> Result<Option<Settlement>, InvoiceQueryError>;
        async fn fetch_logs_for_invoice(&self, id: &InvoiceId) -> Result<Vec<LogEntry>, InvoiceQueryError>;
        async fn fetch_recent_logs(&self, limit: i64) -> Result<Vec<LogEntry>, InvoiceQueryError>;
    }
    impl SettlementGatewayDatabase for Store {
        fn url(&self) -> &str;
        async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, SettlementGatewayError>;
        async fn mark_invoice_confirmed(&self, id: &InvoiceId, payment_tx_hash: &str) -> Result<Invoice, SettlementGatewayError>;
        async fn mark_invoice_expired(&self, id: &InvoiceId) -> Result<Invoice, SettlementGatewayError>;
        async fn claim_invoice(&self, id: &InvoiceId, expected: InvoiceStatus, lease: Duration) -> Result<Invoice, SettlementGatewayError>;
        async fn release_claim(&self, id: &InvoiceId) -> Result<(), SettlementGatewayError>;
        async fn record_sweep(&self, id: &InvoiceId, sweep_tx_hash: &str, log: NewLogEntry) -> Result<Invoice, SettlementGatewayError>;
        async fn complete_settlement(&self, settlement: NewSettlement, log: NewLogEntry) -> Result<(Invoice, Settlement), SettlementGatewayError>;
        async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, SettlementGatewayError>;
    }
}

mock! {
    pub Wallet {}
    impl WalletCapability for Wallet {
        async fn new_address(&self) -> Result<NewAddress, WalletError>;
        async fn history(&self, address: &str) -> Result<Vec<AddressTransaction>, WalletError>;
        async fn sweep(&self, credential: &Secret<String>, destination: &str) -> Result<String, WalletError>;
    }
}

mock! {
    pub Oracle {}
    impl PriceOracle for Oracle {
        async fn quote(&self, currency: &str) -> Result<PriceQuote, PriceOracleError>;
    }
}
