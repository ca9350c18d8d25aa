use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use invoice_settlement_engine::{
    db_types::InvoiceStatus,
    events::EventProducers,
    InvoiceMonitor,
    MonitorOptions,
    SettlementApi,
    SettlementOptions,
};
use serde_json::{json, Value};

use super::{
    helpers::{sample_invoice, send_request},
    mocks::{MockOracle, MockStore, MockWallet},
};
use crate::routes::MonitorTickRoute;

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_fetch_open_invoices().returning(|| {
        let mut invoice = sample_invoice("inv-late", InvoiceStatus::Pending);
        invoice.price_lock.expires_at = chrono::Utc::now() - chrono::Duration::minutes(1);
        Ok(vec![invoice])
    });
    store.expect_mark_invoice_expired().times(1).returning(|id| {
        assert_eq!(id.as_str(), "inv-late");
        Ok(sample_invoice("inv-late", InvoiceStatus::Expired))
    });
    // An expired price lock is decided without asking the wallet
    let wallet = MockWallet::new();
    let settlement = SettlementApi::new(
        store,
        wallet,
        MockOracle::new(),
        SettlementOptions::new("bitcoincash:qexchange"),
        EventProducers::default(),
    );
    let monitor = InvoiceMonitor::new(settlement, MonitorOptions::default());
    cfg.service(MonitorTickRoute::<MockStore, MockWallet, MockOracle>::new()).app_data(web::Data::new(monitor));
}

#[actix_web::test]
async fn on_demand_tick_returns_the_report() {
    let req = TestRequest::post().uri("/monitor/tick");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["expired"], json!(["inv-late"]));
    assert_eq!(body["settled"], json!([]));
    assert_eq!(body["failed"], json!([]));
    assert_eq!(body["unchanged"], json!(0));
}

#[actix_web::test]
async fn ticks_are_only_accepted_as_posts() {
    let req = TestRequest::get().uri("/monitor/tick");
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
