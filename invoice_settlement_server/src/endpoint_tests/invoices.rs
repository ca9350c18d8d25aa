use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use invoice_settlement_engine::{
    db_types::InvoiceStatus,
    events::EventProducers,
    InvoiceFlowApi,
    InvoiceQueryApi,
    SettlementApi,
    SettlementOptions,
};
use serde_json::{json, Value};

use super::{
    helpers::{sample_invoice, send_request},
    mocks::{MockOracle, MockStore, MockWallet},
};
use crate::routes::{CreateInvoiceRoute, InvoiceByIdRoute, InvoiceStatusRoute, RecoverInvoiceRoute, StuckInvoicesRoute};

fn configure_queries(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_fetch_invoice().returning(|id| {
        let invoice = match id.as_str() {
            "inv-100" => Some(sample_invoice("inv-100", InvoiceStatus::Pending)),
            "inv-200" => {
                let mut invoice = sample_invoice("inv-200", InvoiceStatus::Settled);
                invoice.spending_credential = None;
                invoice.settlement_tx_hash = Some("abc123".into());
                invoice.sweep_tx_hash = Some("abc123".into());
                Some(invoice)
            },
            _ => None,
        };
        Ok(invoice)
    });
    store.expect_fetch_settlement_for_invoice().returning(|_| Ok(None));
    store.expect_fetch_logs_for_invoice().returning(|_| Ok(vec![]));
    store.expect_fetch_stuck_invoices().returning(|older_than| {
        // The default threshold is half an hour
        let cutoff = Utc::now() - Duration::minutes(30);
        assert!((older_than - cutoff).num_seconds().abs() < 5, "Unexpected cutoff {older_than}");
        Ok(vec![sample_invoice("inv-300", InvoiceStatus::Confirmed)])
    });
    // `/invoices/stuck` must be registered before `/invoices/{id}`, as in `server.rs`
    cfg.service(StuckInvoicesRoute::<MockStore>::new())
        .service(InvoiceStatusRoute::<MockStore>::new())
        .service(InvoiceByIdRoute::<MockStore>::new())
        .app_data(web::Data::new(InvoiceQueryApi::new(store)));
}

#[actix_web::test]
async fn fetch_invoice_details() {
    let req = TestRequest::get().uri("/invoices/inv-100");
    let (status, body) = send_request(req, configure_queries).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("wif-very-secret"), "The spending credential leaked: {body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["invoice"]["id"], json!("inv-100"));
    assert_eq!(body["invoice"]["status"], json!("pending"));
    assert_eq!(body["invoice"]["receiving_address"], json!("bitcoincash:qinv-100"));
    assert_eq!(body["settlement"], Value::Null);
    assert_eq!(body["logs"], json!([]));
}

#[actix_web::test]
async fn fetch_missing_invoice() {
    let req = TestRequest::get().uri("/invoices/nope");
    let (status, body) = send_request(req, configure_queries).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Invoice #nope does not exist"}"#);
}

#[actix_web::test]
async fn fetch_invoice_status() {
    let req = TestRequest::get().uri("/invoices/inv-200/status");
    let (status, body) = send_request(req, configure_queries).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body, json!({"status": "settled", "settlement_tx_hash": "abc123"}));
}

#[actix_web::test]
async fn fetch_stuck_invoices() {
    let req = TestRequest::get().uri("/invoices/stuck");
    let (status, body) = send_request(req, configure_queries).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    assert_eq!(body[0]["id"], json!("inv-300"));
}

fn configure_flows(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_fetch_invoice().returning(|_| Ok(None));
    let settlement = SettlementApi::new(
        store,
        MockWallet::new(),
        MockOracle::new(),
        SettlementOptions::new("bitcoincash:qexchange"),
        EventProducers::default(),
    );
    // Nothing here may reach the store, wallet or oracle
    let invoices = InvoiceFlowApi::new(
        MockStore::new(),
        MockWallet::new(),
        MockOracle::new(),
        Duration::minutes(15),
        EventProducers::default(),
    );
    cfg.service(CreateInvoiceRoute::<MockStore, MockWallet, MockOracle>::new())
        .service(RecoverInvoiceRoute::<MockStore, MockWallet, MockOracle>::new())
        .app_data(web::Data::new(settlement))
        .app_data(web::Data::new(invoices));
}

#[actix_web::test]
async fn create_invoice_with_invalid_amount() {
    let req = TestRequest::post()
        .uri("/invoices")
        .set_json(json!({"merchant_id": "merchant-1", "amount_fiat": "-5", "currency": "USD"}));
    let (status, body) = send_request(req, configure_flows).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("is not a positive amount"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn recover_missing_invoice() {
    let req = TestRequest::post().uri("/invoices/ghost/recover");
    let (status, body) = send_request(req, configure_flows).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Invoice #ghost does not exist"), "Unexpected body: {body}");
}
