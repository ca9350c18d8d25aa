use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{Duration, TimeZone, Utc};
use invoice_settlement_engine::db_types::{Invoice, InvoiceStatus, PriceLock};
use isp_common::{Satoshis, Secret};
use log::debug;
use rust_decimal::Decimal;

pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

/// A pending invoice for 0.5 coins at 300 USD, as the store would return it.
pub fn sample_invoice(id: &str, status: InvoiceStatus) -> Invoice {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 17, 12, 0, 0).unwrap();
    Invoice {
        id: id.into(),
        merchant_id: "merchant-1".into(),
        receiving_address: format!("bitcoincash:q{id}"),
        spending_credential: Some(Secret::new("wif-very-secret".to_string())),
        amount_asset: Satoshis::from(50_000_000),
        amount_fiat: Decimal::from(150),
        currency: "USD".into(),
        price_lock: PriceLock { rate: Decimal::from(300), expires_at: created_at + Duration::minutes(15) },
        status,
        settlement_tx_hash: None,
        sweep_tx_hash: None,
        claim_expires_at: None,
        created_at,
        updated_at: created_at,
    }
}
