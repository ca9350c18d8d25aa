//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers must never block the worker thread. Every database, wallet and price feed call is async, and a monitor
//! tick requested over HTTP is awaited like any other future.
use actix_web::{get, web, HttpResponse, Responder};
use invoice_settlement_engine::{
    db_types::InvoiceId,
    invoice_objects::InvoiceRequest,
    InvoiceFlowApi,
    InvoiceManagement,
    InvoiceMonitor,
    InvoiceQueryApi,
    PriceOracle,
    SettlementApi,
    SettlementGatewayDatabase,
    WalletCapability,
};
use log::*;

use crate::{
    data_objects::{RecoveryResult, StuckInvoicesParams},
    errors::ServerError,
    monitor_worker::log_report,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Monitor  ----------------------------------------------------
route!(monitor_tick => Post "/monitor/tick" impl SettlementGatewayDatabase, WalletCapability, PriceOracle);
/// Runs one monitor pass immediately and returns its report.
///
/// This is safe to call while the background worker is running. Both passes go through the same claims, so no invoice
/// is swept twice.
pub async fn monitor_tick<B, W, P>(monitor: web::Data<InvoiceMonitor<B, W, P>>) -> Result<HttpResponse, ServerError>
where
    B: SettlementGatewayDatabase,
    W: WalletCapability,
    P: PriceOracle,
{
    debug!("💻️ On-demand monitor tick requested");
    let report = monitor.tick().await?;
    log_report(&report);
    Ok(HttpResponse::Ok().json(report))
}

//----------------------------------------------   Invoices  ----------------------------------------------------
route!(create_invoice => Post "/invoices" impl SettlementGatewayDatabase, WalletCapability, PriceOracle);
pub async fn create_invoice<B, W, P>(
    api: web::Data<InvoiceFlowApi<B, W, P>>,
    body: web::Json<InvoiceRequest>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementGatewayDatabase,
    W: WalletCapability,
    P: PriceOracle,
{
    let request = body.into_inner();
    debug!("💻️ New invoice requested by {} for {} {}", request.merchant_id, request.amount_fiat, request.currency);
    let invoice = api.create_invoice(request).await?;
    Ok(HttpResponse::Created().json(invoice))
}

route!(invoice_by_id => Get "/invoices/{id}" impl InvoiceManagement);
/// The invoice, its settlement (if any) and its audit trail. The spending credential is never included.
pub async fn invoice_by_id<B: InvoiceManagement>(
    path: web::Path<String>,
    api: web::Data<InvoiceQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = InvoiceId::from(path.into_inner());
    trace!("💻️ Fetching invoice {id}");
    let details = api.invoice_details(&id).await?.ok_or_else(|| no_such_invoice(&id))?;
    Ok(HttpResponse::Ok().json(details))
}

route!(invoice_status => Get "/invoices/{id}/status" impl InvoiceManagement);
pub async fn invoice_status<B: InvoiceManagement>(
    path: web::Path<String>,
    api: web::Data<InvoiceQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = InvoiceId::from(path.into_inner());
    let status = api.invoice_status(&id).await?.ok_or_else(|| no_such_invoice(&id))?;
    Ok(HttpResponse::Ok().json(status))
}

route!(recover_invoice => Post "/invoices/{id}/recover" impl SettlementGatewayDatabase, WalletCapability, PriceOracle);
/// Sweeps funds that were paid to an invoice after it expired. The invoice stays `expired`.
pub async fn recover_invoice<B, W, P>(
    path: web::Path<String>,
    api: web::Data<SettlementApi<B, W, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementGatewayDatabase,
    W: WalletCapability,
    P: PriceOracle,
{
    let id = InvoiceId::from(path.into_inner());
    info!("💻️ Recovery of funds for invoice {id} requested");
    let invoice = api.recover_expired(&id).await?;
    Ok(HttpResponse::Ok().json(RecoveryResult::from(&invoice)))
}

route!(stuck_invoices => Get "/invoices/stuck" impl InvoiceManagement);
/// Confirmed invoices whose settlement keeps failing. Defaults to those that have not moved for 30 minutes.
pub async fn stuck_invoices<B: InvoiceManagement>(
    query: web::Query<StuckInvoicesParams>,
    api: web::Data<InvoiceQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let threshold = query.threshold();
    trace!("💻️ Fetching invoices stuck for more than {} minutes", threshold.num_minutes());
    let invoices = api.stuck_invoices(threshold).await?;
    Ok(HttpResponse::Ok().json(invoices))
}

fn no_such_invoice(id: &InvoiceId) -> ServerError {
    ServerError::NoRecordFound(format!("Invoice {id} does not exist"))
}
