use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use invoice_settlement_engine::{InvoiceFlowApi, InvoiceMonitor, InvoiceQueryApi, SettlementApi, SqliteDatabase};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{
        notifications::{create_notification_handlers, WebhookNotifier},
        price_feed::CoinGeckoOracle,
        wallet_daemon::WalletDaemonClient,
    },
    monitor_worker::start_monitor_worker,
    routes::{
        health,
        CreateInvoiceRoute,
        InvoiceByIdRoute,
        InvoiceStatusRoute,
        MonitorTickRoute,
        RecoverInvoiceRoute,
        StuckInvoicesRoute,
    },
};

pub type ServerMonitor = InvoiceMonitor<SqliteDatabase, WalletDaemonClient, CoinGeckoOracle>;
pub type ServerSettlementApi = SettlementApi<SqliteDatabase, WalletDaemonClient, CoinGeckoOracle>;
pub type ServerInvoiceFlowApi = InvoiceFlowApi<SqliteDatabase, WalletDaemonClient, CoinGeckoOracle>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    let wallet = WalletDaemonClient::new(config.wallet_daemon.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let oracle =
        CoinGeckoOracle::new(config.price_feed.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let webhook = config
        .notification_webhook_url
        .as_deref()
        .map(|url| WebhookNotifier::new(url, config.price_feed.timeout))
        .transpose()
        .map_err(|e| ServerError::InitializeError(format!("Could not create the notification client. {e}")))?;
    let handlers = create_notification_handlers(webhook);
    let producers = handlers.producers();
    handlers.start_handlers();

    let settlement =
        SettlementApi::new(db.clone(), wallet.clone(), oracle.clone(), config.settlement_options(), producers.clone());
    let monitor = InvoiceMonitor::new(settlement.clone(), config.monitor_options());
    let invoices = InvoiceFlowApi::new(db.clone(), wallet, oracle, config.price_lock_duration, producers);
    if config.disable_monitor {
        info!("🕰️ The background monitor is disabled");
    } else {
        let worker = start_monitor_worker(monitor.clone(), config.poll_interval);
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                error!("🕰️ The background monitor has stopped and invoices will only be processed on demand. {e}");
            }
        });
    }
    let srv = create_server_instance(config, db, monitor, settlement, invoices)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    monitor: ServerMonitor,
    settlement: ServerSettlementApi,
    invoices: ServerInvoiceFlowApi,
) -> Result<Server, ServerError> {
    let monitor = web::Data::new(monitor);
    let settlement = web::Data::new(settlement);
    let invoices = web::Data::new(invoices);
    let queries = web::Data::new(InvoiceQueryApi::new(db));
    let srv = HttpServer::new(move || {
        // `/invoices/stuck` must be registered before `/invoices/{id}`
        let api_scope = web::scope("/api")
            .service(MonitorTickRoute::<SqliteDatabase, WalletDaemonClient, CoinGeckoOracle>::new())
            .service(CreateInvoiceRoute::<SqliteDatabase, WalletDaemonClient, CoinGeckoOracle>::new())
            .service(StuckInvoicesRoute::<SqliteDatabase>::new())
            .service(InvoiceStatusRoute::<SqliteDatabase>::new())
            .service(RecoverInvoiceRoute::<SqliteDatabase, WalletDaemonClient, CoinGeckoOracle>::new())
            .service(InvoiceByIdRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("isp::access_log"))
            .app_data(monitor.clone())
            .app_data(settlement.clone())
            .app_data(invoices.clone())
            .app_data(queries.clone())
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
