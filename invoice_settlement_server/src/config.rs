//! Server configuration.
//!
//! Everything is read from `ISP_*` environment variables by [`ServerConfig::from_env_or_default`]. Invalid values are
//! logged and replaced with their defaults. Values the server cannot work without are logged as errors but do not stop
//! it from starting, so that `GET /health` and the CLI help still work.
use std::{env, time::Duration};

use invoice_settlement_engine::{helpers::FeeRate, DetectionPolicy, MonitorOptions, SettlementOptions};
use isp_common::{
    helpers::{env_or_default, parse_boolean_flag},
    Secret,
};
use log::*;

const DEFAULT_ISP_HOST: &str = "127.0.0.1";
const DEFAULT_ISP_PORT: u16 = 8360;
const DEFAULT_STABLE_CURRENCY: &str = "USDT";
const DEFAULT_REFERENCE_CURRENCY: &str = "usd";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_TICK_BUDGET_SECS: u64 = 45;
const DEFAULT_MONITOR_CONCURRENCY: usize = 4;
const DEFAULT_CLAIM_LEASE_SECS: i64 = 600;
const DEFAULT_PRICE_LOCK_MINUTES: i64 = 15;
const DEFAULT_FEE_RATE_MSAT_PER_BYTE: u64 = 1100;
const DEFAULT_PRICE_FEED_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_PRICE_FEED_ASSET_ID: &str = "bitcoin-cash";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The custodial exchange address that every sweep pays to
    pub exchange_address: String,
    pub stable_currency: String,
    pub reference_currency: String,
    /// Time between background monitor ticks
    pub poll_interval: Duration,
    pub tick_budget: Duration,
    pub monitor_concurrency: usize,
    pub claim_lease: chrono::Duration,
    pub price_lock_duration: chrono::Duration,
    pub detection: DetectionPolicy,
    pub wallet_daemon: WalletDaemonConfig,
    pub price_feed: PriceFeedConfig,
    /// If set, every pipeline event is POSTed to this url as JSON
    pub notification_webhook_url: Option<String>,
    /// When true, no background monitor runs and ticks only happen on request
    pub disable_monitor: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ISP_HOST.to_string(),
            port: DEFAULT_ISP_PORT,
            database_url: String::default(),
            exchange_address: String::default(),
            stable_currency: DEFAULT_STABLE_CURRENCY.to_string(),
            reference_currency: DEFAULT_REFERENCE_CURRENCY.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            tick_budget: Duration::from_secs(DEFAULT_TICK_BUDGET_SECS),
            monitor_concurrency: DEFAULT_MONITOR_CONCURRENCY,
            claim_lease: chrono::Duration::seconds(DEFAULT_CLAIM_LEASE_SECS),
            price_lock_duration: chrono::Duration::minutes(DEFAULT_PRICE_LOCK_MINUTES),
            detection: DetectionPolicy::default(),
            wallet_daemon: WalletDaemonConfig::default(),
            price_feed: PriceFeedConfig::default(),
            notification_webhook_url: None,
            disable_monitor: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ISP_HOST").ok().unwrap_or_else(|| DEFAULT_ISP_HOST.into());
        let port = env_or_default("ISP_PORT", DEFAULT_ISP_PORT);
        let database_url = required_env("ISP_DATABASE_URL", "the URL of the settlement database");
        let exchange_address = required_env("ISP_EXCHANGE_ADDRESS", "the exchange address that funds are swept to");
        let stable_currency = env_or_default("ISP_STABLE_CURRENCY", DEFAULT_STABLE_CURRENCY.to_string());
        let reference_currency = env_or_default("ISP_REFERENCE_CURRENCY", DEFAULT_REFERENCE_CURRENCY.to_string());
        let poll_interval = Duration::from_secs(env_or_default("ISP_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS));
        let tick_budget = Duration::from_secs(env_or_default("ISP_TICK_BUDGET_SECS", DEFAULT_TICK_BUDGET_SECS));
        let monitor_concurrency = env_or_default("ISP_MONITOR_CONCURRENCY", DEFAULT_MONITOR_CONCURRENCY);
        let claim_lease = chrono::Duration::seconds(env_or_default("ISP_CLAIM_LEASE_SECS", DEFAULT_CLAIM_LEASE_SECS));
        let price_lock_duration =
            chrono::Duration::minutes(env_or_default("ISP_PRICE_LOCK_MINUTES", DEFAULT_PRICE_LOCK_MINUTES));
        let detection = DetectionPolicy::new(
            env_or_default("ISP_MIN_CONFIRMATIONS", 0),
            parse_boolean_flag(env::var("ISP_REQUIRE_FULL_AMOUNT").ok(), false),
        );
        let timeout = Duration::from_secs(env_or_default("ISP_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS));
        let wallet_daemon = WalletDaemonConfig::from_env_or_default(timeout);
        let price_feed = PriceFeedConfig::from_env_or_default(timeout);
        let notification_webhook_url = env::var("ISP_NOTIFICATION_WEBHOOK_URL").ok().filter(|s| !s.trim().is_empty());
        match &notification_webhook_url {
            Some(url) => info!("🪛️ Pipeline events will be posted to {url}"),
            None => info!("🪛️ ISP_NOTIFICATION_WEBHOOK_URL is not set. Pipeline events will only be logged."),
        }
        let disable_monitor = parse_boolean_flag(env::var("ISP_DISABLE_MONITOR").ok(), false);
        if disable_monitor {
            warn!("🪛️ The background monitor is disabled. Invoices will only progress when a tick is requested.");
        }
        Self {
            host,
            port,
            database_url,
            exchange_address,
            stable_currency,
            reference_currency,
            poll_interval,
            tick_budget,
            monitor_concurrency,
            claim_lease,
            price_lock_duration,
            detection,
            wallet_daemon,
            price_feed,
            notification_webhook_url,
            disable_monitor,
        }
    }

    pub fn settlement_options(&self) -> SettlementOptions {
        SettlementOptions {
            exchange_address: self.exchange_address.clone(),
            stable_currency: self.stable_currency.clone(),
            reference_currency: self.reference_currency.clone(),
            claim_lease: self.claim_lease,
        }
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            tick_budget: self.tick_budget,
            concurrency: self.monitor_concurrency,
            detection: self.detection,
        }
    }
}

fn required_env(name: &str, what: &str) -> String {
    env::var(name).ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
        error!("🪛️ {name} is not set. Please set it to {what}.");
        String::default()
    })
}

//-------------------------------------------------  WalletDaemonConfig  -----------------------------------------------
#[derive(Clone, Debug)]
pub struct WalletDaemonConfig {
    pub url: String,
    pub token: Secret<String>,
    pub fee_rate: FeeRate,
    pub timeout: Duration,
}

impl Default for WalletDaemonConfig {
    fn default() -> Self {
        Self {
            url: String::default(),
            token: Secret::default(),
            fee_rate: FeeRate::from_millisats_per_byte(DEFAULT_FEE_RATE_MSAT_PER_BYTE),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl WalletDaemonConfig {
    pub fn from_env_or_default(timeout: Duration) -> Self {
        let url = required_env("ISP_WALLET_DAEMON_URL", "the base URL of the signing wallet daemon");
        let token = env::var("ISP_WALLET_DAEMON_TOKEN").map(Secret::new).unwrap_or_else(|_| {
            warn!("🪛️ ISP_WALLET_DAEMON_TOKEN is not set. Requests to the wallet daemon will not be authenticated.");
            Secret::default()
        });
        let fee_rate = FeeRate::from_millisats_per_byte(env_or_default(
            "ISP_FEE_RATE_MSAT_PER_BYTE",
            DEFAULT_FEE_RATE_MSAT_PER_BYTE,
        ));
        Self { url: url.trim_end_matches('/').to_string(), token, fee_rate, timeout }
    }
}

//-------------------------------------------------  PriceFeedConfig  --------------------------------------------------
#[derive(Clone, Debug)]
pub struct PriceFeedConfig {
    pub url: String,
    /// The feed's identifier for the settlement asset
    pub asset_id: String,
    pub timeout: Duration,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PRICE_FEED_URL.to_string(),
            asset_id: DEFAULT_PRICE_FEED_ASSET_ID.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl PriceFeedConfig {
    pub fn from_env_or_default(timeout: Duration) -> Self {
        let url = env_or_default("ISP_PRICE_FEED_URL", DEFAULT_PRICE_FEED_URL.to_string());
        let asset_id = env_or_default("ISP_PRICE_FEED_ASSET_ID", DEFAULT_PRICE_FEED_ASSET_ID.to_string());
        Self { url: url.trim_end_matches('/').to_string(), asset_id, timeout }
    }
}
