//! Adapters that connect the settlement engine to the outside world.
//!
//! * [`wallet_daemon`]: a REST client for the signing wallet daemon, implementing `WalletCapability`.
//! * [`price_feed`]: a CoinGecko client, implementing `PriceOracle`.
//! * [`notifications`]: event hooks that log every pipeline event and optionally forward it to a webhook.
pub mod notifications;
pub mod price_feed;
pub mod wallet_daemon;
