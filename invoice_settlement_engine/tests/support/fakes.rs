use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use invoice_settlement_engine::{
    traits::{AddressTransaction, NewAddress, PriceQuote},
    PriceOracle,
    PriceOracleError,
    WalletCapability,
    WalletError,
};
use isp_common::Secret;
use rust_decimal::Decimal;

#[derive(Debug, Default)]
struct WalletState {
    addresses_issued: u64,
    history: HashMap<String, Vec<AddressTransaction>>,
    history_errors: HashMap<String, WalletError>,
    history_delay: Option<Duration>,
    sweep_results: VecDeque<Result<String, WalletError>>,
    sweep_delay: Option<Duration>,
    broadcasts: Vec<Broadcast>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub credential: String,
    pub destination: String,
    pub tx_hash: String,
}

/// An in-memory wallet. Addresses are handed out sequentially, history is whatever the test adds, and sweeps return
/// scripted results.
#[derive(Debug, Clone, Default)]
pub struct FakeWallet {
    state: Arc<Mutex<WalletState>>,
}

impl FakeWallet {
    pub fn add_transaction(&self, address: &str, tx: AddressTransaction) {
        let mut state = self.state.lock().unwrap();
        state.history.entry(address.to_string()).or_default().push(tx);
    }

    pub fn replace_history(&self, address: &str, history: Vec<AddressTransaction>) {
        self.state.lock().unwrap().history.insert(address.to_string(), history);
    }

    pub fn fail_history_for(&self, address: &str, error: WalletError) {
        self.state.lock().unwrap().history_errors.insert(address.to_string(), error);
    }

    pub fn set_history_delay(&self, delay: Duration) {
        self.state.lock().unwrap().history_delay = Some(delay);
    }

    pub fn queue_sweep_result(&self, result: Result<&str, WalletError>) {
        self.state.lock().unwrap().sweep_results.push_back(result.map(String::from));
    }

    pub fn set_sweep_delay(&self, delay: Duration) {
        self.state.lock().unwrap().sweep_delay = Some(delay);
    }

    pub fn broadcasts(&self) -> Vec<Broadcast> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.state.lock().unwrap().broadcasts.len()
    }
}

impl WalletCapability for FakeWallet {
    async fn new_address(&self) -> Result<NewAddress, WalletError> {
        let n = {
            let mut state = self.state.lock().unwrap();
            state.addresses_issued += 1;
            state.addresses_issued
        };
        Ok(NewAddress {
            address: format!("bitcoincash:qfakeaddress{n:04}"),
            credential: Secret::new(format!("wif-secret-{n:04}")),
        })
    }

    async fn history(&self, address: &str) -> Result<Vec<AddressTransaction>, WalletError> {
        let delay = self.state.lock().unwrap().history_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock().unwrap();
        if let Some(e) = state.history_errors.get(address) {
            return Err(e.clone());
        }
        Ok(state.history.get(address).cloned().unwrap_or_default())
    }

    async fn sweep(&self, credential: &Secret<String>, destination: &str) -> Result<String, WalletError> {
        let delay = self.state.lock().unwrap().sweep_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        let n = state.broadcasts.len() + 1;
        let result = state.sweep_results.pop_front().unwrap_or_else(|| Ok(format!("sweeptx{n:04}")));
        if let Ok(tx_hash) = &result {
            state.broadcasts.push(Broadcast {
                credential: credential.reveal().clone(),
                destination: destination.to_string(),
                tx_hash: tx_hash.clone(),
            });
        }
        result
    }
}

/// Quotes whatever rate the test has set. With no rate set, every quote fails.
#[derive(Debug, Clone)]
pub struct FixedPriceOracle {
    rate: Arc<Mutex<Option<Decimal>>>,
}

impl FixedPriceOracle {
    pub fn new(rate: Decimal) -> Self {
        Self { rate: Arc::new(Mutex::new(Some(rate))) }
    }

    pub fn set_rate(&self, rate: Decimal) {
        *self.rate.lock().unwrap() = Some(rate);
    }

    pub fn fail(&self) {
        *self.rate.lock().unwrap() = None;
    }
}

impl PriceOracle for FixedPriceOracle {
    async fn quote(&self, currency: &str) -> Result<PriceQuote, PriceOracleError> {
        let rate = *self.rate.lock().unwrap();
        rate.map(|r| PriceQuote::new(currency.to_lowercase(), r))
            .ok_or_else(|| PriceOracleError::unavailable(currency, "the price feed is down"))
    }
}
