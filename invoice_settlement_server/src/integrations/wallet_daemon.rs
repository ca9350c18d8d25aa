use std::sync::Arc;

use invoice_settlement_engine::{
    helpers::SweepPlan,
    traits::{AddressTransaction, NewAddress, SpendableOutput},
    WalletCapability,
    WalletError,
};
use isp_common::Secret;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::WalletDaemonConfig;

/// REST client for the signing wallet daemon.
///
/// The daemon holds no invoice state. It derives fresh addresses, reports what it sees on chain, and signs and
/// broadcasts the sweep transactions that the engine plans.
#[derive(Clone)]
pub struct WalletDaemonClient {
    config: WalletDaemonConfig,
    client: Arc<Client>,
}

#[derive(Deserialize)]
struct AddressResponse {
    address: String,
    credential: String,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_hash: String,
}

/// The body of a sweep request. This is the only place a spending credential ever leaves the engine.
#[derive(Serialize)]
pub struct SweepRequest<'a> {
    credential: &'a str,
    #[serde(flatten)]
    plan: &'a SweepPlan,
}

impl<'a> SweepRequest<'a> {
    pub fn new(credential: &'a Secret<String>, plan: &'a SweepPlan) -> Self {
        Self { credential: credential.reveal().as_str(), plan }
    }
}

impl WalletDaemonClient {
    pub fn new(config: WalletDaemonConfig) -> Result<Self, WalletError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.token.reveal().is_empty() {
            let val = HeaderValue::from_str(&format!("Bearer {}", config.token.reveal()))
                .map_err(|e| WalletError::Unreachable(format!("Invalid wallet daemon token. {e}")))?;
            headers.insert(AUTHORIZATION, val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| WalletError::Unreachable(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.url)
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, WalletError> {
        let url = self.url(path);
        trace!("🔌️ Sending wallet daemon request: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| WalletError::Unreachable(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("🔌️ Wallet daemon request successful. {status}");
            response.json::<T>().await.map_err(|e| WalletError::InvalidResponse(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                Err(WalletError::Unreachable(format!("{status} {message}")))
            } else {
                Err(WalletError::Rejected(format!("{status} {message}")))
            }
        }
    }

    pub async fn utxos(&self, address: &str) -> Result<Vec<SpendableOutput>, WalletError> {
        let path = format!("/addresses/{address}/utxos");
        self.rest_query::<Vec<SpendableOutput>, ()>(Method::GET, &path, None).await
    }
}

impl WalletCapability for WalletDaemonClient {
    async fn new_address(&self) -> Result<NewAddress, WalletError> {
        let AddressResponse { address, credential } =
            self.rest_query::<AddressResponse, ()>(Method::POST, "/addresses", None).await?;
        debug!("🔌️ Wallet daemon issued address {address}");
        Ok(NewAddress { address, credential: Secret::new(credential) })
    }

    async fn history(&self, address: &str) -> Result<Vec<AddressTransaction>, WalletError> {
        let path = format!("/addresses/{address}/transactions");
        self.rest_query::<Vec<AddressTransaction>, ()>(Method::GET, &path, None).await
    }

    async fn sweep(&self, credential: &Secret<String>, destination: &str) -> Result<String, WalletError> {
        let credential_address = self.address_for(credential).await?;
        let utxos = self.utxos(&credential_address).await?;
        let plan = SweepPlan::new(utxos, destination, self.config.fee_rate)?;
        info!(
            "🔌️ Sweeping {} from {credential_address} to {destination} ({} inputs, fee {})",
            plan.send_amount,
            plan.inputs.len(),
            plan.fee
        );
        let request = SweepRequest::new(credential, &plan);
        let BroadcastResponse { tx_hash } =
            self.rest_query::<BroadcastResponse, _>(Method::POST, "/transactions/sweep", Some(request)).await?;
        Ok(tx_hash)
    }
}

impl WalletDaemonClient {
    /// Asks the daemon which address a credential controls, so that its unspent outputs can be listed.
    async fn address_for(&self, credential: &Secret<String>) -> Result<String, WalletError> {
        #[derive(Serialize)]
        struct Query<'a> {
            credential: &'a str,
        }
        #[derive(Deserialize)]
        struct Response {
            address: String,
        }
        let query = Query { credential: credential.reveal().as_str() };
        let Response { address } =
            self.rest_query::<Response, _>(Method::POST, "/addresses/lookup", Some(query)).await?;
        Ok(address)
    }
}
