//! BitGo custody adapter (v1 REST routes, as served by BitGo Express).

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::traits::{CustodyProvider, SendOutcome, SendRequest};
use crate::core::config::BitGoConfig;
use crate::core::domain::{
    Balances, BroadcastReceipt, CandidateTransaction, FeeEstimate, ProviderKind,
    TransactionDetail, Unspent, WalletDescriptor,
};
use crate::core::errors::ProviderError;

pub struct BitGoProvider {
    api_root: String,
    access_token: SecretString,
    settlement_address: String,
    http_client: HttpClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletResponse {
    #[serde(default)]
    balance: u64,
    #[serde(default)]
    spendable_balance: u64,
    #[serde(default)]
    confirmed_balance: u64,
    #[serde(default)]
    unconfirmed_receives: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTransactionRequest<'a> {
    recipients: &'a BTreeMap<String, u64>,
    fee_rate: u64,
}

#[derive(Debug, Deserialize)]
struct Keychain {
    xpub: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTransactionResponse {
    transaction_hex: String,
    #[serde(default)]
    unspents: Vec<Unspent>,
    fee: u64,
    #[serde(default)]
    wallet_keychains: Vec<Keychain>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendCoinsRequest<'a> {
    address: &'a str,
    amount: u64,
    wallet_passphrase: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fee: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResult {
    fee: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    result: Option<ErrorResult>,
}

/// Maps a non-success response body onto a provider error. A body whose
/// `result` names a fee becomes a fee-bearing rejection.
fn error_from_body(status: u16, body: &str) -> ProviderError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .or(parsed.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    match parsed.result.and_then(|r| r.fee) {
        Some(fee) => ProviderError::Rejected { message, fee: Some(fee) },
        None => ProviderError::Status { status, message },
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(error_from_body(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
}

impl BitGoProvider {
    pub fn new(config: &BitGoConfig) -> Self {
        info!(environment = %config.environment, "bitgo provider configured");
        Self {
            api_root: config.api_root(),
            access_token: config.access_token.clone(),
            settlement_address: config.settlement_address.clone(),
            http_client: HttpClient::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.api_root, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.access_token.expose_secret())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let response = self.authorized(self.http_client.get(self.url(path))).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let response =
            self.authorized(self.http_client.post(self.url(path))).json(body).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl CustodyProvider for BitGoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bitgo
    }

    fn settlement_address(&self) -> &str {
        &self.settlement_address
    }

    async fn balances(&self, wallet: &WalletDescriptor) -> Result<Balances, ProviderError> {
        let w: WalletResponse = self.get(&format!("wallet/{}", wallet.address)).await?;
        Ok(Balances {
            balance: w.balance,
            spendable: w.spendable_balance,
            confirmed: w.confirmed_balance,
            unconfirmed: w.unconfirmed_receives,
        })
    }

    async fn estimate_fee(&self, num_blocks: u32) -> Result<FeeEstimate, ProviderError> {
        self.get(&format!("tx/fee?numBlocks={}", num_blocks)).await
    }

    async fn create_transaction(
        &self,
        wallet: &WalletDescriptor,
        recipients: &BTreeMap<String, u64>,
        fee_per_kb: u64,
    ) -> Result<CandidateTransaction, ProviderError> {
        let request = CreateTransactionRequest { recipients, fee_rate: fee_per_kb };
        let tx: CreateTransactionResponse =
            self.post(&format!("wallet/{}/createtransaction", wallet.address), &request).await?;
        debug!(fee = tx.fee, unspents = tx.unspents.len(), "bitgo candidate transaction");

        Ok(CandidateTransaction {
            transaction_hex: tx.transaction_hex,
            unspents: tx.unspents,
            fee: tx.fee,
            keychain_xpubs: tx.wallet_keychains.into_iter().map(|k| k.xpub).collect(),
        })
    }

    async fn send_transaction(
        &self,
        _wallet: &WalletDescriptor,
        signed_hex: &str,
    ) -> Result<BroadcastReceipt, ProviderError> {
        self.post("tx/send", &serde_json::json!({ "tx": signed_hex })).await
    }

    async fn transaction_detail(&self, hash: &str) -> Result<TransactionDetail, ProviderError> {
        self.get(&format!("tx/{}", hash)).await
    }

    async fn send_coins(&self, wallet: &WalletDescriptor, request: &SendRequest) -> SendOutcome {
        let body = SendCoinsRequest {
            address: &request.address,
            amount: request.amount,
            wallet_passphrase: request.passphrase.expose_secret(),
            fee: request.fee,
        };
        match self.post(&format!("wallet/{}/sendcoins", wallet.address), &body).await {
            Ok(receipt) => SendOutcome::Accepted(receipt),
            Err(e) => SendOutcome::from_error(e),
        }
    }
}
