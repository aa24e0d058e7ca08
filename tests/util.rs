// tests/util.rs
// Shared test helpers for integration tests: a scripted in-memory custody
// provider and a notifier that records alerts.
#![allow(dead_code)]

use async_trait::async_trait;
use custodial_wallet::audit::{Alert, Notifier};
use custodial_wallet::core::domain::{
    Balances, BroadcastReceipt, CandidateTransaction, FeeEstimate, ProviderKind,
    TransactionDetail, WalletDescriptor,
};
use custodial_wallet::core::errors::ProviderError;
use custodial_wallet::pricing::{RateCache, RateTable};
use custodial_wallet::providers::{Capabilities, CustodyProvider, SendOutcome, SendRequest};
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use std::collections::{BTreeMap, VecDeque};

pub const SETTLEMENT: &str = "2NFJnLrhsCDfG3ooW7ViqDaf1ojhNEzRhzM";

pub fn wallet() -> WalletDescriptor {
    WalletDescriptor::new(ProviderKind::Bitgo, "2MwalletId")
}

pub fn usd_rates(rate: f64) -> RateCache {
    RateCache::with_table(RateTable::from_iter(vec![("USD".to_string(), rate)]))
}

pub fn candidate(fee: u64) -> CandidateTransaction {
    CandidateTransaction {
        transaction_hex: format!("01000000{:08x}", fee),
        unspents: Vec::new(),
        fee,
        keychain_xpubs: vec!["xpub-user".to_string(), "xpub-backup".to_string()],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub recipients: BTreeMap<String, u64>,
    pub fee_per_kb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCoinsCall {
    pub address: String,
    pub amount: u64,
    pub fee: Option<u64>,
    pub passphrase: String,
}

/// Custody provider whose answers are queued up front. Every call is recorded.
pub struct FakeProvider {
    pub capabilities: Capabilities,
    pub balances: Balances,
    pub fee_estimate: Mutex<Result<FeeEstimate, ProviderError>>,
    pub candidates: Mutex<VecDeque<Result<CandidateTransaction, ProviderError>>>,
    pub create_calls: Mutex<Vec<CreateCall>>,
    pub broadcast: Mutex<Result<BroadcastReceipt, ProviderError>>,
    pub broadcasts: Mutex<Vec<String>>,
    pub details: Mutex<VecDeque<Result<TransactionDetail, ProviderError>>>,
    pub detail_calls: Mutex<u32>,
    pub send_outcomes: Mutex<VecDeque<SendOutcome>>,
    pub send_calls: Mutex<Vec<SendCoinsCall>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::ALL,
            balances: Balances::default(),
            fee_estimate: Mutex::new(Ok(FeeEstimate { fee_per_kb: 10000 })),
            candidates: Mutex::new(VecDeque::new()),
            create_calls: Mutex::new(Vec::new()),
            broadcast: Mutex::new(Ok(BroadcastReceipt { hash: "feedbeef".to_string() })),
            broadcasts: Mutex::new(Vec::new()),
            details: Mutex::new(VecDeque::new()),
            detail_calls: Mutex::new(0),
            send_outcomes: Mutex::new(VecDeque::new()),
            send_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeProvider {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balances: Balances { balance, spendable: balance, confirmed: balance, unconfirmed: 0 },
            ..Self::default()
        }
    }

    pub fn fee_per_kb(self, fee_per_kb: u64) -> Self {
        *self.fee_estimate.lock() = Ok(FeeEstimate { fee_per_kb });
        self
    }

    pub fn candidates(self, fees: &[u64]) -> Self {
        self.candidates.lock().extend(fees.iter().map(|fee| Ok(candidate(*fee))));
        self
    }

    pub fn push_candidate(&self, result: Result<CandidateTransaction, ProviderError>) {
        self.candidates.lock().push_back(result);
    }

    pub fn push_detail(&self, result: Result<TransactionDetail, ProviderError>) {
        self.details.lock().push_back(result);
    }

    pub fn push_send(&self, outcome: SendOutcome) {
        self.send_outcomes.lock().push_back(outcome);
    }

    pub fn create_calls(&self) -> Vec<CreateCall> {
        self.create_calls.lock().clone()
    }

    pub fn send_calls(&self) -> Vec<SendCoinsCall> {
        self.send_calls.lock().clone()
    }

    pub fn detail_calls(&self) -> u32 {
        *self.detail_calls.lock()
    }
}

#[async_trait]
impl CustodyProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bitgo
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn settlement_address(&self) -> &str {
        SETTLEMENT
    }

    async fn balances(&self, _wallet: &WalletDescriptor) -> Result<Balances, ProviderError> {
        Ok(self.balances)
    }

    async fn estimate_fee(&self, num_blocks: u32) -> Result<FeeEstimate, ProviderError> {
        assert_eq!(num_blocks, 6, "fee oracle must target 6 blocks");
        self.fee_estimate.lock().clone()
    }

    async fn create_transaction(
        &self,
        _wallet: &WalletDescriptor,
        recipients: &BTreeMap<String, u64>,
        fee_per_kb: u64,
    ) -> Result<CandidateTransaction, ProviderError> {
        self.create_calls.lock().push(CreateCall { recipients: recipients.clone(), fee_per_kb });
        self.candidates
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Http("no scripted candidate".to_string())))
    }

    async fn send_transaction(
        &self,
        _wallet: &WalletDescriptor,
        signed_hex: &str,
    ) -> Result<BroadcastReceipt, ProviderError> {
        self.broadcasts.lock().push(signed_hex.to_string());
        self.broadcast.lock().clone()
    }

    async fn transaction_detail(&self, _hash: &str) -> Result<TransactionDetail, ProviderError> {
        *self.detail_calls.lock() += 1;
        self.details
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Status { status: 404, message: "not found".to_string() }))
    }

    async fn send_coins(&self, _wallet: &WalletDescriptor, request: &SendRequest) -> SendOutcome {
        self.send_calls.lock().push(SendCoinsCall {
            address: request.address.clone(),
            amount: request.amount,
            fee: request.fee,
            passphrase: request.passphrase.expose_secret().clone(),
        });
        self.send_outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| SendOutcome::Failed(ProviderError::Http("no scripted outcome".to_string())))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<Alert>>,
}

impl RecordingNotifier {
    pub fn texts(&self) -> Vec<String> {
        self.alerts.lock().iter().map(|a| a.text().to_string()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }
}
