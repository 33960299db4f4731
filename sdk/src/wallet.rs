use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, MutexGuard},
};

use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::TransportError,
};
use async_trait::async_trait;
use log::{debug, info};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use url::Url;

use crate::chain::{ChainDescriptor, parse_hex_chain_id};

/// Where users are sent when no wallet is available.
pub const WALLET_INSTALL_URL: &str = "https://metamask.io/download.html";

/// Error object returned by an EIP-1193 style wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub const USER_REJECTED: i64 = 4001;
    pub const DISCONNECTED: i64 = 4900;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

impl fmt::Display for ProviderRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ProviderRpcError {}

impl From<TransportError> for ProviderRpcError {
    fn from(e: TransportError) -> Self {
        match e.as_error_resp() {
            Some(payload) => Self::new(payload.code, payload.message.to_string()),
            None => Self::new(Self::INTERNAL, e.to_string()),
        }
    }
}

/// The wallet seam: account access, chain selection and a signer for
/// contract calls.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// EIP-1193 `request({ method, params })`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;

    /// A freshly built provider that signs with the wallet's account on the
    /// active chain.
    async fn signer(&self) -> Result<DynProvider, ProviderRpcError>;

    /// Emits the new chain id every time the active chain changes.
    fn chain_changed(&self) -> broadcast::Receiver<u64>;
}

#[derive(Default)]
struct Networks {
    known: HashMap<u64, Url>,
    active: Option<u64>,
}

/// Key-backed wallet that behaves like an injected browser wallet: it only
/// knows the chains it has been told about and keeps one of them selected.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    networks: Mutex<Networks>,
    chain_tx: broadcast::Sender<u64>,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        let (chain_tx, _) = broadcast::channel(16);
        Self {
            signer,
            networks: Mutex::new(Networks::default()),
            chain_tx,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn active_chain(&self) -> Option<u64> {
        self.networks().active
    }

    fn networks(&self) -> MutexGuard<'_, Networks> {
        self.networks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn active_endpoint(&self) -> Result<(u64, Url), ProviderRpcError> {
        let networks = self.networks();
        networks
            .active
            .and_then(|id| networks.known.get(&id).map(|url| (id, url.clone())))
            .ok_or_else(|| {
                ProviderRpcError::new(
                    ProviderRpcError::DISCONNECTED,
                    "wallet is not connected to any chain",
                )
            })
    }

    fn activate(&self, chain_id: u64) -> Result<(), ProviderRpcError> {
        let changed = {
            let mut networks = self.networks();
            if !networks.known.contains_key(&chain_id) {
                return Err(ProviderRpcError::new(
                    ProviderRpcError::UNRECOGNIZED_CHAIN,
                    format!("unrecognized chain id {chain_id:#x}"),
                ));
            }
            networks.active.replace(chain_id) != Some(chain_id)
        };

        if changed {
            info!("wallet switched to chain {chain_id:#x}");
            // No receivers is fine.
            let _ = self.chain_tx.send(chain_id);
        }
        Ok(())
    }

    fn switch_chain(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let raw = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderRpcError::new(ProviderRpcError::INVALID_PARAMS, "missing chainId")
            })?;
        let chain_id = parse_hex_chain_id(raw)
            .map_err(|e| ProviderRpcError::new(ProviderRpcError::INVALID_PARAMS, e))?;

        self.activate(chain_id)?;
        Ok(Value::Null)
    }

    fn add_chain(&self, params: Value) -> Result<Value, ProviderRpcError> {
        let descriptor: ChainDescriptor = params
            .get(0)
            .cloned()
            .ok_or_else(|| {
                ProviderRpcError::new(ProviderRpcError::INVALID_PARAMS, "missing chain descriptor")
            })
            .and_then(|raw| {
                serde_json::from_value(raw).map_err(|e| {
                    ProviderRpcError::new(ProviderRpcError::INVALID_PARAMS, e.to_string())
                })
            })?;

        let url = descriptor
            .http_rpc_url()
            .ok_or_else(|| {
                ProviderRpcError::new(
                    ProviderRpcError::INVALID_PARAMS,
                    format!("{} has no HTTP RPC endpoint", descriptor.chain_name),
                )
            })
            .and_then(|raw| {
                Url::parse(raw).map_err(|e| {
                    ProviderRpcError::new(ProviderRpcError::INVALID_PARAMS, e.to_string())
                })
            })?;

        info!(
            "wallet added chain {} ({:#x}) via {url}",
            descriptor.chain_name, descriptor.chain_id
        );
        self.networks().known.insert(descriptor.chain_id, url);
        self.activate(descriptor.chain_id)?;
        Ok(Value::Null)
    }

    async fn forward(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        let (_, url) = self.active_endpoint()?;
        let provider = ProviderBuilder::new().connect(url.as_str()).await?;
        let result = provider
            .raw_request::<Value, Value>(method.to_owned().into(), params)
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        debug!("wallet request: {method}");
        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!([self.address()])),
            "eth_chainId" => self
                .active_endpoint()
                .map(|(id, _)| Value::String(format!("{id:#x}"))),
            "wallet_switchEthereumChain" => self.switch_chain(&params),
            "wallet_addEthereumChain" => self.add_chain(params),
            _ => self.forward(method, params).await,
        }
    }

    async fn signer(&self) -> Result<DynProvider, ProviderRpcError> {
        let (_, url) = self.active_endpoint()?;
        let provider = ProviderBuilder::new()
            .wallet(self.signer.clone())
            .connect(url.as_str())
            .await?
            .erased();
        Ok(provider)
    }

    fn chain_changed(&self) -> broadcast::Receiver<u64> {
        self.chain_tx.subscribe()
    }
}
