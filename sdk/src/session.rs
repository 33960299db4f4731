use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use log::{error, info, warn};
use serde_json::{Value, json};
use tokio::sync::{broadcast::error::RecvError, watch};

use crate::{
    chain::{ChainDescriptor, parse_hex_chain_id},
    error::{ChainSwitchError, WillError},
    wallet::{ProviderRpcError, WALLET_INSTALL_URL, WalletProvider},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Progress of the last chain switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchState {
    #[default]
    NotAttempted,
    Switching,
    Switched,
    Added,
    Failed,
}

/// How a successful [`SessionManager::switch_chain`] got to the target chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    AlreadyActive,
    Switched,
    Added,
}

/// A transaction between "asked the wallet to sign" and "mined".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: Option<TxHash>,
    pub awaiting_signature: bool,
    pub awaiting_confirmation: bool,
}

impl PendingTransaction {
    pub fn awaiting_signature() -> Self {
        Self {
            hash: None,
            awaiting_signature: true,
            awaiting_confirmation: false,
        }
    }

    pub fn submitted(hash: TxHash) -> Self {
        Self {
            hash: Some(hash),
            awaiting_signature: false,
            awaiting_confirmation: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub balance: U256,
    pub state: ConnectionState,
    pub switch_state: SwitchState,
    pub loading: bool,
    pub last_error: Option<String>,
    pub pending: Option<PendingTransaction>,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.address.is_some()
    }
}

/// Sole owner of the session state. Everything else reads snapshots through
/// [`SessionManager::session`] or [`SessionManager::subscribe`].
pub struct SessionManager {
    wallet: Option<Arc<dyn WalletProvider>>,
    chain: ChainDescriptor,
    state: Arc<watch::Sender<Session>>,
}

impl SessionManager {
    /// Must be called inside a tokio runtime when a wallet is present: the
    /// chain-change listener is spawned here, once per manager.
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>, chain: ChainDescriptor) -> Self {
        let (state, _) = watch::channel(Session::default());
        let state = Arc::new(state);

        if let Some(wallet) = &wallet {
            Self::spawn_chain_listener(wallet.as_ref(), state.clone(), chain.chain_id);
        }

        Self {
            wallet,
            chain,
            state,
        }
    }

    fn spawn_chain_listener(
        wallet: &dyn WalletProvider,
        state: Arc<watch::Sender<Session>>,
        target: u64,
    ) {
        let mut changes = wallet.chain_changed();
        tokio::spawn(async move {
            loop {
                let chain_id = match changes.recv().await {
                    Ok(chain_id) => Some(chain_id),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("missed {skipped} chain change events");
                        None
                    }
                    Err(RecvError::Closed) => break,
                };
                state.send_if_modified(|s| reset_on_chain_change(s, chain_id, target));
            }
        });
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub(crate) fn wallet(&self) -> Result<&Arc<dyn WalletProvider>, WillError> {
        self.wallet.as_ref().ok_or(WillError::ProviderMissing {
            install_url: WALLET_INSTALL_URL,
        })
    }

    /// Connects the wallet on the configured chain, switching or adding the
    /// chain first.
    pub async fn connect(&self) -> Result<Session, WillError> {
        let Some(wallet) = self.wallet.as_ref() else {
            warn!("no wallet provider available, install one from {WALLET_INSTALL_URL}");
            self.state.send_modify(|s| {
                s.state = ConnectionState::Error;
                s.loading = false;
                s.last_error = Some(format!(
                    "A wallet is required to use this app. Install one from {WALLET_INSTALL_URL}"
                ));
            });
            return Err(WillError::ProviderMissing {
                install_url: WALLET_INSTALL_URL,
            });
        };

        self.state.send_modify(|s| {
            s.state = ConnectionState::Connecting;
            s.loading = true;
            s.last_error = None;
        });

        let result = self
            .establish(wallet.as_ref())
            .await
            .and_then(|(address, chain_id, balance)| self.commit(address, chain_id, balance));

        if let Err(err) = &result {
            error!("error connecting to wallet: {err}");
            let message = match err {
                WillError::ChainSwitch(e) => e.user_message(),
                other => other.to_string(),
            };
            self.state.send_modify(|s| {
                s.state = ConnectionState::Error;
                s.loading = false;
                s.last_error = Some(message);
            });
        }

        result.map(|()| self.session())
    }

    async fn establish(&self, wallet: &dyn WalletProvider) -> Result<(Address, u64, U256), WillError> {
        self.switch_with(wallet).await?;

        let (accounts, chain_id) = tokio::try_join!(
            wallet.request("eth_requestAccounts", json!([])),
            wallet.request("eth_chainId", json!([])),
        )?;

        let address = first_account(&accounts)?;
        let chain_id = decode_chain_id(&chain_id)?;
        if chain_id != self.chain.chain_id {
            return Err(WillError::WrongNetwork {
                expected: self.chain.chain_id,
                actual: chain_id,
            });
        }

        let balance = fetch_balance(wallet, address).await?;
        Ok((address, chain_id, balance))
    }

    /// Publishes the connected session unless the chain listener reset it
    /// while `connect` was still running.
    fn commit(&self, address: Address, chain_id: u64, balance: U256) -> Result<(), WillError> {
        let mut committed = false;
        self.state.send_modify(|s| {
            if s.state == ConnectionState::Connecting {
                s.address = Some(address);
                s.chain_id = Some(chain_id);
                s.balance = balance;
                s.state = ConnectionState::Connected;
                s.loading = false;
                committed = true;
            }
        });

        if !committed {
            return Err(WillError::ChainChanged);
        }
        info!("wallet connected: {address} on chain {chain_id:#x}");
        Ok(())
    }

    /// Moves the wallet to the configured chain. A no-op when the wallet is
    /// already there.
    pub async fn switch_chain(&self) -> Result<SwitchOutcome, ChainSwitchError> {
        let Some(wallet) = self.wallet.as_ref() else {
            return Err(ChainSwitchError::ProviderMissing);
        };

        self.switch_with(wallet.as_ref()).await.inspect_err(|err| {
            error!("chain switch failed: {err}");
            self.record_error(err.user_message());
        })
    }

    async fn switch_with(&self, wallet: &dyn WalletProvider) -> Result<SwitchOutcome, ChainSwitchError> {
        let current = wallet
            .request("eth_chainId", json!([]))
            .await
            .ok()
            .and_then(|v| decode_chain_id(&v).ok());
        if current == Some(self.chain.chain_id) {
            return Ok(SwitchOutcome::AlreadyActive);
        }

        self.set_switch_state(SwitchState::Switching);
        let switched = wallet
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": self.chain.hex_id() }]),
            )
            .await;

        match switched {
            Ok(_) => {
                self.set_switch_state(SwitchState::Switched);
                Ok(SwitchOutcome::Switched)
            }
            Err(e) if e.is_unrecognized_chain() => {
                info!("{} unknown to the wallet, adding it", self.chain.chain_name);
                let added = match serde_json::to_value(&self.chain) {
                    Ok(descriptor) => {
                        wallet
                            .request("wallet_addEthereumChain", json!([descriptor]))
                            .await
                    }
                    Err(e) => Err(ProviderRpcError::new(
                        ProviderRpcError::INVALID_PARAMS,
                        format!("chain descriptor: {e}"),
                    )),
                };
                match added {
                    Ok(_) => {
                        self.set_switch_state(SwitchState::Added);
                        Ok(SwitchOutcome::Added)
                    }
                    Err(source) => {
                        self.set_switch_state(SwitchState::Failed);
                        Err(ChainSwitchError::Add {
                            chain: self.chain.chain_name.clone(),
                            source,
                        })
                    }
                }
            }
            Err(source) => {
                self.set_switch_state(SwitchState::Failed);
                Err(ChainSwitchError::Switch {
                    chain: self.chain.chain_name.clone(),
                    source,
                })
            }
        }
    }

    /// Re-reads the native balance of the connected account.
    pub async fn refresh_balance(&self) -> Result<U256, WillError> {
        let wallet = self.wallet()?;
        let address = self.session().address.ok_or(WillError::NotConnected)?;
        let balance = fetch_balance(wallet.as_ref(), address).await?;
        self.state.send_modify(|s| s.balance = balance);
        Ok(balance)
    }

    fn set_switch_state(&self, switch_state: SwitchState) {
        self.state.send_modify(|s| s.switch_state = switch_state);
    }

    pub(crate) fn record_error(&self, message: String) {
        self.state.send_modify(|s| s.last_error = Some(message));
    }

    pub(crate) fn begin_operation(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.last_error = None;
        });
    }

    pub(crate) fn end_operation(&self) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.pending = None;
        });
    }

    pub(crate) fn set_pending(&self, pending: PendingTransaction) {
        self.state.send_modify(|s| s.pending = Some(pending));
    }
}

/// Drops everything derived from the old chain. Events for the chain the
/// session already sits on leave it alone, as do events for `target` while
/// `connect` is still switching to it; `None` means events were lost.
fn reset_on_chain_change(session: &mut Session, chain_id: Option<u64>, target: u64) -> bool {
    match session.state {
        ConnectionState::Disconnected => return false,
        ConnectionState::Connecting if chain_id == Some(target) => return false,
        ConnectionState::Connecting => {}
        ConnectionState::Connected | ConnectionState::Error => {
            if chain_id.is_some() && chain_id == session.chain_id {
                return false;
            }
        }
    }

    match chain_id {
        Some(chain_id) => warn!("wallet chain changed to {chain_id:#x}, resetting session"),
        None => warn!("resetting session after lost chain change events"),
    }
    *session = Session::default();
    true
}

fn first_account(accounts: &Value) -> Result<Address, WillError> {
    accounts
        .get(0)
        .and_then(Value::as_str)
        .ok_or_else(|| WillError::UnexpectedResponse("wallet returned no accounts".into()))?
        .parse()
        .map_err(|e| WillError::UnexpectedResponse(format!("invalid account: {e}")))
}

fn decode_chain_id(value: &Value) -> Result<u64, WillError> {
    value
        .as_str()
        .ok_or_else(|| WillError::UnexpectedResponse(format!("chain id is not a string: {value}")))
        .and_then(|raw| parse_hex_chain_id(raw).map_err(WillError::UnexpectedResponse))
}

async fn fetch_balance(wallet: &dyn WalletProvider, address: Address) -> Result<U256, WillError> {
    let raw = wallet
        .request("eth_getBalance", json!([address, "latest"]))
        .await?;
    serde_json::from_value(raw).map_err(|e| WillError::UnexpectedResponse(format!("balance: {e}")))
}
