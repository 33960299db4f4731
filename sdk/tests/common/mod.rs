#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use alloy::{
    primitives::TxHash,
    providers::{DynProvider, Provider, ProviderBuilder},
    transports::mock::Asserter,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use smart_will_sdk::{
    Address, ChainDescriptor, Client, ConfigBuilder, ProviderRpcError, U256, WalletProvider,
};
use tokio::sync::broadcast;

pub const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const LOCAL_CHAIN_ID: u64 = 31337;
/// Only used to satisfy config validation; contract calls go through the
/// wallet's mocked signer.
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";

pub fn local_chain() -> ChainDescriptor {
    ChainDescriptor {
        chain_id: LOCAL_CHAIN_ID,
        chain_name: "Anvil".into(),
        rpc_urls: vec![LOCAL_RPC_URL.into()],
        block_explorer_urls: vec![],
        ..ChainDescriptor::edu_chain_testnet()
    }
}

#[derive(Default)]
struct State {
    active: Option<u64>,
    known: HashSet<u64>,
    calls: Vec<String>,
    added: Option<Value>,
}

/// Scripted wallet: records every request and answers like a browser wallet.
pub struct MockWallet {
    pub account: Address,
    pub balance: U256,
    state: Mutex<State>,
    /// Code returned by `wallet_switchEthereumChain` for known chains.
    switch_error: Option<i64>,
    /// Code returned by `wallet_addEthereumChain`.
    add_error: Option<i64>,
    /// Reported by `eth_chainId` whatever the wallet was asked to do.
    stuck_on: Option<u64>,
    /// Chain the user "picks" while the balance is being fetched.
    moves_during_connect: Option<u64>,
    /// Scripted JSON-RPC responses for the signer, served in order whatever
    /// the method. An empty queue fails every call at the transport.
    pub node: Asserter,
    chain_tx: broadcast::Sender<u64>,
}

impl MockWallet {
    pub fn new() -> Self {
        let (chain_tx, _) = broadcast::channel(16);
        Self {
            account: Address::repeat_byte(0xaa),
            balance: U256::from(3_000_000_000_000_000_000u128),
            state: Mutex::new(State::default()),
            switch_error: None,
            add_error: None,
            stuck_on: None,
            moves_during_connect: None,
            node: Asserter::new(),
            chain_tx,
        }
    }

    /// Wallet already knows `chain_id` and has it selected.
    pub fn on_chain(self, chain_id: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.known.insert(chain_id);
            state.active = Some(chain_id);
        }
        self
    }

    pub fn knowing(self, chain_id: u64) -> Self {
        self.state.lock().unwrap().known.insert(chain_id);
        self
    }

    pub fn failing_switch(mut self, code: i64) -> Self {
        self.switch_error = Some(code);
        self
    }

    pub fn failing_add(mut self, code: i64) -> Self {
        self.add_error = Some(code);
        self
    }

    pub fn stuck_on(mut self, chain_id: u64) -> Self {
        self.stuck_on = Some(chain_id);
        self
    }

    pub fn moving_during_connect(mut self, chain_id: u64) -> Self {
        self.moves_during_connect = Some(chain_id);
        self
    }

    /// Parameter of the last `wallet_addEthereumChain` request.
    pub fn added_chain(&self) -> Option<ChainDescriptor> {
        let added = self.state.lock().unwrap().added.clone()?;
        serde_json::from_value(added).ok()
    }

    /// Queues the node responses for one transaction: its hash, then a
    /// receipt with the given status. The receipt is queued several times
    /// since the provider's block poller may consume some of them.
    pub fn script_transaction(&self, hash: TxHash, success: bool) {
        self.node.push_success(&hash);
        let receipt = receipt(hash, self.account, success);
        for _ in 0..8 {
            self.node.push_success(&receipt);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls().iter().any(|m| m == method)
    }

    /// Simulates the user picking another network in the wallet.
    pub fn emit_chain_changed(&self, chain_id: u64) {
        self.state.lock().unwrap().active = Some(chain_id);
        let _ = self.chain_tx.send(chain_id);
    }

    fn activate(&self, chain_id: u64) {
        let previous = self.state.lock().unwrap().active.replace(chain_id);
        if previous != Some(chain_id) {
            let _ = self.chain_tx.send(chain_id);
        }
    }

    fn requested_chain(params: &Value) -> u64 {
        let raw = params[0]["chainId"].as_str().unwrap_or_default();
        u64::from_str_radix(raw.trim_start_matches("0x"), 16).unwrap_or_default()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        self.state.lock().unwrap().calls.push(method.to_string());

        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!([self.account])),
            "eth_chainId" => {
                let active = self.state.lock().unwrap().active;
                self.stuck_on
                    .or(active)
                    .map(|id| json!(format!("{id:#x}")))
                    .ok_or_else(|| {
                        ProviderRpcError::new(ProviderRpcError::DISCONNECTED, "disconnected")
                    })
            }
            "eth_getBalance" => {
                if let Some(chain_id) = self.moves_during_connect {
                    self.emit_chain_changed(chain_id);
                    for _ in 0..5 {
                        tokio::task::yield_now().await;
                    }
                }
                Ok(json!(self.balance))
            }
            "wallet_switchEthereumChain" => {
                let chain_id = Self::requested_chain(&params);
                let known = self.state.lock().unwrap().known.contains(&chain_id);
                if !known {
                    return Err(ProviderRpcError::new(
                        ProviderRpcError::UNRECOGNIZED_CHAIN,
                        "Unrecognized chain ID",
                    ));
                }
                if let Some(code) = self.switch_error {
                    return Err(ProviderRpcError::new(code, "switch refused"));
                }
                self.activate(chain_id);
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                if let Some(code) = self.add_error {
                    return Err(ProviderRpcError::new(code, "add refused"));
                }
                let chain_id = Self::requested_chain(&params);
                {
                    let mut state = self.state.lock().unwrap();
                    state.known.insert(chain_id);
                    state.added = Some(params[0].clone());
                }
                self.activate(chain_id);
                Ok(Value::Null)
            }
            other => Err(ProviderRpcError::new(
                ProviderRpcError::INTERNAL,
                format!("unsupported method {other}"),
            )),
        }
    }

    async fn signer(&self) -> Result<DynProvider, ProviderRpcError> {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(self.node.clone());
        Ok(provider.erased())
    }

    fn chain_changed(&self) -> broadcast::Receiver<u64> {
        self.chain_tx.subscribe()
    }
}

pub async fn client_with(wallet: Option<Arc<MockWallet>>) -> anyhow::Result<Client> {
    let config = ConfigBuilder::default()
        .contract_address(CONTRACT_ADDRESS.to_string())
        .chain(local_chain())
        .build()?;

    let wallet = wallet.map(|w| w as Arc<dyn WalletProvider>);
    Ok(Client::with_wallet(config, wallet).await?)
}

fn receipt(hash: TxHash, from: Address, success: bool) -> Value {
    json!({
        "type": "0x0",
        "status": if success { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": TxHash::repeat_byte(0xbb),
        "blockNumber": "0x1",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": from,
        "to": CONTRACT_ADDRESS.to_lowercase(),
        "contractAddress": null
    })
}
