use std::{fmt, future::Future, sync::Arc};

use alloy::{
    network::Ethereum,
    primitives::{Address, TxHash},
    providers::{DynProvider, PendingTransactionBuilder},
    rpc::types::TransactionReceipt,
};
use log::{error, info};
use tokio::sync::Mutex;

use crate::{
    config::Config,
    contract::SmartWill::{self, SmartWillInstance},
    error::{ContractCallError, WillError},
    session::{PendingTransaction, SessionManager},
    wallet::{LocalWallet, WalletProvider},
};

use self::{milestone::MilestoneClient, will::WillClient};

pub mod milestone;
pub mod model;
pub mod will;

/// Invoked once with the transaction hash, before the transaction is mined.
pub type OnHash = Box<dyn FnOnce(TxHash) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    CreateWill,
    CreateMilestoneWill,
    GetWill,
    Ping,
    Deposit,
    ListBeneficiaryWills,
    ListMilestoneWills,
    ClaimWill,
    ClaimMilestoneWill,
}

impl Operation {
    fn fallback_message(self) -> Option<&'static str> {
        match self {
            Self::GetWill | Self::ListBeneficiaryWills => {
                Some("Error fetching will details. Please try again.")
            }
            Self::ListMilestoneWills => {
                Some("Error fetching milestone will details. Please try again.")
            }
            Self::Ping => Some("Error updating activity status. Please try again."),
            Self::Deposit => Some("Error making deposit. Please try again."),
            Self::CreateWill
            | Self::CreateMilestoneWill
            | Self::ClaimWill
            | Self::ClaimMilestoneWill => None,
        }
    }

    fn user_message(self, err: &WillError) -> String {
        match err {
            WillError::ChainSwitch(e) => e.user_message(),
            WillError::NotConnected
            | WillError::ProviderMissing { .. }
            | WillError::Validation(_) => err.to_string(),
            _ => match self.fallback_message() {
                Some(message) => message.to_string(),
                None => err.to_string(),
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateWill => "create will",
            Self::CreateMilestoneWill => "create milestone will",
            Self::GetWill => "get will",
            Self::Ping => "ping",
            Self::Deposit => "deposit",
            Self::ListBeneficiaryWills => "list beneficiary wills",
            Self::ListMilestoneWills => "list milestone wills",
            Self::ClaimWill => "claim will",
            Self::ClaimMilestoneWill => "claim milestone will",
        };
        f.write_str(name)
    }
}

struct Inner {
    cfg: Config,
    session: SessionManager,
    tx_lock: Mutex<()>,
}

#[derive(Clone)]
struct ClientCtx(Arc<Inner>);

impl ClientCtx {
    fn new(cfg: Config, wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        let session = SessionManager::new(wallet, cfg.chain.clone());
        Self(Arc::new(Inner {
            cfg,
            session,
            tx_lock: Mutex::new(()),
        }))
    }

    fn session(&self) -> &SessionManager {
        &self.0.session
    }

    /// The connected account, after making sure the wallet sits on the
    /// configured chain.
    async fn require_session(&self) -> Result<Address, WillError> {
        let session = self.session().session();
        let address = match session.address {
            Some(address) if session.is_connected() => address,
            _ => return Err(WillError::NotConnected),
        };

        if session.chain_id != Some(self.0.cfg.chain.chain_id) {
            self.session().switch_chain().await?;
        }
        Ok(address)
    }

    /// Built per call so a contract never outlives the signer it was bound to.
    async fn contract(&self) -> Result<SmartWillInstance<DynProvider>, WillError> {
        let provider = self.session().wallet()?.signer().await?;
        Ok(SmartWill::new(self.0.cfg.contract_address, provider))
    }

    /// Session check, fresh contract, one call, error bookkeeping.
    async fn run<T, F, Fut>(&self, op: Operation, call: F) -> Result<T, WillError>
    where
        F: FnOnce(SmartWillInstance<DynProvider>, Address) -> Fut,
        Fut: Future<Output = Result<T, WillError>>,
    {
        self.session().begin_operation();

        let result = async {
            let account = self.require_session().await?;
            let contract = self.contract().await?;
            call(contract, account).await
        }
        .await;

        if let Err(err) = &result {
            error!("{op} failed: {err}");
            self.session().record_error(op.user_message(err));
        }
        self.session().end_operation();
        result
    }

    /// Like [`ClientCtx::run`] for calls that send a transaction; only one
    /// runs at a time per client.
    async fn transact<F, Fut>(
        &self,
        op: Operation,
        on_hash: Option<OnHash>,
        send: F,
    ) -> Result<TransactionReceipt, WillError>
    where
        F: FnOnce(SmartWillInstance<DynProvider>, Address) -> Fut,
        Fut: Future<Output = Result<PendingTransactionBuilder<Ethereum>, alloy::contract::Error>>,
    {
        let _guard = self.0.tx_lock.lock().await;
        self.run(op, |contract, account| async move {
            self.session()
                .set_pending(PendingTransaction::awaiting_signature());
            let pending = send(contract, account).await?;
            self.confirm(op, pending, on_hash).await
        })
        .await
    }

    async fn confirm(
        &self,
        op: Operation,
        pending: PendingTransactionBuilder<Ethereum>,
        on_hash: Option<OnHash>,
    ) -> Result<TransactionReceipt, WillError> {
        let hash = *pending.tx_hash();
        info!("{op}: submitted {hash}");
        self.session().set_pending(PendingTransaction::submitted(hash));
        if let Some(on_hash) = on_hash {
            on_hash(hash);
        }

        let receipt = pending
            .get_receipt()
            .await
            .map_err(alloy::contract::Error::from)?;
        if !receipt.status() {
            return Err(ContractCallError::Reverted(format!("transaction {hash} reverted")).into());
        }

        info!("{op}: mined {hash} in block {:?}", receipt.block_number);
        Ok(receipt)
    }
}

#[derive(Clone)]
pub struct Client {
    ctx: ClientCtx,
    pub wills: WillClient,
    pub milestones: MilestoneClient,
}

impl Client {
    /// Uses a key-backed wallet when the config carries a private key, and
    /// no wallet at all otherwise.
    pub async fn new(cfg: Config) -> Result<Self, WillError> {
        let wallet = cfg
            .wallet_private_key
            .clone()
            .map(|key| Arc::new(LocalWallet::new(key)) as Arc<dyn WalletProvider>);
        Self::with_wallet(cfg, wallet).await
    }

    pub async fn with_wallet(
        cfg: Config,
        wallet: Option<Arc<dyn WalletProvider>>,
    ) -> Result<Self, WillError> {
        let ctx = ClientCtx::new(cfg, wallet);

        Ok(Self {
            wills: WillClient::new(ctx.clone()),
            milestones: MilestoneClient::new(ctx.clone()),
            ctx,
        })
    }

    pub fn session(&self) -> &SessionManager {
        self.ctx.session()
    }
}
