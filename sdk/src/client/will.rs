use alloy::{
    primitives::{Address, TxHash, U256},
    rpc::types::TransactionReceipt,
};
use log::{debug, warn};

use crate::{
    client::{
        ClientCtx, Operation,
        model::{BeneficiaryWill, ClaimableEntry, WillRecord},
    },
    contract::utils::beneficiary_wills,
    error::WillError,
    util::parse_amount,
};

/// Normal wills: one per owner, one beneficiary, released after a period of
/// owner inactivity.
#[derive(Clone)]
pub struct WillClient {
    ctx: ClientCtx,
}

impl WillClient {
    pub(super) fn new(ctx: ClientCtx) -> Self {
        Self { ctx }
    }

    /// Creates the caller's will and funds it.
    ///
    /// ### Arguments
    ///
    /// * `beneficiary` - Who may claim once the wait has elapsed
    /// * `description` - Free text stored on-chain
    /// * `amount` - Initial principal in display units, e.g. `"0.5"`
    /// * `claim_wait_secs` - Inactivity period before a claim is allowed
    /// * `on_hash` - Called as soon as the transaction hash is known
    pub async fn create_will<F>(
        &self,
        beneficiary: Address,
        description: String,
        amount: &str,
        claim_wait_secs: u64,
        on_hash: F,
    ) -> Result<TransactionReceipt, WillError>
    where
        F: FnOnce(TxHash) + Send + 'static,
    {
        let value = match parse_amount(amount) {
            Ok(value) => value,
            Err(err) => {
                let err = WillError::from(err);
                self.ctx
                    .session()
                    .record_error(Operation::CreateWill.user_message(&err));
                return Err(err);
            }
        };

        self.ctx
            .transact(
                Operation::CreateWill,
                Some(Box::new(on_hash)),
                |contract, _| async move {
                    contract
                        .createNormalWill(beneficiary, description, U256::from(claim_wait_secs))
                        .value(value)
                        .send()
                        .await
                },
            )
            .await
    }

    pub async fn get_will(&self, owner: Address) -> Result<WillRecord, WillError> {
        self.ctx
            .run(Operation::GetWill, |contract, _| async move {
                let will = contract.normalWills(owner).call().await?;
                Ok(will.into())
            })
            .await
    }

    /// Whether `owner` has a will, usually the connected account. Any
    /// failure, including not being connected, reads as `false`.
    pub async fn has_will(&self, owner: Address) -> bool {
        let lookup = async {
            self.ctx.require_session().await?;
            let contract = self.ctx.contract().await?;
            let exists = contract.hasNormalWill(owner).call().await?;
            Ok::<_, WillError>(exists)
        };

        match lookup.await {
            Ok(exists) => exists,
            Err(err) => {
                debug!("will existence check failed: {err}");
                false
            }
        }
    }

    /// Resets the inactivity clock of the caller's will.
    pub async fn ping(&self) -> Result<TransactionReceipt, WillError> {
        self.ctx
            .transact(Operation::Ping, None, |contract, _| async move {
                contract.ping().send().await
            })
            .await
    }

    /// Adds `amount` (display units) to the caller's will.
    pub async fn deposit(&self, amount: &str) -> Result<TransactionReceipt, WillError> {
        let value = match parse_amount(amount) {
            Ok(value) => value,
            Err(err) => {
                let err = WillError::from(err);
                self.ctx
                    .session()
                    .record_error(Operation::Deposit.user_message(&err));
                return Err(err);
            }
        };

        self.ctx
            .transact(Operation::Deposit, None, |contract, _| async move {
                contract.deposit().value(value).send().await
            })
            .await
    }

    /// Wills naming the connected account as beneficiary. Only owner and
    /// amount are listed; use [`WillClient::get_will`] or
    /// [`WillClient::claimables`] for details.
    pub async fn wills_as_beneficiary(&self) -> Result<Vec<BeneficiaryWill>, WillError> {
        self.ctx
            .run(
                Operation::ListBeneficiaryWills,
                |contract, account| async move {
                    let listed = contract.getNormalWillAsBeneficiary(account).call().await?;
                    Ok(beneficiary_wills(listed))
                },
            )
            .await
    }

    /// The beneficiary listing joined with each owner's will.
    pub async fn claimables(&self) -> Result<Vec<ClaimableEntry>, WillError> {
        self.ctx
            .run(
                Operation::ListBeneficiaryWills,
                |contract, account| async move {
                    let listed =
                        beneficiary_wills(contract.getNormalWillAsBeneficiary(account).call().await?);

                    let mut entries = Vec::with_capacity(listed.len());
                    for will in listed {
                        let detail = match contract.normalWills(will.owner).call().await {
                            Ok(detail) => Some(WillRecord::from(detail)),
                            Err(err) => {
                                warn!("failed to load will of {}: {err}", will.owner);
                                None
                            }
                        };
                        entries.push(ClaimableEntry::from_listing(will, detail));
                    }
                    Ok(entries)
                },
            )
            .await
    }

    pub async fn claim_will(&self, owner: Address) -> Result<TransactionReceipt, WillError> {
        self.ctx
            .transact(Operation::ClaimWill, None, |contract, _| async move {
                contract.claimNormalWill(owner).send().await
            })
            .await
    }
}
