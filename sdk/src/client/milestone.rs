use alloy::{
    primitives::{Address, U256},
    rpc::types::TransactionReceipt,
};

use crate::{
    client::{
        ClientCtx, Operation,
        model::{MilestonePlan, MilestoneRef},
    },
    contract::utils::milestone_refs,
    error::WillError,
};

/// Milestone wills: several beneficiaries, each released at its own time
/// for its own share of the total.
#[derive(Clone)]
pub struct MilestoneClient {
    ctx: ClientCtx,
}

impl MilestoneClient {
    pub(super) fn new(ctx: ClientCtx) -> Self {
        Self { ctx }
    }

    /// Sends the plan as is. Percentages and amount are the caller's
    /// responsibility, see [`crate::validators::validate_milestones`].
    pub async fn create_milestone_will(
        &self,
        plan: MilestonePlan,
    ) -> Result<TransactionReceipt, WillError> {
        let MilestonePlan {
            beneficiaries,
            release_times,
            release_percentages,
            descriptions,
            total_amount,
        } = plan;
        let release_times: Vec<U256> = release_times.into_iter().map(U256::from).collect();
        let release_percentages: Vec<U256> = release_percentages.into_iter().map(U256::from).collect();

        self.ctx
            .transact(Operation::CreateMilestoneWill, None, |contract, _| async move {
                contract
                    .createMilestoneWill(beneficiaries, release_times, release_percentages, descriptions)
                    .value(total_amount)
                    .send()
                    .await
            })
            .await
    }

    pub async fn milestone_wills_as_beneficiary(&self) -> Result<Vec<MilestoneRef>, WillError> {
        self.ctx
            .run(Operation::ListMilestoneWills, |contract, account| async move {
                let listed = contract.getMilestoneWillsAsBeneficiary(account).call().await?;
                Ok(milestone_refs(listed))
            })
            .await
    }

    pub async fn claim_milestone_will(
        &self,
        owner: Address,
        will_index: U256,
        release_index: U256,
    ) -> Result<TransactionReceipt, WillError> {
        self.ctx
            .transact(Operation::ClaimMilestoneWill, None, |contract, _| async move {
                contract
                    .claimMilestoneWill(owner, will_index, release_index)
                    .send()
                    .await
            })
            .await
    }
}
