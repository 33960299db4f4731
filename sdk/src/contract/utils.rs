use alloy::primitives::U256;

use crate::{
    client::model::{BeneficiaryWill, MilestoneRef},
    contract::SmartWill,
};

/// Timestamps and durations come back as `uint256`; anything past `u64::MAX`
/// seconds is treated as "forever".
pub fn secs(value: U256) -> u64 {
    value.saturating_to()
}

pub fn beneficiary_wills(ret: SmartWill::getNormalWillAsBeneficiaryReturn) -> Vec<BeneficiaryWill> {
    ret.owners
        .into_iter()
        .zip(ret.amounts)
        .map(|(owner, amount)| BeneficiaryWill { owner, amount })
        .collect()
}

pub fn milestone_refs(ret: SmartWill::getMilestoneWillsAsBeneficiaryReturn) -> Vec<MilestoneRef> {
    ret.owners
        .into_iter()
        .zip(ret.willIndexes)
        .zip(ret.releaseIndexes)
        .zip(ret.releaseAmounts)
        .map(
            |(((owner, will_index), release_index), amount)| MilestoneRef {
                owner,
                will_index,
                release_index,
                amount,
            },
        )
        .collect()
}
