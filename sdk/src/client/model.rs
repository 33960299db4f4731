use alloy::primitives::{Address, U256};

use crate::contract::{SmartWill, utils::secs};

/// On-chain state of a normal will, decoded from the `normalWills` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WillRecord {
    pub beneficiary: Address,
    pub amount: U256,
    pub last_activity: u64,
    pub claim_wait: u64,
    pub description: String,
    pub is_claimed: bool,
    pub created_at: u64,
}

impl WillRecord {
    /// Earliest second at which the beneficiary may claim.
    pub fn claimable_at(&self) -> u64 {
        self.last_activity.saturating_add(self.claim_wait)
    }
}

impl From<SmartWill::normalWillsReturn> for WillRecord {
    fn from(value: SmartWill::normalWillsReturn) -> Self {
        Self {
            beneficiary: value.beneficiary,
            amount: value.amount,
            last_activity: secs(value.lastPingTime),
            claim_wait: secs(value.claimWaitTime),
            description: value.description,
            is_claimed: value.isClaimed,
            created_at: secs(value.creationTime),
        }
    }
}

/// A normal will naming the caller as beneficiary, as listed by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeneficiaryWill {
    pub owner: Address,
    pub amount: U256,
}

/// One release of a milestone will naming the caller as beneficiary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneRef {
    pub owner: Address,
    pub will_index: U256,
    pub release_index: U256,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimableEntry {
    pub owner: Address,
    pub amount: U256,
    pub description: String,
    pub last_activity: u64,
    pub claim_wait: u64,
    pub beneficiary: Address,
}

impl ClaimableEntry {
    pub(crate) fn from_listing(listed: BeneficiaryWill, detail: Option<WillRecord>) -> Self {
        match detail {
            Some(will) => Self {
                owner: listed.owner,
                amount: listed.amount,
                description: will.description,
                last_activity: will.last_activity,
                claim_wait: will.claim_wait,
                beneficiary: will.beneficiary,
            },
            None => Self {
                owner: listed.owner,
                amount: listed.amount,
                description: "No description".into(),
                last_activity: 0,
                claim_wait: 0,
                beneficiary: Address::ZERO,
            },
        }
    }
}

/// Parameters of a `createMilestoneWill` call, one entry per milestone in
/// each sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestonePlan {
    pub beneficiaries: Vec<Address>,
    pub release_times: Vec<u64>,
    pub release_percentages: Vec<u64>,
    pub descriptions: Vec<String>,
    pub total_amount: U256,
}
