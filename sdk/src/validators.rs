use std::str::FromStr;

use alloy::{
    primitives::{Address, U256},
    signers::local::PrivateKeySigner,
};
use url::Url;

use crate::{
    client::model::MilestonePlan,
    error::ValidationError,
    util::{format_amount, parse_amount},
};

pub const MIN_DESCRIPTION_LEN: usize = 50;
pub const MIN_CLAIM_WAIT_SECS: u64 = 60;

pub fn validate_url(url: &str) -> anyhow::Result<Url> {
    Url::parse(url).map_err(|e| anyhow::anyhow!("invalid URL: {}", e))
}

pub fn validate_address(address: &str) -> anyhow::Result<Address> {
    Address::from_str(address).map_err(|e| anyhow::anyhow!("invalid address: {}", e))
}

pub fn validate_wallet_private_key(key: &str) -> anyhow::Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(key).map_err(|e| anyhow::anyhow!("invalid private key: {}", e))
}

pub fn validate_chain_id(chain_id: &str) -> anyhow::Result<u64> {
    crate::chain::parse_hex_chain_id(chain_id).map_err(|e| anyhow::anyhow!(e))
}

/// What the "create will" form collects before anything is sent.
#[derive(Debug, Clone, Default)]
pub struct SimpleWillForm {
    pub beneficiary: String,
    pub description: String,
    pub amount: String,
    pub claim_wait_secs: u64,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSimpleWill {
    pub beneficiary: Address,
    pub description: String,
    pub amount: U256,
    pub claim_wait_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MilestoneInput {
    pub beneficiary: String,
    pub release_time: u64,
    pub release_percentage: u64,
    pub description: String,
}

pub fn positive_amount(amount: &str) -> Result<U256, ValidationError> {
    let value = parse_amount(amount)?;
    if value.is_zero() {
        return Err(ValidationError::AmountNotPositive);
    }
    Ok(value)
}

pub fn owner_address(owner: &str) -> Result<Address, ValidationError> {
    parse_address(owner, "owner")
}

fn parse_address(raw: &str, field: &'static str) -> Result<Address, ValidationError> {
    Address::from_str(raw.trim()).map_err(|_| ValidationError::InvalidAddress { field })
}

/// `balance` is the connected account's balance when known; the check is
/// skipped otherwise.
pub fn validate_simple_will(
    form: &SimpleWillForm,
    balance: Option<U256>,
) -> Result<ValidSimpleWill, ValidationError> {
    if form.description.chars().count() < MIN_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooShort {
            min: MIN_DESCRIPTION_LEN,
        });
    }
    let amount = positive_amount(&form.amount)?;
    let beneficiary = parse_address(&form.beneficiary, "beneficiary")?;
    if form.claim_wait_secs < MIN_CLAIM_WAIT_SECS {
        return Err(ValidationError::WaitTooShort {
            min: MIN_CLAIM_WAIT_SECS,
        });
    }
    if !form.acknowledged {
        return Err(ValidationError::Unconfirmed);
    }
    if let Some(available) = balance.filter(|available| *available < amount) {
        return Err(ValidationError::InsufficientBalance {
            required: format_amount(amount),
            available: format_amount(available),
        });
    }

    Ok(ValidSimpleWill {
        beneficiary,
        description: form.description.clone(),
        amount,
        claim_wait_secs: form.claim_wait_secs,
    })
}

pub fn validate_milestones(
    milestones: &[MilestoneInput],
    total_amount: &str,
) -> Result<MilestonePlan, ValidationError> {
    if milestones.is_empty() {
        return Err(ValidationError::NoMilestones);
    }

    let total = milestones
        .iter()
        .map(|m| m.release_percentage)
        .fold(0u64, u64::saturating_add);
    if total != 100 {
        return Err(ValidationError::PercentageSum(total));
    }

    let total_amount = positive_amount(total_amount)?;

    let beneficiaries = milestones
        .iter()
        .map(|m| parse_address(&m.beneficiary, "beneficiary"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MilestonePlan {
        beneficiaries,
        release_times: milestones.iter().map(|m| m.release_time).collect(),
        release_percentages: milestones.iter().map(|m| m.release_percentage).collect(),
        descriptions: milestones.iter().map(|m| m.description.clone()).collect(),
        total_amount,
    })
}

/// Checks a plan built by hand rather than through [`validate_milestones`].
pub fn validate_plan(plan: &MilestonePlan) -> Result<(), ValidationError> {
    let n = plan.beneficiaries.len();
    if n == 0 {
        return Err(ValidationError::NoMilestones);
    }
    if plan.release_times.len() != n
        || plan.release_percentages.len() != n
        || plan.descriptions.len() != n
    {
        return Err(ValidationError::MismatchedMilestones);
    }
    let total = plan
        .release_percentages
        .iter()
        .copied()
        .fold(0u64, u64::saturating_add);
    if total != 100 {
        return Err(ValidationError::PercentageSum(total));
    }
    if plan.total_amount.is_zero() {
        return Err(ValidationError::AmountNotPositive);
    }
    Ok(())
}
