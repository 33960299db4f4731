use alloy::contract as alloy_contract;
use alloy::primitives::Bytes;
use alloy::sol_types::decode_revert_reason;
use thiserror::Error;

use crate::wallet::ProviderRpcError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    #[error("missing config: {0}")]
    Missing(String),
}

#[derive(Error, Debug)]
pub enum ChainSwitchError {
    #[error("no wallet provider available")]
    ProviderMissing,
    #[error("failed to switch to {chain}: {source}")]
    Switch {
        chain: String,
        #[source]
        source: ProviderRpcError,
    },
    #[error("failed to add {chain} to the wallet: {source}")]
    Add {
        chain: String,
        #[source]
        source: ProviderRpcError,
    },
}

impl ChainSwitchError {
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderMissing => "A wallet provider is required to use this app.".into(),
            Self::Switch { chain, .. } => format!("Failed to switch to {chain}. Please try again."),
            Self::Add { chain, .. } => {
                format!("Failed to add {chain} to the wallet. Please try again.")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ContractCallError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("unknown revert (selector {selector:#x})")]
    UnknownRevert { selector: u32, data: Vec<u8> },
    #[error("provider/transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Description must be at least {min} characters long")]
    DescriptionTooShort { min: usize },
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Amount must be greater than zero")]
    AmountNotPositive,
    #[error("Invalid {field} address")]
    InvalidAddress { field: &'static str },
    #[error("Claim wait time must be at least {min} seconds")]
    WaitTooShort { min: u64 },
    #[error("Please confirm all conditions before proceeding")]
    Unconfirmed,
    #[error("Insufficient balance. You need {required} but have {available}")]
    InsufficientBalance { required: String, available: String },
    #[error("At least one milestone is required")]
    NoMilestones,
    #[error("Milestone fields must all have the same length")]
    MismatchedMilestones,
    #[error("Total percentage must equal 100% (got {0}%)")]
    PercentageSum(u64),
}

#[derive(Error, Debug)]
pub enum WillError {
    #[error("no wallet provider found, install one from {install_url}")]
    ProviderMissing { install_url: &'static str },
    #[error("wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("please connect your wallet first")]
    NotConnected,
    #[error("the wallet network changed while connecting, please try again")]
    ChainChanged,
    #[error(transparent)]
    ChainSwitch(#[from] ChainSwitchError),
    #[error(transparent)]
    ContractCall(#[from] ContractCallError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("wallet request failed: {0}")]
    Wallet(#[from] ProviderRpcError),
    #[error("unexpected wallet response: {0}")]
    UnexpectedResponse(String),
}

fn extract_selector_and_data(e: &alloy_contract::Error) -> Option<(u32, Vec<u8>)> {
    e.as_revert_data().map(|bytes: Bytes| {
        let data = bytes.to_vec();
        let selector = if data.len() >= 4 {
            u32::from_be_bytes([data[0], data[1], data[2], data[3]])
        } else {
            0
        };
        (selector, data)
    })
}

fn error_code(e: &alloy_contract::Error) -> Option<i64> {
    match e {
        alloy_contract::Error::TransportError(err) => err.as_error_resp().map(|p| p.code),
        _ => None,
    }
}

impl From<alloy_contract::Error> for ContractCallError {
    fn from(e: alloy_contract::Error) -> Self {
        if error_code(&e) == Some(ProviderRpcError::USER_REJECTED) {
            return Self::UserRejected;
        }

        match extract_selector_and_data(&e) {
            Some((selector, data)) => match decode_revert_reason(&data) {
                Some(reason) => Self::Reverted(reason),
                None => Self::UnknownRevert { selector, data },
            },
            None => Self::Transport(e.to_string()),
        }
    }
}

impl From<alloy_contract::Error> for WillError {
    fn from(e: alloy_contract::Error) -> Self {
        Self::ContractCall(e.into())
    }
}
