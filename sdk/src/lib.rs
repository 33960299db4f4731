pub mod chain;
pub mod client;
pub mod config;
mod contract;
pub mod countdown;
pub mod error;
pub mod session;
pub mod util;
pub mod validators;
pub mod wallet;

pub use alloy::primitives::{Address, TxHash, U256};

pub use crate::error::{
    ChainSwitchError, ConfigError, ContractCallError, ValidationError, WillError,
};
pub use chain::{ChainDescriptor, NativeCurrency};
pub use client::Client;
pub use client::model::{BeneficiaryWill, ClaimableEntry, MilestonePlan, MilestoneRef, WillRecord};
pub use config::{Config, ConfigBuilder};
pub use countdown::{Countdown, CountdownTimer, WillStatus};
pub use session::{
    ConnectionState, PendingTransaction, Session, SessionManager, SwitchOutcome, SwitchState,
};
pub use wallet::{LocalWallet, ProviderRpcError, WalletProvider};
