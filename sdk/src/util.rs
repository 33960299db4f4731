use alloy::primitives::{
    Address, U256,
    utils::{format_ether, parse_ether},
};

use crate::error::ValidationError;

/// Decimal display amount (`"1.5"`) to the smallest unit.
pub fn parse_amount(amount: &str) -> Result<U256, ValidationError> {
    parse_ether(amount.trim()).map_err(|_| ValidationError::InvalidAmount)
}

pub fn format_amount(amount: U256) -> String {
    format_ether(amount)
}

/// `0x1234...abcd`
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
