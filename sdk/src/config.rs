use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use url::Url;

use crate::{
    chain::ChainDescriptor,
    error::ConfigError,
    validators::{validate_address, validate_chain_id, validate_url, validate_wallet_private_key},
};

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` means no wallet is available; connecting will fail.
    pub wallet_private_key: Option<PrivateKeySigner>,
    pub contract_address: Address,
    /// Target chain. A configured HTTP RPC URL is placed first in its
    /// `rpc_urls`.
    pub chain: ChainDescriptor,
}

pub struct ConfigBuilder {
    ethereum_http_rpc_url: Option<String>,
    wallet_private_key: Option<String>,
    contract_address: Option<String>,
    chain_id: Option<String>,
    chain: ChainDescriptor,
}

impl ConfigBuilder {
    fn empty() -> Self {
        Self {
            ethereum_http_rpc_url: None,
            wallet_private_key: None,
            contract_address: None,
            chain_id: None,
            chain: ChainDescriptor::default(),
        }
    }

    /// Overrides the chain's own RPC endpoints for this client.
    pub fn ethereum_http_rpc_url(mut self, ethereum_http_rpc_url: String) -> Self {
        self.ethereum_http_rpc_url = Some(ethereum_http_rpc_url);
        self
    }

    pub fn wallet_private_key(mut self, wallet_private_key: String) -> Self {
        self.wallet_private_key = Some(wallet_private_key);
        self
    }

    pub fn contract_address(mut self, contract_address: String) -> Self {
        self.contract_address = Some(contract_address);
        self
    }

    pub fn chain(mut self, chain: ChainDescriptor) -> Self {
        self.chain = chain;
        self
    }

    /// Keeps the rest of the chain descriptor and only replaces its id.
    /// Accepts hex (`0x7a69`) or decimal.
    pub fn chain_id(mut self, chain_id: String) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn from_env(mut self) -> Self {
        if let Ok(v) = std::env::var("SMART_WILL_ETHEREUM_HTTP_RPC_URL") {
            self = self.ethereum_http_rpc_url(v);
        }
        if let Ok(v) = std::env::var("SMART_WILL_WALLET_PRIVATE_KEY") {
            self = self.wallet_private_key(v);
        }
        if let Ok(v) = std::env::var("SMART_WILL_CONTRACT_ADDRESS") {
            self = self.contract_address(v);
        }
        if let Ok(v) = std::env::var("SMART_WILL_CHAIN_ID") {
            self = self.chain_id(v);
        }
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let contract_address = Self::required(self.contract_address, "contract_address")?;
        let contract_address = validate_address(&contract_address)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let wallet_private_key = Self::optional(
            self.wallet_private_key,
            validate_wallet_private_key,
            "wallet_private_key",
        )?;
        let ethereum_http_rpc_url = Self::optional(
            self.ethereum_http_rpc_url,
            validate_url,
            "ethereum_http_rpc_url",
        )?;
        let chain_id = Self::optional(self.chain_id, validate_chain_id, "chain_id")?;

        let mut chain = self.chain;
        if let Some(chain_id) = chain_id {
            chain.chain_id = chain_id;
        }
        if let Some(url) = ethereum_http_rpc_url {
            let url = url.to_string();
            chain.rpc_urls.retain(|existing| *existing != url);
            chain.rpc_urls.insert(0, url);
        }
        if chain.http_rpc_url().is_none() {
            return Err(ConfigError::Missing("ethereum_http_rpc_url".into()));
        }

        Ok(Config {
            wallet_private_key,
            contract_address,
            chain,
        })
    }

    fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
        value.ok_or_else(|| ConfigError::Missing(field.to_string()))
    }

    fn optional<T>(
        value: Option<String>,
        parser: impl FnOnce(&str) -> anyhow::Result<T>,
        field: &str,
    ) -> Result<Option<T>, ConfigError> {
        match value.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parser(raw)
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue(format!("{field}: {e}"))),
            _ => Ok(None),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::EDU_CHAIN_TESTNET_ID;
    use serial_test::serial;

    const VALID_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const VALID_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const VALID_ETH_RPC_URL: &str = "http://localhost:8545/";

    #[test]
    fn test_default_builder() {
        let builder = ConfigBuilder::default();
        assert!(builder.wallet_private_key.is_none());
        assert!(builder.ethereum_http_rpc_url.is_none());
        assert!(builder.contract_address.is_none());
        assert_eq!(builder.chain.chain_id, EDU_CHAIN_TESTNET_ID);
    }

    #[test]
    fn test_build_with_required_fields_only() {
        let config = ConfigBuilder::default()
            .contract_address(VALID_ADDRESS.to_string())
            .build();

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.contract_address.to_string(), VALID_ADDRESS);
        assert!(config.wallet_private_key.is_none());
        assert_eq!(config.chain, ChainDescriptor::edu_chain_testnet());
    }

    #[test]
    fn test_build_with_all_fields() {
        let config = ConfigBuilder::default()
            .wallet_private_key(VALID_PRIVATE_KEY.to_string())
            .ethereum_http_rpc_url(VALID_ETH_RPC_URL.to_string())
            .contract_address(VALID_ADDRESS.to_string())
            .chain_id("0x7a69".to_string())
            .build();

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(
            config.wallet_private_key.map(|k| k.address()),
            Some(
                validate_wallet_private_key(VALID_PRIVATE_KEY)
                    .expect("Invalid private key")
                    .address()
            )
        );
        assert_eq!(config.chain.chain_id, 31337);
        assert_eq!(config.chain.http_rpc_url(), Some(VALID_ETH_RPC_URL));
    }

    #[test]
    fn test_build_missing_contract_address() {
        let config = ConfigBuilder::default()
            .wallet_private_key(VALID_PRIVATE_KEY.to_string())
            .build();

        assert!(config.is_err());
        match config.unwrap_err() {
            ConfigError::Missing(field) => assert_eq!(field, "contract_address"),
            _ => panic!("Expected Missing error"),
        }
    }

    #[test]
    fn test_build_invalid_wallet_private_key() {
        let config = ConfigBuilder::default()
            .contract_address(VALID_ADDRESS.to_string())
            .wallet_private_key("not-a-valid-key".to_string())
            .build();

        assert!(config.is_err());
        match config.unwrap_err() {
            ConfigError::InvalidValue(msg) => assert!(msg.contains("invalid private key")),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_build_invalid_ethereum_http_rpc_url() {
        let config = ConfigBuilder::default()
            .contract_address(VALID_ADDRESS.to_string())
            .ethereum_http_rpc_url("not-a-valid-url".to_string())
            .build();

        assert!(config.is_err());
        match config.unwrap_err() {
            ConfigError::InvalidValue(msg) => assert!(msg.contains("invalid URL")),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_build_invalid_contract_address() {
        let config = ConfigBuilder::default()
            .contract_address("not-a-valid-address".to_string())
            .build();

        assert!(config.is_err());
        match config.unwrap_err() {
            ConfigError::InvalidValue(msg) => assert!(msg.contains("invalid address")),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_build_chain_without_http_endpoint() {
        let mut chain = ChainDescriptor::edu_chain_testnet();
        chain.rpc_urls = vec!["wss://open-campus-codex-sepolia.drpc.org".into()];

        let config = ConfigBuilder::default()
            .contract_address(VALID_ADDRESS.to_string())
            .chain(chain)
            .build();

        match config.unwrap_err() {
            ConfigError::Missing(field) => assert_eq!(field, "ethereum_http_rpc_url"),
            _ => panic!("Expected Missing error"),
        }
    }

    #[test]
    #[serial]
    fn test_from_env_with_all_vars() {
        unsafe {
            std::env::set_var("SMART_WILL_ETHEREUM_HTTP_RPC_URL", VALID_ETH_RPC_URL);
            std::env::set_var("SMART_WILL_WALLET_PRIVATE_KEY", VALID_PRIVATE_KEY);
            std::env::set_var("SMART_WILL_CONTRACT_ADDRESS", VALID_ADDRESS);
            std::env::set_var("SMART_WILL_CHAIN_ID", "31337");
        }

        let config = ConfigBuilder::default().from_env().build();

        // Clean up
        unsafe {
            std::env::remove_var("SMART_WILL_ETHEREUM_HTTP_RPC_URL");
            std::env::remove_var("SMART_WILL_WALLET_PRIVATE_KEY");
            std::env::remove_var("SMART_WILL_CONTRACT_ADDRESS");
            std::env::remove_var("SMART_WILL_CHAIN_ID");
        }

        assert!(config.is_ok());
        let config = config.unwrap();
        assert!(config.wallet_private_key.is_some());
        assert_eq!(config.contract_address.to_string(), VALID_ADDRESS);
        assert_eq!(config.chain.chain_id, 31337);
        assert_eq!(config.chain.http_rpc_url(), Some(VALID_ETH_RPC_URL));
    }

    #[test]
    #[serial]
    fn test_from_env_override() {
        unsafe {
            std::env::set_var("SMART_WILL_CONTRACT_ADDRESS", VALID_ADDRESS);
        }

        let config = ConfigBuilder::default()
            .contract_address("0x0000000000000000000000000000000000000001".to_string())
            .from_env()
            .build();

        // Clean up
        unsafe {
            std::env::remove_var("SMART_WILL_CONTRACT_ADDRESS");
        }

        assert!(config.is_ok());
        // from_env should override the earlier value
        assert_eq!(config.unwrap().contract_address.to_string(), VALID_ADDRESS);
    }
}
