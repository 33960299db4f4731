use serde::{Deserialize, Serialize, Serializer};

/// EDU Chain Testnet (656476).
pub const EDU_CHAIN_TESTNET_ID: u64 = 0xa045c;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to add and select a network, in the shape of a
/// `wallet_addEthereumChain` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    #[serde(serialize_with = "hex_chain_id", deserialize_with = "parse_chain_id")]
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl ChainDescriptor {
    pub fn edu_chain_testnet() -> Self {
        Self {
            chain_id: EDU_CHAIN_TESTNET_ID,
            chain_name: "EDU Chain Testnet".into(),
            native_currency: NativeCurrency {
                name: "EDU".into(),
                symbol: "EDU".into(),
                decimals: 18,
            },
            rpc_urls: vec![
                "https://open-campus-codex-sepolia.drpc.org".into(),
                "wss://open-campus-codex-sepolia.drpc.org".into(),
            ],
            block_explorer_urls: vec!["https://edu-chain-testnet.blockscout.com/".into()],
        }
    }

    pub fn hex_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// First endpoint a plain HTTP client can talk to.
    pub fn http_rpc_url(&self) -> Option<&str> {
        self.rpc_urls
            .iter()
            .map(String::as_str)
            .find(|url| url.starts_with("http://") || url.starts_with("https://"))
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.block_explorer_urls
            .first()
            .map(|base| format!("{}/tx/{tx_hash}", base.trim_end_matches('/')))
    }
}

impl Default for ChainDescriptor {
    fn default() -> Self {
        Self::edu_chain_testnet()
    }
}

fn hex_chain_id<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{id:#x}"))
}

fn parse_chain_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_hex_chain_id(&raw).map_err(serde::de::Error::custom)
}

/// Accepts both `0x`-prefixed hex (what wallets send) and plain decimal.
pub fn parse_hex_chain_id(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("invalid chain id {raw:?}: {e}"))
}
