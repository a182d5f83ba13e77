use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const NATIVE_CURRENCY_ADDRESS: &str = "0x0";
pub const NATIVE_CURRENCY_NAME: &str = "Ether";
pub const NATIVE_CURRENCY_SYMBOL: &str = "ETH";
pub const NATIVE_CURRENCY_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chain id `{raw}`")]
pub struct ChainIdError {
    pub raw: String,
}

/// Chain identifier normalized to lowercase `0x` hex without leading zeros, so that two
/// spellings of the same number compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    pub fn parse(raw: &str) -> Result<Self, ChainIdError> {
        let trimmed = raw.trim();
        let invalid = || ChainIdError {
            raw: raw.to_string(),
        };
        let digits = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => {
                if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid());
                }
                hex.to_ascii_lowercase()
            }
            None => {
                let value = trimmed.parse::<u128>().map_err(|_| invalid())?;
                format!("{value:x}")
            }
        };
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(Self("0x0".to_string()));
        }
        Ok(Self(format!("0x{significant}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_u128(&self) -> Option<u128> {
        u128::from_str_radix(&self.0[2..], 16).ok()
    }

    /// The id read as a Cairo short string (`0x534e5f4d41494e` is `SN_MAIN`).
    pub fn short_string(&self) -> String {
        decode_short_string(&self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChainId {
    type Error = ChainIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ChainId::parse(&value)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.0
    }
}

/// Decode a felt holding ASCII text. Anything that is not printable text is returned unchanged.
pub fn decode_short_string(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(hex_digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    else {
        return trimmed.to_string();
    };
    let padded = if hex_digits.len() % 2 == 1 {
        format!("0{hex_digits}")
    } else {
        hex_digits.to_string()
    };
    let Ok(bytes) = hex::decode(&padded) else {
        return trimmed.to_string();
    };
    let text: Vec<u8> = bytes.into_iter().skip_while(|b| *b == 0).collect();
    match String::from_utf8(text) {
        Ok(decoded) if decoded.chars().all(|c| c.is_ascii_graphic() || c == ' ') => decoded,
        _ => trimmed.to_string(),
    }
}

/// Encode ASCII text as a felt for calldata. Values already written as hex pass through.
pub fn encode_short_string(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        return trimmed.to_ascii_lowercase();
    }
    if trimmed.is_empty() {
        return "0x0".to_string();
    }
    format!("0x{}", hex::encode(trimmed.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcEndpoints {
    pub http: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcUrls {
    pub default: RpcEndpoints,
    pub public: RpcEndpoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            address: NATIVE_CURRENCY_ADDRESS.to_string(),
            name: NATIVE_CURRENCY_NAME.to_string(),
            symbol: NATIVE_CURRENCY_SYMBOL.to_string(),
            decimals: NATIVE_CURRENCY_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub id: ChainId,
    pub name: String,
    pub network: String,
    pub rpc_urls: RpcUrls,
    pub native_currency: NativeCurrency,
}

impl ChainDescriptor {
    /// Describe the chain served at `rpc`, given the raw chain id it reported.
    pub fn from_rpc(raw_chain_id: &str, rpc: &str) -> Result<Self, ChainIdError> {
        let id = ChainId::parse(raw_chain_id)?;
        let endpoints = RpcEndpoints {
            http: vec![rpc.to_string()],
        };
        Ok(Self {
            name: id.short_string(),
            id,
            network: raw_chain_id.trim().to_string(),
            rpc_urls: RpcUrls {
                default: endpoints.clone(),
                public: endpoints,
            },
            native_currency: NativeCurrency::default(),
        })
    }
}

/// Keep the first descriptor seen for each chain id, preserving order.
pub fn dedup_chains(chains: impl IntoIterator<Item = ChainDescriptor>) -> Vec<ChainDescriptor> {
    let mut seen = HashSet::new();
    chains
        .into_iter()
        .filter(|chain| seen.insert(chain.id.clone()))
        .collect()
}
