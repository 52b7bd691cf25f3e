//! Typed views over the JSON returned by the REST gateway.
//!
//! The gateway renders 64-bit integers as decimal strings and omits fields that
//! hold their default value, so every field here is defaulted and integers accept
//! both encodings. Obtain these with [`crate::Document::parse`].

use serde::{de, Deserialize, Deserializer, Serialize};

fn int64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(i64),
        Str(String),
    }
    match Repr::deserialize(d)? {
        Repr::Num(n) => Ok(n),
        Repr::Str(s) => s.parse().map_err(de::Error::custom),
    }
}

fn uint64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Str(String),
    }
    match Repr::deserialize(d)? {
        Repr::Num(n) => Ok(n),
        Repr::Str(s) => s.parse().map_err(de::Error::custom),
    }
}

/// `GET v1/getinfo`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub identity_pubkey: String,
    pub alias: String,
    pub version: String,
    pub num_active_channels: u32,
    pub num_pending_channels: u32,
    pub num_peers: u32,
    pub block_height: u32,
    pub block_hash: String,
    pub synced_to_chain: bool,
    pub synced_to_graph: bool,
    pub uris: Vec<String>,
}

/// `POST v1/invoices`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddInvoiceResponse {
    /// Payment hash, base64 encoded by the gateway.
    pub r_hash: String,
    pub payment_request: String,
    #[serde(deserialize_with = "uint64")]
    pub add_index: u64,
    pub payment_addr: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceState {
    #[default]
    Open,
    Settled,
    Canceled,
    Accepted,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
    pub memo: String,
    pub r_hash: String,
    #[serde(deserialize_with = "int64")]
    pub value: i64,
    #[serde(deserialize_with = "int64")]
    pub value_msat: i64,
    pub settled: bool,
    #[serde(deserialize_with = "int64")]
    pub creation_date: i64,
    #[serde(deserialize_with = "int64")]
    pub settle_date: i64,
    pub payment_request: String,
    #[serde(deserialize_with = "int64")]
    pub expiry: i64,
    #[serde(deserialize_with = "uint64")]
    pub add_index: u64,
    #[serde(deserialize_with = "uint64")]
    pub settle_index: u64,
    #[serde(deserialize_with = "int64")]
    pub amt_paid_sat: i64,
    #[serde(deserialize_with = "int64")]
    pub amt_paid_msat: i64,
    pub state: InvoiceState,
}

/// `GET v1/invoices`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListInvoicesResponse {
    pub invoices: Vec<Invoice>,
    #[serde(deserialize_with = "uint64")]
    pub last_index_offset: u64,
    #[serde(deserialize_with = "uint64")]
    pub first_index_offset: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Amount {
    #[serde(deserialize_with = "uint64")]
    pub sat: u64,
    #[serde(deserialize_with = "uint64")]
    pub msat: u64,
}

/// `GET v1/balance/channels`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelBalance {
    /// Deprecated by LND in favour of `local_balance`, still populated.
    #[serde(deserialize_with = "int64")]
    pub balance: i64,
    #[serde(deserialize_with = "int64")]
    pub pending_open_balance: i64,
    pub local_balance: Amount,
    pub remote_balance: Amount,
    pub unsettled_local_balance: Amount,
    pub unsettled_remote_balance: Amount,
    pub pending_open_local_balance: Amount,
    pub pending_open_remote_balance: Amount,
}

/// `GET v1/payreq/{invoice}`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayReq {
    pub destination: String,
    pub payment_hash: String,
    #[serde(deserialize_with = "int64")]
    pub num_satoshis: i64,
    #[serde(deserialize_with = "int64")]
    pub num_msat: i64,
    #[serde(deserialize_with = "int64")]
    pub timestamp: i64,
    #[serde(deserialize_with = "int64")]
    pub expiry: i64,
    pub description: String,
    pub description_hash: String,
    pub fallback_addr: String,
    #[serde(deserialize_with = "int64")]
    pub cltv_expiry: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    InFlight,
    Succeeded,
    Failed,
    Initiated,
    /// `UNKNOWN`, and any status this version does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

/// One update of `POST v2/router/send`, found under `result`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub payment_hash: String,
    pub payment_preimage: String,
    #[serde(deserialize_with = "int64")]
    pub value_sat: i64,
    #[serde(deserialize_with = "int64")]
    pub value_msat: i64,
    #[serde(deserialize_with = "int64")]
    pub fee_sat: i64,
    #[serde(deserialize_with = "int64")]
    pub fee_msat: i64,
    pub payment_request: String,
    pub status: PaymentStatus,
    pub failure_reason: String,
    #[serde(deserialize_with = "uint64")]
    pub payment_index: u64,
}
