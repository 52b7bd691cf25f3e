//! Request descriptors for the REST routes used by [`crate::Lnd`].

use serde_json::json;

use crate::transport::{Params, RpcRequest};

/// Server-side payment timeout sent with every `v2/router/send` request.
pub const PAY_TIMEOUT_SECONDS: u32 = 60;

fn object(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Params::new(),
    }
}

#[must_use]
pub fn get_info() -> RpcRequest {
    RpcRequest::get("v1/getinfo")
}

#[must_use]
pub fn create_invoice(value: i64, memo: &str) -> RpcRequest {
    RpcRequest::post("v1/invoices").with_params(object(json!({
        "value": value,
        "memo": memo,
    })))
}

#[must_use]
pub fn list_invoices() -> RpcRequest {
    RpcRequest::get("v1/invoices")
}

#[must_use]
pub fn pay_invoice(invoice: &str, fee_limit_msat: f64) -> RpcRequest {
    RpcRequest::post("v2/router/send").with_params(object(json!({
        "timeout_seconds": PAY_TIMEOUT_SECONDS,
        "payment_request": invoice,
        "fee_limit_msat": fee_limit_msat,
    })))
}

#[must_use]
pub fn balance_channel() -> RpcRequest {
    RpcRequest::get("v1/balance/channels")
}

/// The invoice is embedded in the path as-is; callers must pass URL-safe strings.
#[must_use]
pub fn decode_invoice(invoice: &str) -> RpcRequest {
    RpcRequest::get(format!("v1/payreq/{invoice}"))
}

#[must_use]
pub fn invoices_subscribe() -> RpcRequest {
    RpcRequest::get("v1/invoices/subscribe")
}
