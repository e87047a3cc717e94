//! JSON-RPC over HTTP for name lookups

use std::cell::Cell;

use async_trait::async_trait;
use gloo_net::http::Request;
use lib_connect::{IdentityError, RpcTransport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

pub struct HttpRpc {
    url: String,
    next_id: Cell<u64>,
}

impl HttpRpc {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            next_id: Cell::new(1),
        }
    }
}

#[async_trait(?Send)]
impl RpcTransport for HttpRpc {
    async fn call(&self, method: &str, params: Value) -> Result<Value, IdentityError> {
        let id = self.next_id.replace(self.next_id.get() + 1);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = Request::post(&self.url)
            .json(&body)
            .map_err(|e| IdentityError::Rpc(e.to_string()))?
            .send()
            .await
            .map_err(|e| IdentityError::Rpc(e.to_string()))?;

        if !response.ok() {
            return Err(IdentityError::Rpc(format!("HTTP {} from {}", response.status(), self.url)));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;

        match (response.result, response.error) {
            (_, Some(error)) => Err(IdentityError::Rpc(format!("{} ({})", error.message, error.code))),
            (Some(result), None) => Ok(result),
            (None, None) => Err(IdentityError::Decode(format!("{method}: empty response"))),
        }
    }
}
