//! Wallet bridge reached over JSON-RPC 2.0.
//!
//! Every provider call is forwarded as a single `POST`:
//!
//! ```json
//! {"jsonrpc": "2.0", "id": 7, "method": "weil_requestAccounts", "params": []}
//! ```
//!
//! The `result` member is handed back untouched; an `error` member becomes a
//! rejection carrying its message.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use super::provider::{Capabilities, DeployMetadata, ProviderError, WalletProvider};
use crate::config::WalletRpcConfig;

const METHOD_DEPLOY: &str = "weil_deployContract";
const METHOD_EXECUTE: &str = "weil_executeContract";

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Provider that proxies to a JSON-RPC wallet bridge.
pub struct RpcProvider {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<SecretString>,
    next_id: AtomicU64,
}

impl RpcProvider {
    /// Create a provider for the configured bridge endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the HTTP client fails to build.
    pub fn new(config: &WalletRpcConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
            token: config.token.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    #[tracing::instrument(skip(self, params), fields(id))]
    async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::Span::current().record("id", id);

        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("HTTP error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("HTTP {status}")));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(error) = response.error {
            tracing::debug!(code = error.code, message = %error.message, "Wallet bridge returned an error");
            return Err(ProviderError::Rejected(error.message));
        }

        Ok(response.result)
    }
}

impl std::fmt::Debug for RpcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcProvider")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletProvider for RpcProvider {
    fn name(&self) -> &str {
        "rpc"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            request: true,
            contracts: true,
            ..Capabilities::default()
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.call(method, params).await
    }

    async fn deploy(
        &self,
        module_hex: &str,
        interface_hex: &str,
        metadata: &DeployMetadata,
    ) -> Result<Value, ProviderError> {
        self.call(METHOD_DEPLOY, json!([module_hex, interface_hex, metadata]))
            .await
    }

    async fn execute(
        &self,
        contract: &str,
        method: &str,
        args: Value,
    ) -> Result<Value, ProviderError> {
        self.call(
            METHOD_EXECUTE,
            json!({ "contract": contract, "method": method, "args": args }),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    fn provider(url: &str, token: Option<&str>) -> RpcProvider {
        RpcProvider::new(&WalletRpcConfig {
            url: Url::parse(url).unwrap(),
            token: token.map(|t| SecretString::from(t.to_string())),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_request_returns_result() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "weil_requestAccounts",
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":["abc"]}"#)
            .create_async()
            .await;

        let result = provider(&server.url(), None)
            .request("weil_requestAccounts", Value::Null)
            .await
            .unwrap();

        assert_eq!(result, json!(["abc"]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_object_is_rejection() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected"}}"#)
            .create_async()
            .await;

        let err = provider(&server.url(), None)
            .request("weil_requestAccounts", Value::Null)
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::Rejected("User rejected".to_string()));
    }

    #[tokio::test]
    async fn test_http_failure_is_transport() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(502)
            .create_async()
            .await;

        let err = provider(&server.url(), None)
            .request("weil_accounts", Value::Null)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Transport(ref msg) if msg.contains("502")));
    }

    #[tokio::test]
    async fn test_deploy_sends_artifacts_and_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer bridge-token")
            .match_body(Matcher::PartialJson(json!({
                "method": "weil_deployContract",
                "params": ["0061", "10", {"product_id": "slack", "owner": "abc"}],
            })))
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"contract_address":"c1"}}"#)
            .create_async()
            .await;

        let metadata = DeployMetadata {
            product_id: "slack".to_string(),
            name: "Slack MCP".to_string(),
            description: "Post to channels".to_string(),
            owner: "abc".to_string(),
        };
        let result = provider(&server.url(), Some("bridge-token"))
            .deploy("0061", "10", &metadata)
            .await
            .unwrap();

        assert_eq!(result["contract_address"], "c1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_params() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "weil_executeContract",
                "params": {"contract": "treasury", "method": "transfer", "args": {"amount": "5"}},
            })))
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"txn_result":"{\"Ok\":null}"}}"#)
            .create_async()
            .await;

        let result = provider(&server.url(), None)
            .execute("treasury", "transfer", json!({"amount": "5"}))
            .await
            .unwrap();

        assert_eq!(result["txn_result"], "{\"Ok\":null}");
        mock.assert_async().await;
    }
}
