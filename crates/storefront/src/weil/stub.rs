//! Hand-written capability stub for provider tests.
//!
//! Each configured response turns the matching capability on; everything
//! else is absent. Calls are recorded in order.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::provider::{Capabilities, DeployMetadata, ProviderError, WalletProvider};

type Response = Result<Value, ProviderError>;

#[derive(Default)]
pub struct StubProvider {
    enable: Option<Response>,
    connect: Option<Response>,
    requests: Option<HashMap<String, Response>>,
    get_address: Option<Response>,
    get_accounts: Option<Response>,
    address: Option<String>,
    selected_address: Option<String>,
    deploy: Option<Response>,
    execute: Option<Response>,
    calls: Mutex<Vec<String>>,
    executed: Mutex<Vec<(String, String, Value)>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enable(mut self, response: Response) -> Self {
        self.enable = Some(response);
        self
    }

    pub fn with_connect(mut self, response: Response) -> Self {
        self.connect = Some(response);
        self
    }

    pub fn with_request(mut self, method: &str, response: Response) -> Self {
        self.requests
            .get_or_insert_with(HashMap::new)
            .insert(method.to_string(), response);
        self
    }

    pub fn with_get_address(mut self, response: Response) -> Self {
        self.get_address = Some(response);
        self
    }

    pub fn with_get_accounts(mut self, response: Response) -> Self {
        self.get_accounts = Some(response);
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    pub fn with_selected_address(mut self, address: &str) -> Self {
        self.selected_address = Some(address.to_string());
        self
    }

    pub fn with_deploy(mut self, response: Response) -> Self {
        self.deploy = Some(response);
        self
    }

    pub fn with_execute(mut self, response: Response) -> Self {
        self.execute = Some(response);
        self
    }

    /// Calls made so far, e.g. `enable`, `request:weil_accounts`, `deploy`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// `(contract, method, args)` of every `execute` call.
    pub fn executed(&self) -> Vec<(String, String, Value)> {
        self.executed.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn answer(&self, call: &str, response: Option<&Response>, member: &'static str) -> Response {
        self.record(call);
        response
            .cloned()
            .unwrap_or(Err(ProviderError::Unsupported(member)))
    }
}

#[async_trait]
impl WalletProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            enable: self.enable.is_some(),
            connect: self.connect.is_some(),
            request: self.requests.is_some(),
            get_address: self.get_address.is_some(),
            get_accounts: self.get_accounts.is_some(),
            address: self.address.is_some(),
            selected_address: self.selected_address.is_some(),
            contracts: self.deploy.is_some() || self.execute.is_some(),
        }
    }

    async fn enable(&self) -> Result<Value, ProviderError> {
        self.answer("enable", self.enable.as_ref(), "enable")
    }

    async fn connect(&self) -> Result<Value, ProviderError> {
        self.answer("connect", self.connect.as_ref(), "connect")
    }

    async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderError> {
        self.record(format!("request:{method}"));
        let Some(requests) = &self.requests else {
            return Err(ProviderError::Unsupported("request"));
        };
        requests
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::Rejected(format!("unknown method {method}"))))
    }

    async fn get_address(&self) -> Result<Value, ProviderError> {
        self.answer("getAddress", self.get_address.as_ref(), "getAddress")
    }

    async fn get_accounts(&self) -> Result<Value, ProviderError> {
        self.answer("getAccounts", self.get_accounts.as_ref(), "getAccounts")
    }

    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    fn selected_address(&self) -> Option<String> {
        self.selected_address.clone()
    }

    async fn deploy(
        &self,
        _module_hex: &str,
        _interface_hex: &str,
        _metadata: &DeployMetadata,
    ) -> Result<Value, ProviderError> {
        self.answer("deploy", self.deploy.as_ref(), "contracts.deploy")
    }

    async fn execute(
        &self,
        contract: &str,
        method: &str,
        args: Value,
    ) -> Result<Value, ProviderError> {
        self.executed
            .lock()
            .unwrap()
            .push((contract.to_string(), method.to_string(), args));
        self.answer(
            &format!("execute:{method}"),
            self.execute.as_ref(),
            "contracts.execute",
        )
    }
}
