// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! The three capability clients and the shared operation contract they
//! implement. Dispatch goes through the [`ApiClient`] tagged enum so the
//! verification routine stays protocol-agnostic.

use std::time::Duration;

use crate::types::{Address, CreditCard};
use crate::verdict::CheckError;

mod http;
mod json;
mod rpc;

pub use http::HttpClient;
pub use json::JsonClient;
pub use rpc::RpcClient;

/// Network coordinates of one service instance. Each client owns its own
/// connection and session state for this target; nothing is shared across
/// clients or across concurrent check invocations.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub http_port: u16,
    pub rpc_port: u16,
    /// Fixed per-call timeout applied to every network operation.
    pub timeout: Duration,
}

impl Target {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            http_port: parcelport_protocol::HTTP_PORT,
            rpc_port: parcelport_protocol::RPC_PORT,
            timeout: Duration::from_secs(10),
        }
    }
}

/// One shared capability set, three wire protocols.
pub enum ApiClient {
    Http(HttpClient),
    Json(JsonClient),
    Rpc(RpcClient),
}

impl ApiClient {
    pub fn protocol(&self) -> &'static str {
        match self {
            ApiClient::Http(_) => "http",
            ApiClient::Json(_) => "json",
            ApiClient::Rpc(_) => "rpc",
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), CheckError> {
        match self {
            ApiClient::Http(c) => c.login(username, password).await,
            ApiClient::Json(c) => c.login(username, password).await,
            ApiClient::Rpc(c) => c.login(username, password).await,
        }
    }

    pub async fn add_address(&mut self, address: &Address) -> Result<(), CheckError> {
        match self {
            ApiClient::Http(c) => c.add_address(address).await,
            ApiClient::Json(c) => c.add_address(address).await,
            ApiClient::Rpc(c) => c.add_address(address).await,
        }
    }

    pub async fn has_address(&mut self, address: &Address) -> Result<bool, CheckError> {
        match self {
            ApiClient::Http(c) => c.has_address(address).await,
            ApiClient::Json(c) => c.has_address(address).await,
            ApiClient::Rpc(c) => c.has_address(address).await,
        }
    }

    pub async fn add_credit_card(&mut self, card: &CreditCard) -> Result<(), CheckError> {
        match self {
            ApiClient::Http(c) => c.add_credit_card(card).await,
            ApiClient::Json(c) => c.add_credit_card(card).await,
            ApiClient::Rpc(c) => c.add_credit_card(card).await,
        }
    }

    pub async fn has_credit_card(&mut self, card: &CreditCard) -> Result<bool, CheckError> {
        match self {
            ApiClient::Http(c) => c.has_credit_card(card).await,
            ApiClient::Json(c) => c.has_credit_card(card).await,
            ApiClient::Rpc(c) => c.has_credit_card(card).await,
        }
    }
}
