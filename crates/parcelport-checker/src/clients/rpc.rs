// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability client for the authenticated gRPC surface. `login` obtains a
//! bearer token which is then attached verbatim under the `authorization`
//! metadata key on every gated call. `check_public_key` is the trust-
//! boundary check: the held token must verify under the key the service
//! itself advertises.

use parcelport_protocol::pb;
use parcelport_protocol::pb::parcel_port_client::ParcelPortClient;
use parcelport_protocol::AUTHORIZATION_METADATA_KEY;
use std::time::Duration;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::Request;

use crate::types::{Address, CreditCard};
use crate::verdict::{CheckError, Operation};

use super::Target;

pub struct RpcClient {
    client: ParcelPortClient<Channel>,
    auth_token: Option<String>,
    timeout: Duration,
}

impl RpcClient {
    /// Connects eagerly so an unreachable RPC port surfaces here instead of
    /// on the first call.
    pub async fn connect(target: &Target) -> Result<Self, CheckError> {
        let endpoint = Endpoint::from_shared(format!("http://{}:{}", target.host, target.rpc_port))
            .map_err(|err| CheckError::Protocol(err.to_string()))?
            .connect_timeout(target.timeout)
            .timeout(target.timeout);
        let channel = endpoint
            .connect()
            .await
            .map_err(|err| CheckError::Protocol(err.to_string()))?;

        Ok(Self {
            client: ParcelPortClient::new(channel),
            auth_token: None,
            timeout: target.timeout,
        })
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.timeout);
        request
    }

    fn authed_request<T>(&self, message: T, action: &'static str) -> Result<Request<T>, CheckError> {
        let Some(token) = self.auth_token.as_deref() else {
            return Err(CheckError::NotLoggedIn(action));
        };
        let value = MetadataValue::try_from(token)
            .map_err(|_| CheckError::Protocol("bearer token is not valid metadata".to_owned()))?;
        let mut request = self.request(message);
        request
            .metadata_mut()
            .insert(AUTHORIZATION_METADATA_KEY, value);
        Ok(request)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), CheckError> {
        let request = self.request(pb::LoginRequest {
            username: username.to_owned(),
            password: password.as_bytes().to_vec(),
        });
        let response = self
            .client
            .login(request)
            .await
            .map_err(|status| CheckError::from_status(status, Operation::Login))?;

        let token = response.into_inner().auth_token;
        if token.is_empty() {
            return Err(CheckError::Authentication(
                "login returned an empty token".to_owned(),
            ));
        }
        self.auth_token = Some(token);

        Ok(())
    }

    pub async fn add_address(&mut self, address: &Address) -> Result<(), CheckError> {
        let request = self.authed_request(pb::Address::from(address), "AddAddress")?;
        self.client
            .add_address(request)
            .await
            .map_err(|status| CheckError::from_status(status, Operation::AddAddress))?;

        Ok(())
    }

    pub async fn has_address(&mut self, address: &Address) -> Result<bool, CheckError> {
        let request = self.authed_request(pb::GetAddressesRequest {}, "HasAddress")?;
        let response = match self.client.get_addresses(request).await {
            Ok(response) => response,
            Err(status) => {
                return match CheckError::from_status(status, Operation::AddAddress) {
                    CheckError::Timeout => Err(CheckError::Timeout),
                    // A failing listing call reads as the entry being absent.
                    _ => Ok(false),
                };
            }
        };

        Ok(response
            .into_inner()
            .addresses
            .into_iter()
            .any(|listed| Address::from(listed) == *address))
    }

    pub async fn add_credit_card(&mut self, card: &CreditCard) -> Result<(), CheckError> {
        let request = self.authed_request(
            pb::CreditCard {
                number: card.number.clone(),
            },
            "AddCreditCard",
        )?;
        self.client
            .add_credit_card(request)
            .await
            .map_err(|status| CheckError::from_status(status, Operation::AddCreditCard))?;

        Ok(())
    }

    pub async fn has_credit_card(&mut self, card: &CreditCard) -> Result<bool, CheckError> {
        let request = self.authed_request(pb::GetCreditCardsRequest {}, "HasCreditCard")?;
        let response = match self.client.get_credit_cards(request).await {
            Ok(response) => response,
            Err(status) => {
                return match CheckError::from_status(status, Operation::AddCreditCard) {
                    CheckError::Timeout => Err(CheckError::Timeout),
                    _ => Ok(false),
                };
            }
        };

        Ok(response
            .into_inner()
            .cards
            .into_iter()
            .any(|listed| listed.number == card.number))
    }

    /// Fetches the service's advertised public key and verifies the held
    /// bearer token against it. Parse and verification failures mean the
    /// service is misconfigured or lying about its key, which is exactly
    /// the condition under test, so they yield `false` rather than an
    /// error.
    pub async fn check_public_key(&mut self) -> Result<bool, CheckError> {
        let token = match self.auth_token.clone() {
            Some(token) => token,
            None => return Err(CheckError::NotLoggedIn("CheckPublicKey")),
        };

        let request = self.authed_request(pb::GetPublicKeyRequest {}, "CheckPublicKey")?;
        let response = match self.client.get_public_key(request).await {
            Ok(response) => response,
            Err(status) => {
                return match CheckError::from_status(status, Operation::GetPublicKey) {
                    CheckError::Timeout => Err(CheckError::Timeout),
                    _ => Ok(false),
                };
            }
        };

        let key = response.into_inner().key;
        Ok(parcelport_auth::verify_token(&token, key.as_bytes()).is_ok())
    }
}
