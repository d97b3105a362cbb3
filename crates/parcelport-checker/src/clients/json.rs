// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability client for the JSON surface. Writes go out as multipart
//! forms; every response body is an `{error?, result?}` envelope and a
//! non-empty `error` is a domain failure regardless of HTTP status. Bodies
//! that don't decode against the envelope are protocol errors.

use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::types::{Address, CreditCard};
use crate::verdict::{CheckError, Operation};

use super::Target;

pub struct JsonClient {
    http: reqwest::Client,
    base: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    error: Option<String>,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn domain_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|msg| !msg.is_empty())
    }
}

impl JsonClient {
    pub fn new(target: &Target) -> Result<Self, CheckError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(target.timeout)
            .build()
            .map_err(|err| CheckError::Protocol(err.to_string()))?;

        Ok(Self {
            http,
            base: format!("http://{}:{}/api", target.host, target.http_port),
            username: None,
        })
    }

    fn username(&self, action: &'static str) -> Result<&str, CheckError> {
        self.username
            .as_deref()
            .ok_or(CheckError::NotLoggedIn(action))
    }

    fn user_url(&self, action: &'static str, relpath: &str) -> Result<String, CheckError> {
        Ok(format!("{}/user/{}/{relpath}", self.base, self.username(action)?))
    }

    async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: String,
        fields: Vec<(&'static str, String)>,
    ) -> Result<Envelope<T>, CheckError> {
        let mut form = Form::new();
        for (key, value) in fields {
            form = form.text(key, value);
        }
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(CheckError::from_reqwest)?;
        Self::decode(resp).await
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<Envelope<T>, CheckError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(CheckError::from_reqwest)?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Envelope<T>, CheckError> {
        if resp.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Err(CheckError::Timeout);
        }
        resp.json::<Envelope<T>>()
            .await
            .map_err(CheckError::from_reqwest)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), CheckError> {
        let envelope: Envelope<String> = self
            .post_multipart(
                format!("{}/login", self.base),
                vec![
                    ("username", username.to_owned()),
                    ("password", password.to_owned()),
                ],
            )
            .await?;
        if let Some(msg) = envelope.domain_error() {
            tracing::debug!(error = msg, "json login returned an error message");
            return Err(CheckError::Rejected(Operation::Login));
        }
        if envelope.result.as_deref() != Some(username) {
            return Err(CheckError::Rejected(Operation::Login));
        }
        self.username = Some(username.to_owned());

        Ok(())
    }

    pub async fn add_address(&mut self, address: &Address) -> Result<(), CheckError> {
        let url = self.user_url("AddAddress", "add-address")?;
        let envelope: Envelope<Address> = self
            .post_multipart(
                url,
                vec![
                    ("street", address.street.clone()),
                    ("zip", address.zip.clone()),
                    ("city", address.city.clone()),
                    ("country", address.country.clone()),
                    ("planet", address.planet.clone()),
                ],
            )
            .await?;
        if envelope.domain_error().is_some() {
            return Err(CheckError::Rejected(Operation::AddAddress));
        }
        // The API echoes the stored entity; a mangled echo is a defect.
        if envelope.result.as_ref() != Some(address) {
            return Err(CheckError::Rejected(Operation::AddAddress));
        }

        Ok(())
    }

    pub async fn has_address(&mut self, address: &Address) -> Result<bool, CheckError> {
        let url = self.user_url("HasAddress", "get-addresses")?;
        let envelope: Envelope<Vec<Address>> = self.get_envelope(url).await?;
        if let Some(msg) = envelope.domain_error() {
            tracing::debug!(error = msg, "json get-addresses returned an error message");
            return Ok(false);
        }

        Ok(envelope
            .result
            .unwrap_or_default()
            .iter()
            .any(|listed| listed == address))
    }

    pub async fn add_credit_card(&mut self, card: &CreditCard) -> Result<(), CheckError> {
        let url = self.user_url("AddCreditCard", "add-credit-card")?;
        let envelope: Envelope<CreditCard> = self
            .post_multipart(url, vec![("number", card.number.clone())])
            .await?;
        if envelope.domain_error().is_some() {
            return Err(CheckError::Rejected(Operation::AddCreditCard));
        }
        if envelope.result.as_ref() != Some(card) {
            return Err(CheckError::Rejected(Operation::AddCreditCard));
        }

        Ok(())
    }

    pub async fn has_credit_card(&mut self, card: &CreditCard) -> Result<bool, CheckError> {
        let url = self.user_url("HasCreditCard", "get-credit-cards")?;
        let envelope: Envelope<Vec<CreditCard>> = self.get_envelope(url).await?;
        if let Some(msg) = envelope.domain_error() {
            tracing::debug!(error = msg, "json get-credit-cards returned an error message");
            return Ok(false);
        }

        Ok(envelope
            .result
            .unwrap_or_default()
            .iter()
            .any(|listed| listed == card))
    }
}
