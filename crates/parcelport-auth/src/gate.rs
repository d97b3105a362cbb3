// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Authentication gate for the RPC surface.
//!
//! `Login` and `GetPublicKey` are reachable without a token; every other
//! handler calls [`AuthGate::authenticate`] on its request metadata and
//! receives the resolved [`UserRecord`] as an explicit value instead of a
//! request-context side channel.

use std::sync::Arc;

use parcelport_protocol::AUTHORIZATION_METADATA_KEY;
use tonic::metadata::MetadataMap;
use tonic::Status;

use crate::{verify_token, AuthError};

/// Account record resolved from a verified token's `username` claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
}

/// Lookup of account records by username. The gate only needs existence
/// plus the canonical record; storage lives elsewhere.
pub trait UserDirectory: Send + Sync {
    fn by_username(&self, username: &str) -> Option<UserRecord>;
}

pub struct AuthGate {
    key: Vec<u8>,
    users: Arc<dyn UserDirectory>,
}

impl AuthGate {
    /// `key` is the verification key material: the shared secret for
    /// HS-family tokens or the PEM public key for RS-family tokens.
    pub fn new(key: Vec<u8>, users: Arc<dyn UserDirectory>) -> Self {
        Self { key, users }
    }

    /// Verifies the bearer token in `metadata` and resolves the claimed
    /// username to an account record. Any failure terminates the call;
    /// no partial work is attempted.
    pub fn authenticate(&self, metadata: &MetadataMap) -> Result<UserRecord, Status> {
        let token = extract_token(metadata)?;
        let claims = verify_token(&token, &self.key).map_err(|err| match err {
            AuthError::UnsupportedAlgorithm => Status::invalid_argument(err.to_string()),
            _ => Status::invalid_argument("authorization token is invalid"),
        })?;

        self.users
            .by_username(&claims.username)
            .ok_or_else(|| Status::internal("user lookup failed"))
    }
}

/// Extracts exactly one authorization value. Zero values and more than one
/// value are both hard errors; the gate never picks the first of many.
fn extract_token(metadata: &MetadataMap) -> Result<String, Status> {
    let mut values = metadata.get_all(AUTHORIZATION_METADATA_KEY).iter();
    let Some(first) = values.next() else {
        return Err(Status::unauthenticated("no authorization header in request"));
    };
    if values.next().is_some() {
        return Err(Status::unauthenticated("authorization header is invalid"));
    }

    first
        .to_str()
        .map(str::to_owned)
        .map_err(|_| Status::unauthenticated("authorization header is invalid"))
}
