// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! JSON Web Token issuance and verification for the Parcelport RPC API.
//!
//! Tokens are signed either symmetrically (HS256, shared secret) or
//! asymmetrically (RS256, PEM RSA key pair). Verification selects the key
//! from the token header; anything outside the HS/RS families is rejected
//! with [`AuthError::UnsupportedAlgorithm`].

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

pub mod gate;

pub use gate::{AuthGate, UserDirectory, UserRecord};

/// Issuer claim stamped into every token.
pub const ISSUER: &str = "parcelport";

/// Token lifetime: 31 days.
pub const TOKEN_LIFETIME_SECS: u64 = 31 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Hmac,
    Rsa,
}

/// Signed claims set. `username` binds the token to one account; the
/// remaining fields are the standard validity window and issuer claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: u64,
    pub nbf: u64,
    pub iss: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("jwt: the signing algorithm is not supported")]
    UnsupportedAlgorithm,
    #[error("jwt: the signing key could not be parsed")]
    InvalidKey,
    #[error("jwt: token has expired")]
    Expired,
    #[error("jwt: token is not valid yet")]
    NotYetValid,
    #[error("jwt: token is invalid")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

/// Signs a token for `username`. For [`SigningAlgorithm::Hmac`] the key is
/// the raw shared secret; for [`SigningAlgorithm::Rsa`] it is a PEM-encoded
/// RSA private key.
pub fn issue_token(
    username: &str,
    algorithm: SigningAlgorithm,
    key: &[u8],
) -> Result<String, AuthError> {
    let (header, encoding_key) = match algorithm {
        SigningAlgorithm::Hmac => (Header::new(Algorithm::HS256), EncodingKey::from_secret(key)),
        SigningAlgorithm::Rsa => (
            Header::new(Algorithm::RS256),
            EncodingKey::from_rsa_pem(key).map_err(|_| AuthError::InvalidKey)?,
        ),
    };
    let now = jsonwebtoken::get_current_timestamp();
    let claims = Claims {
        username: username.to_owned(),
        exp: now + TOKEN_LIFETIME_SECS,
        nbf: now,
        iss: ISSUER.to_owned(),
    };

    encode(&header, &claims, &encoding_key).map_err(AuthError::InvalidToken)
}

/// Verifies `token` and returns its claims. The key material is selected by
/// the token header: HS-family tokens verify against `key` as the shared
/// secret, RS-family tokens parse `key` as a PEM-encoded RSA public key.
/// Expiry, not-before and issuer claims are enforced.
pub fn verify_token(token: &str, key: &[u8]) -> Result<Claims, AuthError> {
    let header = match decode_header(token) {
        Ok(header) => header,
        Err(err) => return Err(classify_header_error(token, err)),
    };
    let (decoding_key, algorithm) = match header.alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            (DecodingKey::from_secret(key), header.alg)
        }
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => (
            DecodingKey::from_rsa_pem(key).map_err(|_| AuthError::InvalidKey)?,
            header.alg,
        ),
        _ => return Err(AuthError::UnsupportedAlgorithm),
    };

    let mut validation = Validation::new(algorithm);
    validation.validate_nbf = true;
    validation.set_issuer(&[ISSUER]);

    let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|err| {
        if matches!(err.kind(), ErrorKind::ExpiredSignature) {
            AuthError::Expired
        } else if matches!(err.kind(), ErrorKind::ImmatureSignature) {
            AuthError::NotYetValid
        } else {
            AuthError::InvalidToken(err)
        }
    })?;

    Ok(data.claims)
}

/// `decode_header` fails both for structurally broken tokens and for
/// unknown `alg` values. If the header segment is well-formed JSON the
/// failure was the algorithm identifier.
fn classify_header_error(token: &str, err: jsonwebtoken::errors::Error) -> AuthError {
    use base64::Engine as _;

    let Some(segment) = token.split('.').next() else {
        return AuthError::InvalidToken(err);
    };
    let Ok(raw) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(segment) else {
        return AuthError::InvalidToken(err);
    };
    if serde_json::from_slice::<serde_json::Value>(&raw).is_ok() {
        AuthError::UnsupportedAlgorithm
    } else {
        AuthError::InvalidToken(err)
    }
}
