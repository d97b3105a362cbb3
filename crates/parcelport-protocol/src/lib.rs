// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod pb {
    pub mod v1 {
        tonic::include_proto!("parcelport.v1");
    }

    pub use v1::*;
}

/// Default TCP port of the HTML and JSON surfaces.
pub const HTTP_PORT: u16 = 8000;

/// Default TCP port of the gRPC surface.
pub const RPC_PORT: u16 = 8001;

/// Request metadata key carrying the bearer token on authenticated calls.
pub const AUTHORIZATION_METADATA_KEY: &str = "authorization";
