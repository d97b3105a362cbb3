// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deterministic per-tick flag derivation. The plant and confirm phases may
//! run in different processes, so the flag for a tick must be recomputable
//! from the shared secret alone.

use sha2::{Digest, Sha256};

pub struct FlagSource {
    secret: Vec<u8>,
}

impl FlagSource {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The opaque flag string planted/expected for `tick`.
    pub fn flag_for_tick(&self, tick: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(tick.to_be_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("FLAG_{}", &digest[..32])
    }
}
