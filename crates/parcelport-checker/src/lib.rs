// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Correctness-verification harness for the Parcelport service.
//!
//! The harness treats the service as an untrusted black box reachable over
//! three protocols (HTML/session, JSON, gRPC) and renders one of four
//! verdicts per check phase. See [`checker::Checker`] for the three phases
//! and [`verdict`] for the error taxonomy and its classification rules.

pub mod checker;
pub mod clients;
pub mod flag;
pub mod state;
pub mod types;
pub mod userdata;
pub mod verdict;

pub use checker::{with_deadline, Checker};
pub use clients::Target;
pub use flag::FlagSource;
pub use state::StateStore;
pub use verdict::{CheckError, Operation, Verdict};
