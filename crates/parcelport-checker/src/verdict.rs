// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! The verdict model and the error taxonomy feeding it.
//!
//! Every reachable error path resolves to exactly one verdict through
//! [`CheckError::verdict`]; phase logic never maps errors ad hoc. The
//! classification is pure, so feeding the same error always yields the
//! same verdict regardless of call order.

use std::fmt;
use std::io;

use tonic::Code;

/// Outcome of one check phase. Terminal; the harness never retries a
/// rendered verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The service behaved correctly for everything this phase exercised.
    Ok,
    /// The service behaved incorrectly. Scoring-relevant defect.
    Faulty,
    /// The check itself could not be completed. Not attributable to the
    /// service's business logic.
    Invalid,
    /// The specific artifact being searched for is absent.
    FlagNotFound,
}

impl Verdict {
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Ok => 0,
            Verdict::Faulty => 1,
            Verdict::FlagNotFound => 2,
            Verdict::Invalid => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Ok => "OK",
            Verdict::Faulty => "FAULTY",
            Verdict::Invalid => "INVALID",
            Verdict::FlagNotFound => "FLAG_NOT_FOUND",
        };
        f.write_str(s)
    }
}

/// Named service operation, used to keep rejection errors specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RegisterUser,
    Login,
    Logout,
    AddAddress,
    AddCreditCard,
    PostFeedback,
    GetPublicKey,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::RegisterUser => "register-user",
            Operation::Login => "login",
            Operation::Logout => "logout",
            Operation::AddAddress => "add-address",
            Operation::AddCreditCard => "add-credit-card",
            Operation::PostFeedback => "post-feedback",
            Operation::GetPublicKey => "get-public-key",
        };
        f.write_str(s)
    }
}

/// Error taxonomy shared by all three capability clients. Clients surface
/// the most specific member they can determine; collapsing the distinction
/// between timeouts, rejections and unparsable responses early would
/// destroy the information the classifier needs.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("operation timed out")]
    Timeout,
    #[error("service rejected {0}")]
    Rejected(Operation),
    #[error("a user with that username already exists")]
    UserAlreadyRegistered,
    #[error("{0}: tried to perform action without being logged in")]
    NotLoggedIn(&'static str),
    #[error("service closed the connection unexpectedly")]
    UnexpectedDisconnect,
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("customer feedback listing is unavailable")]
    FeedbackUnavailable,
    #[error("previously added {0} is missing from the service listing")]
    RoundTripMissing(&'static str),
    #[error("advertised public key does not verify the held token")]
    PublicKeyMismatch,
    #[error("malformed response: {0}")]
    Protocol(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("state store error")]
    Io(#[from] io::Error),
}

impl CheckError {
    /// Total classification of the taxonomy into the four verdicts.
    pub fn verdict(&self) -> Verdict {
        match self {
            CheckError::Timeout
            | CheckError::NotLoggedIn(_)
            | CheckError::Protocol(_)
            | CheckError::Io(_) => Verdict::Invalid,
            CheckError::Rejected(_)
            | CheckError::UserAlreadyRegistered
            | CheckError::UnexpectedDisconnect
            | CheckError::Authentication(_)
            | CheckError::FeedbackUnavailable
            | CheckError::RoundTripMissing(_)
            | CheckError::PublicKeyMismatch => Verdict::Faulty,
            CheckError::NotFound(_) => Verdict::FlagNotFound,
        }
    }

    /// Maps a reqwest transport error. Timeouts and torn connections keep
    /// their taxonomy identity; everything else is an unclassified
    /// protocol error.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return CheckError::Timeout;
        }
        if is_disconnect(&err) {
            return CheckError::UnexpectedDisconnect;
        }
        CheckError::Protocol(err.to_string())
    }

    /// Maps a gRPC status for a named operation.
    pub fn from_status(status: tonic::Status, op: Operation) -> Self {
        match status.code() {
            Code::DeadlineExceeded | Code::Cancelled => CheckError::Timeout,
            Code::Unauthenticated => CheckError::Authentication(status.message().to_owned()),
            _ => CheckError::Rejected(op),
        }
    }
}

fn is_disconnect(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return matches!(
                io_err.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            );
        }
        source = err.source();
    }
    false
}
