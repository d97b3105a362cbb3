// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! The three check phases and their orchestration.
//!
//! `plant` registers a fresh user and deposits the tick's flag as a credit
//! card number, leaving a public feedback entry as a liveness beacon.
//! `check` exercises the shared capability set over all three protocols and
//! verifies the advertised public key. `confirm` reloads the planted
//! credentials and proves the flag survived. Each phase renders exactly one
//! verdict; errors are classified centrally by [`CheckError::verdict`].

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use crate::clients::{ApiClient, HttpClient, JsonClient, RpcClient, Target};
use crate::flag::FlagSource;
use crate::state::StateStore;
use crate::types::CreditCard;
use crate::userdata;
use crate::verdict::{CheckError, Verdict};

/// Registration attempts with generated usernames before falling back to a
/// collision-proof one.
const REGISTRATION_ATTEMPTS: usize = 5;

pub struct Checker {
    target: Target,
    store: StateStore,
    flags: FlagSource,
}

/// Caps a whole phase at `limit`. A phase that cannot finish in time is a
/// harness-side condition, so the elapsed case renders `Invalid`.
pub async fn with_deadline<F>(limit: Duration, phase: F) -> Verdict
where
    F: Future<Output = Verdict>,
{
    match tokio::time::timeout(limit, phase).await {
        Ok(verdict) => verdict,
        Err(_) => {
            tracing::warn!(limit_secs = limit.as_secs(), "phase hit the overall deadline");
            Verdict::Invalid
        }
    }
}

fn render(phase: &'static str, result: Result<(), CheckError>) -> Verdict {
    match result {
        Ok(()) => {
            tracing::info!(phase, verdict = %Verdict::Ok, "phase completed");
            Verdict::Ok
        }
        Err(err) => {
            let verdict = err.verdict();
            tracing::warn!(phase, %verdict, error = %err, "phase failed");
            verdict
        }
    }
}

impl Checker {
    pub fn new(target: Target, store: StateStore, flags: FlagSource) -> Self {
        Self {
            target,
            store,
            flags,
        }
    }

    pub async fn plant<R: Rng>(&self, rng: &mut R, tick: u64) -> Verdict {
        render("plant", self.place_flag(rng, tick).await)
    }

    pub async fn check<R: Rng>(&self, rng: &mut R) -> Verdict {
        render("check", self.check_service(rng).await)
    }

    pub async fn confirm(&self, tick: u64) -> Verdict {
        render("confirm", self.confirm_flag(tick).await)
    }

    async fn place_flag<R: Rng>(&self, rng: &mut R, tick: u64) -> Result<(), CheckError> {
        let flag = self.flags.flag_for_tick(tick);
        let mut http = HttpClient::new(&self.target)?;

        let (username, password) = self.register_fresh_user(&mut http, rng).await?;
        // Persist before depositing anything: a plant that dies halfway
        // must still be confirmable up to the point it reached.
        self.store.store_credentials(tick, &username, &password)?;
        tracing::info!(tick, username, "registered flag carrier");

        let feedback = userdata::pick_feedback(rng);
        http.post_feedback(&feedback).await?;
        tracing::info!(tick, "posted public feedback");

        http.add_credit_card(&CreditCard { number: flag }).await?;
        tracing::info!(tick, "deposited flag credit card");

        Ok(())
    }

    async fn check_service<R: Rng>(&self, rng: &mut R) -> Result<(), CheckError> {
        let mut http = HttpClient::new(&self.target)?;
        let (username, password) = self.register_fresh_user(&mut http, rng).await?;
        tracing::info!(username, "registered probe user");

        let mut clients = vec![
            ApiClient::Http(HttpClient::new(&self.target)?),
            ApiClient::Json(JsonClient::new(&self.target)?),
            ApiClient::Rpc(RpcClient::connect(&self.target).await?),
        ];
        for client in &mut clients {
            tracing::info!(protocol = client.protocol(), "exercising capability set");
            self.check_capabilities(client, rng, &username, &password)
                .await?;
        }

        let Some(ApiClient::Rpc(mut rpc)) = clients.pop() else {
            return Err(CheckError::Protocol(
                "rpc client missing after capability pass".to_owned(),
            ));
        };
        if !rpc.check_public_key().await? {
            return Err(CheckError::PublicKeyMismatch);
        }
        tracing::info!("advertised public key verifies the issued token");

        Ok(())
    }

    async fn confirm_flag(&self, tick: u64) -> Result<(), CheckError> {
        let flag = self.flags.flag_for_tick(tick);
        let Some((username, password)) = self.store.credentials(tick)? else {
            return Err(CheckError::NotFound(format!("credentials for tick {tick}")));
        };

        let mut http = HttpClient::new(&self.target)?;
        if !http.has_user_feedback(&username).await? {
            return Err(CheckError::FeedbackUnavailable);
        }
        tracing::info!(tick, username, "feedback entry is still public");

        http.login(&username, &password).await?;
        if !http.has_credit_card(&CreditCard { number: flag }).await? {
            return Err(CheckError::NotFound("flag credit card".to_owned()));
        }
        tracing::info!(tick, "flag credit card recovered");

        Ok(())
    }

    async fn check_capabilities<R: Rng>(
        &self,
        client: &mut ApiClient,
        rng: &mut R,
        username: &str,
        password: &str,
    ) -> Result<(), CheckError> {
        client.login(username, password).await?;

        let address = userdata::new_address(rng);
        client.add_address(&address).await?;
        if !client.has_address(&address).await? {
            return Err(CheckError::RoundTripMissing("address"));
        }

        let card = CreditCard {
            number: Uuid::new_v4().simple().to_string(),
        };
        client.add_credit_card(&card).await?;
        if !client.has_credit_card(&card).await? {
            return Err(CheckError::RoundTripMissing("credit card"));
        }

        Ok(())
    }

    async fn register_fresh_user<R: Rng>(
        &self,
        http: &mut HttpClient,
        rng: &mut R,
    ) -> Result<(String, String), CheckError> {
        let password = userdata::new_password(rng);
        let name = userdata::new_full_name(rng);

        for _ in 0..REGISTRATION_ATTEMPTS {
            let username = userdata::new_username(rng);
            let email = userdata::new_email(rng);
            match http.register_user(&username, &password, &name, &email).await {
                Ok(()) => return Ok((username, password)),
                Err(CheckError::UserAlreadyRegistered) => {
                    tracing::debug!(username, "username collision, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        // A collision storm means the generated namespace is exhausted on
        // this instance; switch to a name nobody else will pick. A second
        // collision here is the service misbehaving and propagates as-is.
        let username = format!("user_{}", Uuid::new_v4().simple());
        let email = format!("{username}@{username}.org");
        http.register_user(&username, &password, &name, &email)
            .await?;
        Ok((username, password))
    }
}
