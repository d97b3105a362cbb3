// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability client for the HTML/session surface. Form posts with a
//! cookie jar; success is HTTP 200 with no danger alert on the rendered
//! page. HTTP 503 is the service's designated "temporarily unavailable"
//! signal and maps to the timeout taxonomy member.

use reqwest::StatusCode;
use scraper::{Html, Selector};

use crate::types::{Address, CreditCard, Feedback};
use crate::verdict::{CheckError, Operation};

use super::Target;

const USER_EXISTS_MARKER: &str = "a user with that username already exists";
const SIGNUP_OK_MARKER: &str = "Your account has been created successfully!";
const ALERT_SELECTOR: &str = ".alert.alert-danger";

pub struct HttpClient {
    http: reqwest::Client,
    base: String,
    logged_in: bool,
}

fn selector(css: &str) -> Result<Selector, CheckError> {
    Selector::parse(css).map_err(|_| CheckError::Protocol(format!("bad selector: {css}")))
}

fn page_has_alert(body: &str) -> Result<bool, CheckError> {
    let alert = selector(ALERT_SELECTOR)?;
    Ok(Html::parse_document(body).select(&alert).next().is_some())
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

fn page_lists_address(body: &str, wanted: &Address) -> Result<bool, CheckError> {
    let rows = selector("#addresses tbody tr")?;
    let cells = selector("td")?;
    let document = Html::parse_document(body);
    for row in document.select(&rows) {
        let cols: Vec<String> = row.select(&cells).map(element_text).collect();
        if cols.len() < 5 {
            continue;
        }
        let listed = Address {
            street: cols[0].clone(),
            zip: cols[1].clone(),
            city: cols[2].clone(),
            country: cols[3].clone(),
            planet: cols[4].clone(),
        };
        if listed == *wanted {
            return Ok(true);
        }
    }
    Ok(false)
}

fn page_lists_card(body: &str, wanted: &CreditCard) -> Result<bool, CheckError> {
    let cells = selector("td")?;
    let document = Html::parse_document(body);
    Ok(document
        .select(&cells)
        .any(|cell| element_text(cell) == wanted.number))
}

fn page_has_feedback_author(body: &str, username: &str) -> Result<bool, CheckError> {
    let authors = selector(".customer-feedback .author")?;
    let document = Html::parse_document(body);
    Ok(document
        .select(&authors)
        .any(|author| element_text(author) == username))
}

impl HttpClient {
    pub fn new(target: &Target) -> Result<Self, CheckError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(target.timeout)
            .build()
            .map_err(|err| CheckError::Protocol(err.to_string()))?;

        Ok(Self {
            http,
            base: format!("http://{}:{}", target.host, target.http_port),
            logged_in: false,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, CheckError> {
        self.http
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .map_err(CheckError::from_reqwest)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, CheckError> {
        self.http
            .get(self.url(path))
            .send()
            .await
            .map_err(CheckError::from_reqwest)
    }

    async fn body(resp: reqwest::Response) -> Result<String, CheckError> {
        resp.text().await.map_err(CheckError::from_reqwest)
    }

    pub async fn register_user(
        &mut self,
        username: &str,
        password: &str,
        name: &str,
        email: &str,
    ) -> Result<(), CheckError> {
        let resp = self
            .post_form(
                "signup",
                &[
                    ("username", username),
                    ("password", password),
                    ("password-confirm", password),
                    ("name", name),
                    ("email", email),
                ],
            )
            .await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Err(CheckError::Rejected(Operation::RegisterUser)),
        }

        let body = Self::body(resp).await?;
        if body.contains(USER_EXISTS_MARKER) {
            return Err(CheckError::UserAlreadyRegistered);
        }
        if !body.contains(SIGNUP_OK_MARKER) {
            return Err(CheckError::Rejected(Operation::RegisterUser));
        }
        // Signup logs the fresh user in.
        self.logged_in = true;

        Ok(())
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), CheckError> {
        if self.logged_in {
            match self.logout().await {
                Ok(()) => {}
                Err(CheckError::Rejected(Operation::Logout)) => {
                    return Err(CheckError::Rejected(Operation::Login));
                }
                Err(err) => return Err(err),
            }
        }

        let resp = self
            .post_form("login", &[("username", username), ("password", password)])
            .await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Err(CheckError::Rejected(Operation::Login)),
        }
        if page_has_alert(&Self::body(resp).await?)? {
            return Err(CheckError::Rejected(Operation::Login));
        }
        self.logged_in = true;

        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), CheckError> {
        let resp = self.get("logout").await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Err(CheckError::Rejected(Operation::Logout)),
        }
        self.logged_in = false;

        Ok(())
    }

    pub async fn add_address(&mut self, address: &Address) -> Result<(), CheckError> {
        if !self.logged_in {
            return Err(CheckError::NotLoggedIn("AddAddress"));
        }

        let resp = self
            .post_form(
                "profile/addresses/add",
                &[
                    ("street", &address.street),
                    ("zip", &address.zip),
                    ("city", &address.city),
                    ("country", &address.country),
                    ("planet", &address.planet),
                ],
            )
            .await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Err(CheckError::Rejected(Operation::AddAddress)),
        }
        if page_has_alert(&Self::body(resp).await?)? {
            return Err(CheckError::Rejected(Operation::AddAddress));
        }

        Ok(())
    }

    pub async fn has_address(&mut self, address: &Address) -> Result<bool, CheckError> {
        if !self.logged_in {
            return Err(CheckError::NotLoggedIn("HasAddress"));
        }

        let resp = self.get("profile/addresses").await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            // A broken listing page surfaces as the address being absent.
            _ => return Ok(false),
        }
        page_lists_address(&Self::body(resp).await?, address)
    }

    pub async fn add_credit_card(&mut self, card: &CreditCard) -> Result<(), CheckError> {
        if !self.logged_in {
            return Err(CheckError::NotLoggedIn("AddCreditCard"));
        }

        let resp = self
            .post_form("profile/add-payment-option", &[("number", &card.number)])
            .await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Err(CheckError::Rejected(Operation::AddCreditCard)),
        }
        if page_has_alert(&Self::body(resp).await?)? {
            return Err(CheckError::Rejected(Operation::AddCreditCard));
        }

        Ok(())
    }

    pub async fn has_credit_card(&mut self, card: &CreditCard) -> Result<bool, CheckError> {
        if !self.logged_in {
            return Err(CheckError::NotLoggedIn("HasCreditCard"));
        }

        let resp = self.get("profile/payment-options").await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Ok(false),
        }
        page_lists_card(&Self::body(resp).await?, card)
    }

    pub async fn post_feedback(&mut self, feedback: &Feedback) -> Result<(), CheckError> {
        if !self.logged_in {
            return Err(CheckError::NotLoggedIn("PostFeedback"));
        }

        let rating = feedback.rating().to_string();
        let resp = self
            .post_form("feedback", &[("rating", &rating), ("text", feedback.text())])
            .await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Err(CheckError::Rejected(Operation::PostFeedback)),
        }
        if page_has_alert(&Self::body(resp).await?)? {
            return Err(CheckError::Rejected(Operation::PostFeedback));
        }

        Ok(())
    }

    /// Whether `username` appears as the author of any public feedback
    /// entry. Works without being logged in; the feedback page is public.
    pub async fn has_user_feedback(&mut self, username: &str) -> Result<bool, CheckError> {
        let resp = self.get("feedback").await?;
        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(CheckError::Timeout),
            StatusCode::OK => {}
            _ => return Err(CheckError::FeedbackUnavailable),
        }
        page_has_feedback_author(&Self::body(resp).await?, username)
    }
}
