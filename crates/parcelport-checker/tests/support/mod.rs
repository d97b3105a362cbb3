// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-process stand-in for the Parcelport service: the HTML/JSON surface on
//! one ephemeral port, the gRPC surface on another, both over one shared
//! account store. `Sabotage` switches let tests break individual behaviors
//! without touching the happy path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response as TonicResponse, Status};
use uuid::Uuid;

use parcelport_auth::{issue_token, AuthGate, SigningAlgorithm, UserDirectory, UserRecord};
use parcelport_checker::clients::Target;
use parcelport_checker::types::Address;
use parcelport_protocol::pb;
use parcelport_protocol::pb::parcel_port_server::{ParcelPort, ParcelPortServer};

pub const RSA_PRIVATE: &[u8] = include_bytes!("../data/rsa_test_key.pem");
pub const RSA_PUBLIC: &[u8] = include_bytes!("../data/rsa_test_key.pub.pem");
pub const OTHER_RSA_PUBLIC: &[u8] = include_bytes!("../data/rsa_other_key.pub.pem");

#[derive(Default)]
pub struct Sabotage {
    /// JSON add-address responds with a domain error envelope.
    pub json_add_address_error: AtomicBool,
    /// HTML login responds 503.
    pub http_login_unavailable: AtomicBool,
    /// The public feedback page omits author names.
    pub hide_feedback_authors: AtomicBool,
    /// GetPublicKey advertises a key unrelated to the signing key.
    pub wrong_public_key: AtomicBool,
}

impl Sabotage {
    pub fn set(flag: &AtomicBool) {
        flag.store(true, Ordering::Relaxed);
    }

    fn on(flag: &AtomicBool) -> bool {
        flag.load(Ordering::Relaxed)
    }
}

struct Account {
    password: String,
    addresses: Vec<Address>,
    cards: Vec<String>,
}

struct FeedbackEntry {
    author: String,
    text: String,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    feedback: Vec<FeedbackEntry>,
}

impl Inner {
    fn new_session(&mut self, username: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(id.clone(), username.to_owned());
        id
    }
}

#[derive(Default)]
pub struct AppState {
    inner: Mutex<Inner>,
    pub sabotage: Sabotage,
}

pub struct TestService {
    http_addr: SocketAddr,
    rpc_addr: SocketAddr,
    app: Arc<AppState>,
}

impl TestService {
    pub async fn spawn() -> Self {
        let app = Arc::new(AppState::default());

        let http_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let http_addr = http_listener.local_addr().unwrap();
        let router = web_router(app.clone());
        tokio::spawn(async move {
            axum::serve(http_listener, router).await.unwrap();
        });

        let rpc_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let rpc_addr = rpc_listener.local_addr().unwrap();
        let rpc = MockRpc::new(app.clone());
        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(ParcelPortServer::new(rpc))
                .serve_with_incoming(TcpListenerStream::new(rpc_listener))
                .await
                .unwrap();
        });

        Self {
            http_addr,
            rpc_addr,
            app,
        }
    }

    pub fn target(&self) -> Target {
        let mut target = Target::new("127.0.0.1");
        target.http_port = self.http_addr.port();
        target.rpc_port = self.rpc_addr.port();
        target.timeout = Duration::from_secs(5);
        target
    }

    pub fn sabotage(&self) -> &Sabotage {
        &self.app.sabotage
    }
}

fn web_router(app: Arc<AppState>) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/profile/addresses/add", post(add_address))
        .route("/profile/addresses", get(list_addresses))
        .route("/profile/add-payment-option", post(add_card))
        .route("/profile/payment-options", get(list_cards))
        .route("/feedback", post(post_feedback).get(feedback_page))
        .route("/api/login", post(api_login))
        .route("/api/user/:username/add-address", post(api_add_address))
        .route("/api/user/:username/get-addresses", get(api_get_addresses))
        .route("/api/user/:username/add-credit-card", post(api_add_card))
        .route("/api/user/:username/get-credit-cards", get(api_get_cards))
        .with_state(app)
}

fn page(body: &str) -> Html<String> {
    Html(format!("<!doctype html><html><body>{body}</body></html>"))
}

fn alert_page(msg: &str) -> Html<String> {
    page(&format!(r#"<div class="alert alert-danger">{msg}</div>"#))
}

fn session_cookie(id: &str) -> [(header::HeaderName, String); 1] {
    [(header::SET_COOKIE, format!("session={id}; Path=/"))]
}

fn session_user(app: &AppState, headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    let id = cookies
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))?;
    app.inner.lock().unwrap().sessions.get(id).cloned()
}

#[derive(Deserialize)]
struct SignupForm {
    username: String,
    password: String,
    #[serde(rename = "password-confirm")]
    password_confirm: String,
    #[allow(dead_code)]
    name: String,
    #[allow(dead_code)]
    email: String,
}

async fn signup(State(app): State<Arc<AppState>>, Form(form): Form<SignupForm>) -> Response {
    if form.password != form.password_confirm {
        return alert_page("passwords do not match").into_response();
    }
    let mut inner = app.inner.lock().unwrap();
    if inner.users.contains_key(&form.username) {
        return page("a user with that username already exists").into_response();
    }
    inner.users.insert(
        form.username.clone(),
        Account {
            password: form.password,
            addresses: Vec::new(),
            cards: Vec::new(),
        },
    );
    let session = inner.new_session(&form.username);
    (
        session_cookie(&session),
        page("Your account has been created successfully!"),
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State(app): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    if Sabotage::on(&app.sabotage.http_login_unavailable) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let mut inner = app.inner.lock().unwrap();
    let valid = inner
        .users
        .get(&form.username)
        .is_some_and(|account| account.password == form.password);
    if !valid {
        return alert_page("wrong username or password").into_response();
    }
    let session = inner.new_session(&form.username);
    (session_cookie(&session), page("Welcome back!")).into_response()
}

async fn logout(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        if let Some(id) = cookies
            .split(';')
            .find_map(|c| c.trim().strip_prefix("session="))
        {
            app.inner.lock().unwrap().sessions.remove(id);
        }
    }
    page("You have been logged out.").into_response()
}

#[derive(Deserialize)]
struct AddressForm {
    street: String,
    zip: String,
    city: String,
    country: String,
    planet: String,
}

impl From<AddressForm> for Address {
    fn from(f: AddressForm) -> Self {
        Address {
            street: f.street,
            zip: f.zip,
            city: f.city,
            country: f.country,
            planet: f.planet,
        }
    }
}

async fn add_address(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<AddressForm>,
) -> Response {
    let Some(username) = session_user(&app, &headers) else {
        return alert_page("not logged in").into_response();
    };
    let mut inner = app.inner.lock().unwrap();
    if let Some(account) = inner.users.get_mut(&username) {
        account.addresses.push(form.into());
    }
    page("Address added.").into_response()
}

async fn list_addresses(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(username) = session_user(&app, &headers) else {
        return StatusCode::FORBIDDEN.into_response();
    };
    let inner = app.inner.lock().unwrap();
    let rows: String = inner
        .users
        .get(&username)
        .map(|account| {
            account
                .addresses
                .iter()
                .map(|a| {
                    format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                        a.street, a.zip, a.city, a.country, a.planet
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    page(&format!(
        r#"<table id="addresses"><tbody>{rows}</tbody></table>"#
    ))
    .into_response()
}

#[derive(Deserialize)]
struct CardForm {
    number: String,
}

async fn add_card(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<CardForm>,
) -> Response {
    let Some(username) = session_user(&app, &headers) else {
        return alert_page("not logged in").into_response();
    };
    let mut inner = app.inner.lock().unwrap();
    if let Some(account) = inner.users.get_mut(&username) {
        account.cards.push(form.number);
    }
    page("Payment option added.").into_response()
}

async fn list_cards(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(username) = session_user(&app, &headers) else {
        return StatusCode::FORBIDDEN.into_response();
    };
    let inner = app.inner.lock().unwrap();
    let rows: String = inner
        .users
        .get(&username)
        .map(|account| {
            account
                .cards
                .iter()
                .map(|number| format!("<tr><td>{number}</td></tr>"))
                .collect()
        })
        .unwrap_or_default();
    page(&format!(
        r#"<table id="payment-options"><tbody>{rows}</tbody></table>"#
    ))
    .into_response()
}

#[derive(Deserialize)]
struct FeedbackForm {
    #[allow(dead_code)]
    rating: u8,
    text: String,
}

async fn post_feedback(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let Some(username) = session_user(&app, &headers) else {
        return alert_page("not logged in").into_response();
    };
    app.inner.lock().unwrap().feedback.push(FeedbackEntry {
        author: username,
        text: form.text,
    });
    page("Thank you for your feedback!").into_response()
}

async fn feedback_page(State(app): State<Arc<AppState>>) -> Response {
    let hide = Sabotage::on(&app.sabotage.hide_feedback_authors);
    let inner = app.inner.lock().unwrap();
    let entries: String = inner
        .feedback
        .iter()
        .map(|entry| {
            if hide {
                format!(
                    r#"<div class="customer-feedback"><p>{}</p></div>"#,
                    entry.text
                )
            } else {
                format!(
                    r#"<div class="customer-feedback"><p>{}</p><p>by <span class="author">{}</span></p></div>"#,
                    entry.text, entry.author
                )
            }
        })
        .collect();
    page(&entries).into_response()
}

async fn read_fields(multipart: &mut Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        fields.insert(name, field.text().await.unwrap());
    }
    fields
}

fn err_json(msg: &str) -> Response {
    Json(json!({ "error": msg })).into_response()
}

async fn api_login(State(app): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let fields = read_fields(&mut multipart).await;
    let (Some(username), Some(password)) = (fields.get("username"), fields.get("password")) else {
        return err_json("missing credentials");
    };
    let mut inner = app.inner.lock().unwrap();
    let valid = inner
        .users
        .get(username)
        .is_some_and(|account| &account.password == password);
    if !valid {
        return err_json("wrong username or password");
    }
    let session = inner.new_session(username);
    (session_cookie(&session), Json(json!({ "result": username }))).into_response()
}

fn api_session_matches(app: &AppState, headers: &HeaderMap, username: &str) -> bool {
    session_user(app, headers).as_deref() == Some(username)
}

async fn api_add_address(
    State(app): State<Arc<AppState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !api_session_matches(&app, &headers, &username) {
        return err_json("not logged in");
    }
    if Sabotage::on(&app.sabotage.json_add_address_error) {
        return err_json("could not add address");
    }
    let fields = read_fields(&mut multipart).await;
    let address = Address {
        street: fields.get("street").cloned().unwrap_or_default(),
        zip: fields.get("zip").cloned().unwrap_or_default(),
        city: fields.get("city").cloned().unwrap_or_default(),
        country: fields.get("country").cloned().unwrap_or_default(),
        planet: fields.get("planet").cloned().unwrap_or_default(),
    };
    let mut inner = app.inner.lock().unwrap();
    if let Some(account) = inner.users.get_mut(&username) {
        account.addresses.push(address.clone());
    }
    Json(json!({ "result": address })).into_response()
}

async fn api_get_addresses(
    State(app): State<Arc<AppState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !api_session_matches(&app, &headers, &username) {
        return err_json("not logged in");
    }
    let inner = app.inner.lock().unwrap();
    let addresses = inner
        .users
        .get(&username)
        .map(|account| account.addresses.clone())
        .unwrap_or_default();
    Json(json!({ "result": addresses })).into_response()
}

async fn api_add_card(
    State(app): State<Arc<AppState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !api_session_matches(&app, &headers, &username) {
        return err_json("not logged in");
    }
    let fields = read_fields(&mut multipart).await;
    let number = fields.get("number").cloned().unwrap_or_default();
    let mut inner = app.inner.lock().unwrap();
    if let Some(account) = inner.users.get_mut(&username) {
        account.cards.push(number.clone());
    }
    Json(json!({ "result": { "number": number } })).into_response()
}

async fn api_get_cards(
    State(app): State<Arc<AppState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !api_session_matches(&app, &headers, &username) {
        return err_json("not logged in");
    }
    let inner = app.inner.lock().unwrap();
    let cards: Vec<serde_json::Value> = inner
        .users
        .get(&username)
        .map(|account| {
            account
                .cards
                .iter()
                .map(|number| json!({ "number": number }))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "result": cards })).into_response()
}

struct Directory(Arc<AppState>);

impl UserDirectory for Directory {
    fn by_username(&self, username: &str) -> Option<UserRecord> {
        self.0
            .inner
            .lock()
            .unwrap()
            .users
            .contains_key(username)
            .then(|| UserRecord {
                username: username.to_owned(),
            })
    }
}

pub struct MockRpc {
    app: Arc<AppState>,
    gate: AuthGate,
}

impl MockRpc {
    fn new(app: Arc<AppState>) -> Self {
        let gate = AuthGate::new(RSA_PUBLIC.to_vec(), Arc::new(Directory(app.clone())));
        Self { app, gate }
    }
}

#[tonic::async_trait]
impl ParcelPort for MockRpc {
    async fn login(
        &self,
        request: Request<pb::LoginRequest>,
    ) -> Result<TonicResponse<pb::LoginResponse>, Status> {
        let req = request.into_inner();
        let valid = self
            .app
            .inner
            .lock()
            .unwrap()
            .users
            .get(&req.username)
            .is_some_and(|account| account.password.as_bytes() == req.password.as_slice());
        if !valid {
            return Err(Status::permission_denied("wrong username or password"));
        }
        let auth_token = issue_token(&req.username, SigningAlgorithm::Rsa, RSA_PRIVATE)
            .map_err(|err| Status::internal(err.to_string()))?;
        Ok(TonicResponse::new(pb::LoginResponse { auth_token }))
    }

    async fn get_public_key(
        &self,
        _request: Request<pb::GetPublicKeyRequest>,
    ) -> Result<TonicResponse<pb::GetPublicKeyResponse>, Status> {
        let key = if Sabotage::on(&self.app.sabotage.wrong_public_key) {
            OTHER_RSA_PUBLIC
        } else {
            RSA_PUBLIC
        };
        Ok(TonicResponse::new(pb::GetPublicKeyResponse {
            key: String::from_utf8_lossy(key).into_owned(),
        }))
    }

    async fn add_address(
        &self,
        request: Request<pb::Address>,
    ) -> Result<TonicResponse<pb::AddAddressResponse>, Status> {
        let user = self.gate.authenticate(request.metadata())?;
        let address = Address::from(request.into_inner());
        let mut inner = self.app.inner.lock().unwrap();
        if let Some(account) = inner.users.get_mut(&user.username) {
            account.addresses.push(address);
        }
        Ok(TonicResponse::new(pb::AddAddressResponse {}))
    }

    async fn get_addresses(
        &self,
        request: Request<pb::GetAddressesRequest>,
    ) -> Result<TonicResponse<pb::AddressList>, Status> {
        let user = self.gate.authenticate(request.metadata())?;
        let inner = self.app.inner.lock().unwrap();
        let addresses = inner
            .users
            .get(&user.username)
            .map(|account| account.addresses.iter().map(pb::Address::from).collect())
            .unwrap_or_default();
        Ok(TonicResponse::new(pb::AddressList { addresses }))
    }

    async fn add_credit_card(
        &self,
        request: Request<pb::CreditCard>,
    ) -> Result<TonicResponse<pb::AddCreditCardResponse>, Status> {
        let user = self.gate.authenticate(request.metadata())?;
        let number = request.into_inner().number;
        let mut inner = self.app.inner.lock().unwrap();
        if let Some(account) = inner.users.get_mut(&user.username) {
            account.cards.push(number);
        }
        Ok(TonicResponse::new(pb::AddCreditCardResponse {}))
    }

    async fn get_credit_cards(
        &self,
        request: Request<pb::GetCreditCardsRequest>,
    ) -> Result<TonicResponse<pb::CreditCardList>, Status> {
        let user = self.gate.authenticate(request.metadata())?;
        let inner = self.app.inner.lock().unwrap();
        let cards = inner
            .users
            .get(&user.username)
            .map(|account| {
                account
                    .cards
                    .iter()
                    .map(|number| pb::CreditCard {
                        number: number.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(TonicResponse::new(pb::CreditCardList { cards }))
    }
}
