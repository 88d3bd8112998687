//! Thin typed wrapper over the server's JSON API

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    AdminBookingView, AuthResponse, Booking, BookingStatus, ClientBookingView, Companion,
    CompanionFilter, CreateBookingRequest, ErrorBody, LoginRequest, RefundQuote, RegisterRequest,
    TransitionRequest, TransitionResponse,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not logged in. Run 'sathi login' to authenticate")]
    NotLoggedIn,
    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NotLoggedIn)?;
        Ok(req.bearer_auth(token))
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let resp = self.http.post(self.url("/auth/register")).json(req).send().await?;
        parse(resp).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let resp = self.http.post(self.url("/auth/login")).json(req).send().await?;
        parse(resp).await
    }

    pub async fn companions(&self, filter: &CompanionFilter) -> Result<Vec<Companion>, ApiError> {
        let resp = self
            .http
            .get(self.url("/companions"))
            .query(filter)
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn create_booking(&self, req: &CreateBookingRequest) -> Result<Booking, ApiError> {
        let resp = self
            .authed(self.http.post(self.url("/bookings")))?
            .json(req)
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn my_bookings(&self) -> Result<Vec<ClientBookingView>, ApiError> {
        let resp = self.authed(self.http.get(self.url("/bookings")))?.send().await?;
        parse(resp).await
    }

    pub async fn active_bookings(&self) -> Result<Vec<ClientBookingView>, ApiError> {
        let resp = self
            .authed(self.http.get(self.url("/bookings/active")))?
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn transition(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<TransitionResponse, ApiError> {
        let url = self.url(&format!("/bookings/{}/status", booking_id));
        let resp = self
            .authed(self.http.post(url))?
            .json(&TransitionRequest { status })
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn refund_quote(&self, booking_id: &str) -> Result<RefundQuote, ApiError> {
        let url = self.url(&format!("/bookings/{}/refund-quote", booking_id));
        let resp = self.authed(self.http.get(url))?.send().await?;
        parse(resp).await
    }

    pub async fn admin_bookings(&self) -> Result<Vec<AdminBookingView>, ApiError> {
        let resp = self
            .authed(self.http.get(self.url("/admin/bookings")))?
            .send()
            .await?;
        parse(resp).await
    }
}

async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!("{} -> {}", status, body);
    Err(ApiError::Status {
        status,
        message: error_message(status, &body),
    })
}

/// Prefer the server's `{"error": ...}` body, then raw text, then the reason phrase
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status.canonical_reason().unwrap_or("unknown error").to_string()
}
