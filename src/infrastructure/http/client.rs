//! HTTP reservation gateway
//!
//! Speaks the marketplace REST API over reqwest. Every request carries a
//! fresh `X-Request-Id` so backend logs can be correlated with client
//! traces; reservation creation additionally carries the caller's bearer
//! token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::dto::{ApiErrorBody, CreateReservationRequest, CreatedReservationDto, ReservationDto};
use crate::domain::error::GatewayError;
use crate::domain::identity::IdentityProvider;
use crate::domain::reservation::{
    GatewayResult, NewReservation, Reservation, ReservationConfirmation, ReservationGateway,
};

const X_REQUEST_ID: &str = "X-Request-Id";

/// Configuration for the HTTP gateway
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Base URL of the marketplace API (e.g. "https://api.example.com")
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Reservation gateway backed by the marketplace REST API.
pub struct HttpReservationGateway {
    client: reqwest::Client,
    base_url: String,
    identity: Arc<dyn IdentityProvider>,
}

impl HttpReservationGateway {
    pub fn new(
        config: HttpGatewayConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            identity,
        })
    }

    async fn fetch_reservations(&self, product_id: i64) -> GatewayResult<Vec<Reservation>> {
        let url = format!("{}/reservations/product/{}", self.base_url, product_id);
        let request_id = Uuid::new_v4().to_string();
        debug!(url = %url, request_id = %request_id, "GET reservations");

        let response = self
            .client
            .get(&url)
            .header(X_REQUEST_ID, &request_id)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response).await?;
        let rows: Vec<ReservationDto> = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("reservation list: {}", e)))?;

        let total = rows.len();
        let reservations: Vec<Reservation> =
            rows.into_iter().filter_map(ReservationDto::into_domain).collect();
        if reservations.len() < total {
            warn!(
                product_id,
                dropped = total - reservations.len(),
                "Some reservation rows were malformed and dropped"
            );
        }
        Ok(reservations)
    }

    async fn post_reservation(
        &self,
        request: &NewReservation,
    ) -> GatewayResult<ReservationConfirmation> {
        let identity = self
            .identity
            .current_identity()
            .await
            .ok_or_else(|| GatewayError::Unauthorized("no signed-in user".into()))?;

        let body = CreateReservationRequest::from_domain(request);
        body.validate()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let url = format!("{}/reservations", self.base_url);
        let request_id = Uuid::new_v4().to_string();
        debug!(url = %url, request_id = %request_id, "POST reservation");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&identity.bearer_token)
            .header(X_REQUEST_ID, &request_id)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response).await?;
        let created: CreatedReservationDto = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("created reservation: {}", e)))?;

        Ok(created.into_domain())
    }
}

#[async_trait]
impl ReservationGateway for HttpReservationGateway {
    #[instrument(skip(self))]
    async fn reservations_for_product(&self, product_id: i64) -> GatewayResult<Vec<Reservation>> {
        let started = Instant::now();
        let result = self.fetch_reservations(product_id).await;
        match &result {
            Ok(list) => {
                observe("fetch", "ok", started);
                info!(product_id, count = list.len(), "Fetched reservations");
            }
            Err(err) => {
                observe("fetch", "error", started);
                warn!(product_id, error = %err, "Reservation fetch failed");
            }
        }
        result
    }

    #[instrument(skip(self, request), fields(product_id = request.product_id))]
    async fn create_reservation(
        &self,
        request: &NewReservation,
    ) -> GatewayResult<ReservationConfirmation> {
        let started = Instant::now();
        let result = self.post_reservation(request).await;
        match &result {
            Ok(confirmation) => {
                observe("create", "ok", started);
                info!(
                    reservation_id = confirmation.reservation_id,
                    "Reservation created"
                );
            }
            Err(err) => {
                observe("create", "error", started);
                warn!(error = %err, "Reservation creation failed");
            }
        }
        result
    }
}

fn observe(method: &'static str, outcome: &'static str, started: Instant) {
    metrics::histogram!("booking_api_request_seconds", "method" => method)
        .record(started.elapsed().as_secs_f64());
    metrics::counter!("booking_api_requests_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(err.to_string())
    } else if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else {
        GatewayError::Network(err.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(map_status_error(status, body))
}

fn map_status_error(status: StatusCode, body: String) -> GatewayError {
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("status {}", status)
            } else {
                body
            }
        });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        GatewayError::Unauthorized(message)
    } else if status == StatusCode::CONFLICT {
        GatewayError::Conflict(message)
    } else if status.is_server_error() {
        GatewayError::Server {
            status: status.as_u16(),
        }
    } else {
        GatewayError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
