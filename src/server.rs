//! HTTP surface of the facilitator
//!
//! - `POST /verify` - verify a payment without moving funds
//! - `POST /settle` - submit a payment on-chain
//! - `GET /supported` - (scheme, network) pairs this instance serves
//! - `GET /health` - liveness probe
//!
//! `/verify` and `/settle` take `{x402Version, paymentHeader, paymentRequirements}` where
//! `paymentHeader` is the base64 JSON [`PaymentPayload`] a client sent in `X-PAYMENT`.
//! Rejected payments are ordinary 200 responses; only malformed requests and
//! infrastructure failures produce an error body `{code, message}`.

use crate::context::RequestContext;
use crate::facilitator::Facilitator;
use crate::types::{
    PaymentPayload, PaymentRequirements, SettleResponse, SupportedKinds, VerifyResponse,
    X402_VERSION,
};
use crate::X402Error;
use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

/// Body of `POST /verify` and `POST /settle`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorRequest {
    pub x402_version: u32,
    pub payment_header: String,
    pub payment_requirements: PaymentRequirements,
}

impl FacilitatorRequest {
    /// Check the protocol version and decode the payment header
    pub fn payment_payload(&self) -> Result<PaymentPayload, ApiError> {
        if self.x402_version != X402_VERSION {
            return Err(ApiError::bad_request(
                "invalid_x402_version",
                format!(
                    "unsupported x402Version {}, expected {}",
                    self.x402_version, X402_VERSION
                ),
            ));
        }
        let payload = PaymentPayload::from_base64(&self.payment_header).map_err(|e| {
            ApiError::bad_request(
                "invalid_payment_header",
                format!("paymentHeader is not a base64 JSON payment payload: {}", e),
            )
        })?;
        if payload.x402_version != X402_VERSION {
            return Err(ApiError::bad_request(
                "invalid_x402_version",
                format!(
                    "payment payload has x402Version {}, expected {}",
                    payload.x402_version, X402_VERSION
                ),
            ));
        }
        Ok(payload)
    }
}

/// Error body returned with every non-2xx status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// An error response: status plus `{code, message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl From<X402Error> for ApiError {
    fn from(err: X402Error) -> Self {
        let status = match &err {
            X402Error::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            X402Error::Timeout | X402Error::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            X402Error::Rpc { .. } | X402Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    facilitator: Arc<dyn Facilitator>,
    request_timeout: Duration,
}

impl AppState {
    fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

/// Build the facilitator router
///
/// Every verify or settle call runs under a fresh [`RequestContext`] that expires after
/// `request_timeout`.
pub fn create_router(facilitator: Arc<dyn Facilitator>, request_timeout: Duration) -> Router {
    let state = AppState {
        facilitator,
        request_timeout,
    };

    Router::new()
        .route("/verify", post(verify_handler))
        .route("/settle", post(settle_handler))
        .route("/supported", get(supported_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        )
}

/// Handle payment verification requests
async fn verify_handler(
    State(state): State<AppState>,
    Json(request): Json<FacilitatorRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let payload = request.payment_payload()?;
    let response = state
        .facilitator
        .verify(&state.request_context(), &payload, &request.payment_requirements)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, network = %payload.network, "verification failed");
            ApiError::from(e)
        })?;
    Ok(Json(response))
}

/// Handle payment settlement requests
async fn settle_handler(
    State(state): State<AppState>,
    Json(request): Json<FacilitatorRequest>,
) -> Result<Json<SettleResponse>, ApiError> {
    let payload = request.payment_payload()?;
    let response = state
        .facilitator
        .settle(&state.request_context(), &payload, &request.payment_requirements)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, network = %payload.network, "settlement failed");
            ApiError::from(e)
        })?;
    Ok(Json(response))
}

async fn supported_handler(State(state): State<AppState>) -> Json<SupportedKinds> {
    Json(state.facilitator.supported())
}

/// Health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION,
        "x402Version": X402_VERSION,
    }))
}
