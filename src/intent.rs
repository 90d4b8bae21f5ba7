//! Client for the server endpoint that creates a PaymentIntent.
//!
//! The endpoint is called with `POST` and no body, and must answer with
//!
//! ```json
//! { "data": { "client_secret": "pi_…_secret_…" } }
//! ```

use gloo_net::http::Request;
use serde::Deserialize;

use crate::error::PaymentError;
use crate::processor::IntentSource;

#[derive(Deserialize)]
struct CreateIntentResponse {
    #[serde(default)]
    data: Option<CreateIntentData>,
}

#[derive(Deserialize)]
struct CreateIntentData {
    #[serde(default)]
    client_secret: Option<String>,
}

/// Extract `data.client_secret` from an endpoint response body.
///
/// An empty secret is treated the same as a missing one.
pub fn parse_intent_response(body: &str) -> Result<String, PaymentError> {
    let response: CreateIntentResponse =
        serde_json::from_str(body).map_err(PaymentError::MalformedResponse)?;
    response
        .data
        .and_then(|data| data.client_secret)
        .filter(|secret| !secret.is_empty())
        .ok_or(PaymentError::MissingClientSecret)
}

/// [`IntentSource`] backed by `fetch` (via `gloo-net`).
#[derive(Clone, Debug)]
pub struct HttpIntentSource {
    path: String,
}

impl HttpIntentSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl IntentSource for HttpIntentSource {
    async fn fetch_client_secret(&self) -> Result<String, PaymentError> {
        let response = Request::post(&self.path)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        // A secret in the body is honoured whatever the status; otherwise an
        // error status is the more useful diagnosis.
        parse_intent_response(&body).map_err(|err| {
            if response.ok() {
                err
            } else {
                log::error!("payment intent endpoint {} returned {status}", self.path);
                PaymentError::Http(status)
            }
        })
    }
}
