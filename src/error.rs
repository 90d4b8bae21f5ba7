//! Error types shared by the configuration layer, the payment flow and the
//! Stripe.js bindings.
//!
//! None of these ever cross the widget boundary: the form turns every failure
//! into a lifecycle event and a log line.

use serde::Deserialize;
use thiserror::Error;

/// Host element attributes could not be turned into a [`WidgetConfig`].
///
/// [`WidgetConfig`]: crate::config::WidgetConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required attribute is absent or blank.
    #[error("missing required attribute `{0}`")]
    MissingAttribute(&'static str),

    /// `item-total` is not an integer amount of minor currency units.
    #[error("`item-total` must be an integer amount in minor currency units, got {0:?}")]
    InvalidAmount(String),

    /// `shipping-options` is not a JSON list of shipping options.
    #[error("`shipping-options` is not a valid list of shipping options: {0}")]
    InvalidShippingOptions(#[source] serde_json::Error),
}

/// Anything that can go wrong between "user authorized" and "intent confirmed".
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The request to the payment intent endpoint never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status and no usable body.
    #[error("payment intent endpoint responded with status {0}")]
    Http(u16),

    /// The endpoint body is not JSON.
    #[error("malformed payment intent response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The body is JSON but has no `data.client_secret`.
    #[error("missing payment intent")]
    MissingClientSecret,

    /// Stripe.js threw or rejected outside of a confirmation result.
    #[error(transparent)]
    Stripe(#[from] StripeError),

    /// The confirmation payload could not be serialized.
    #[error("failed to serialize payment data: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Representation of a Stripe.js error object.
#[derive(Clone, Debug, Deserialize, PartialEq, Error)]
#[error("{message}")]
pub struct StripeError {
    /// Human-readable message.
    pub message: String,
    /// Stripe’s error type, e.g. `"card_error"`.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Optional Stripe error code, e.g. `"card_declined"`.
    #[serde(default)]
    pub code: Option<String>,
}

impl StripeError {
    /// Error with only a message, for failures that did not come from Stripe's
    /// own error objects.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            code: None,
        }
    }
}
