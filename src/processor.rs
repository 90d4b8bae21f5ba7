//! The three seams the payment flow talks through: the payment processor
//! library, the wallet sheet's `paymentmethod` event, and the server endpoint
//! that creates payment intents.
//!
//! Stripe.js-backed implementations live in [`crate::client`] and
//! [`crate::intent`]; tests drive the flow with in-memory ones.

#![allow(async_fn_in_trait)]

use serde::Serialize;

use crate::error::{PaymentError, StripeError};

/// Lifecycle state of a PaymentIntent as reported by Stripe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Other(String),
}

impl IntentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Other(s) => s,
        }
    }

    /// The intent needs a further customer step (e.g. 3-D Secure).
    pub fn requires_action(&self) -> bool {
        matches!(self, IntentStatus::RequiresAction)
    }
}

impl From<&str> for IntentStatus {
    fn from(value: &str) -> Self {
        match value {
            "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "requires_action" => IntentStatus::RequiresAction,
            "processing" => IntentStatus::Processing,
            "requires_capture" => IntentStatus::RequiresCapture,
            "canceled" => IntentStatus::Canceled,
            "succeeded" => IntentStatus::Succeeded,
            other => IntentStatus::Other(other.to_string()),
        }
    }
}

/// Minimal representation of a confirmed PaymentIntent.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentIntentInfo {
    /// Stripe’s identifier, e.g. `pi_1Fxxxxxx`.
    pub id: String,
    pub status: IntentStatus,
}

/// Outcome of a confirmation call.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentResult {
    /// Stripe accepted the confirmation.
    Success(PaymentIntentInfo),
    /// Stripe reported an error, or the call itself failed.
    Error(StripeError),
}

/// Third argument of `stripe.confirmCardPayment(secret, data, options)`.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCardPaymentOptions {
    /// `false` defers next actions (3-D Secure) to a later call.
    pub handle_actions: bool,
}

/// What the wallet sheet should do after an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionStatus {
    /// Close the sheet.
    Success,
    /// Let the browser re-show the sheet or display its own error.
    Fail,
}

impl CompletionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            CompletionStatus::Success => "success",
            CompletionStatus::Fail => "fail",
        }
    }
}

/// The payment processor's client library, reduced to what the widget uses.
pub trait PaymentProcessor {
    /// Whether this browser/device can present a wallet sheet.
    async fn can_make_payment(&self) -> Result<bool, StripeError>;

    /// Render the wallet button into the host element.
    fn mount_button(&self) -> Result<(), StripeError>;

    /// Confirm the intent behind `client_secret` with the collected payment
    /// method.
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method_id: &str,
        options: ConfirmCardPaymentOptions,
    ) -> PaymentResult;

    /// Let the library run whatever next action the intent requires.
    async fn handle_card_action(&self, client_secret: &str) -> PaymentResult;
}

/// The `paymentmethod` event raised when the customer authorizes payment in
/// the wallet sheet. Only the fields the widget reads are exposed.
pub trait PaymentMethodEvent {
    fn payment_method_id(&self) -> String;

    fn payer_name(&self) -> Option<String> {
        None
    }

    fn payer_email(&self) -> Option<String> {
        None
    }

    /// e.g. `"applePay"`, `"googlePay"`.
    fn wallet_name(&self) -> Option<String> {
        None
    }

    fn shipping_option_id(&self) -> Option<String> {
        None
    }

    /// Report the outcome back to the wallet sheet.
    fn complete(&self, status: CompletionStatus);
}

/// Server endpoint that creates a PaymentIntent and returns its secret.
pub trait IntentSource {
    async fn fetch_client_secret(&self) -> Result<String, PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("requires_action", true)]
    #[case("succeeded", false)]
    #[case("processing", false)]
    #[case("requires_source_action", false)]
    fn only_requires_action_needs_a_next_step(#[case] raw: &str, #[case] expected: bool) {
        let status = IntentStatus::from(raw);
        assert_eq!(status.requires_action(), expected);
        assert_eq!(status.as_str(), raw);
    }

    #[rstest]
    fn confirm_options_use_stripe_field_name() {
        let json = serde_json::to_value(ConfirmCardPaymentOptions { handle_actions: false }).unwrap();
        assert_eq!(json, serde_json::json!({ "handleActions": false }));
    }
}
