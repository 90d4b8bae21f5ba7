//! yew_stripe_payment_request/src/client.rs
//!
//! Stripe.js-backed implementation of the payment seams.
//!
//! This module provides:
//! - `StripeProcessor`, a [`PaymentProcessor`] that owns the `Stripe` instance
//!   and the `PaymentRequest`, runs `canMakePayment()`, mounts the
//!   `paymentRequestButton` element and calls `confirmCardPayment`.
//! - `StripePaymentMethodEvent`, the [`PaymentMethodEvent`] view over the
//!   object Stripe.js passes to `paymentRequest.on("paymentmethod", ...)`.
//! - `js_to_stripe_error()` to turn any thrown or rejected `JsValue` into a
//!   [`StripeError`].
//!
//! # Example Usage
//! ```rust,ignore
//! let config = WidgetConfig::from_element(&host)?;
//! let processor = StripeProcessor::new(&config, host.clone())?;
//! if processor.can_make_payment().await? {
//!     processor.mount_button()?;
//! }
//! ```

use std::cell::RefCell;

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Object, Promise, Reflect};
use web_sys::Element;
use serde_wasm_bindgen::from_value;

use crate::bindings::{
    new_stripe, JsPaymentMethodEvent, JsPaymentRequest, JsPaymentRequestButton, JsStripe,
};
use crate::config::WidgetConfig;
use crate::error::StripeError;
use crate::processor::{
    CompletionStatus, ConfirmCardPaymentOptions, IntentStatus, PaymentIntentInfo,
    PaymentMethodEvent, PaymentProcessor, PaymentResult,
};

/// Element type passed to `elements.create(...)`.
const BUTTON_ELEMENT: &str = "paymentRequestButton";

/// [`PaymentProcessor`] over a live Stripe.js instance.
#[derive(Debug)]
pub struct StripeProcessor {
    stripe: JsStripe,
    payment_request: JsPaymentRequest,
    host: Element,
    button: RefCell<Option<JsPaymentRequestButton>>,
}

impl StripeProcessor {
    /// Create the `Stripe` instance and its `PaymentRequest` for `config`.
    ///
    /// # Errors
    ///
    /// Returns `Err(StripeError)` if Stripe.js is not loaded or rejects the
    /// payment request options.
    pub fn new(config: &WidgetConfig, host: Element) -> Result<Self, StripeError> {
        let stripe = new_stripe(&config.publishable_key).map_err(js_to_stripe_error)?;
        let options = to_js(&config.payment_request_options())?;
        let payment_request = stripe
            .payment_request(options)
            .map_err(js_to_stripe_error)?;

        Ok(Self {
            stripe,
            payment_request,
            host,
            button: RefCell::new(None),
        })
    }

    /// The underlying `PaymentRequest`, for subscribing to its events.
    pub fn payment_request(&self) -> &JsPaymentRequest {
        &self.payment_request
    }

    /// Tear down the mounted button, if any.
    ///
    /// # Errors
    ///
    /// Returns `Err(StripeError)` if unmount fails.
    pub fn unmount_button(&self) -> Result<(), StripeError> {
        match self.button.borrow_mut().take() {
            Some(button) => button.unmount().map_err(js_to_stripe_error),
            None => Ok(()),
        }
    }
}

impl PaymentProcessor for StripeProcessor {
    async fn can_make_payment(&self) -> Result<bool, StripeError> {
        let promise = self
            .payment_request
            .can_make_payment()
            .map_err(js_to_stripe_error)?;
        // Resolves to an object describing the available wallets, or `null`.
        let result = JsFuture::from(promise)
            .await
            .map_err(js_to_stripe_error)?;
        Ok(result.is_truthy())
    }

    fn mount_button(&self) -> Result<(), StripeError> {
        let elements = self
            .stripe
            .elements(JsValue::UNDEFINED)
            .map_err(js_to_stripe_error)?;

        let options = Object::new();
        Reflect::set(
            &options,
            &JsValue::from_str("paymentRequest"),
            self.payment_request.as_ref(),
        )
        .map_err(js_to_stripe_error)?;

        let button = elements
            .create_element(BUTTON_ELEMENT, options.into())
            .map_err(js_to_stripe_error)?;
        button.mount(&self.host).map_err(js_to_stripe_error)?;

        *self.button.borrow_mut() = Some(button);
        Ok(())
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method_id: &str,
        options: ConfirmCardPaymentOptions,
    ) -> PaymentResult {
        let data = match to_js(&serde_json::json!({ "payment_method": payment_method_id })) {
            Ok(data) => data,
            Err(err) => return PaymentResult::Error(err),
        };
        let options = match to_js(&options) {
            Ok(options) => options,
            Err(err) => return PaymentResult::Error(err),
        };
        await_confirmation(self.stripe.confirm_card_payment(client_secret, data, options)).await
    }

    async fn handle_card_action(&self, client_secret: &str) -> PaymentResult {
        await_confirmation(self.stripe.confirm_card_payment_next_action(client_secret)).await
    }
}

/// [`PaymentMethodEvent`] over the Stripe.js `paymentmethod` event object.
#[derive(Debug, Clone)]
pub struct StripePaymentMethodEvent(JsPaymentMethodEvent);

impl From<JsValue> for StripePaymentMethodEvent {
    fn from(value: JsValue) -> Self {
        Self(value.unchecked_into())
    }
}

impl PaymentMethodEvent for StripePaymentMethodEvent {
    fn payment_method_id(&self) -> String {
        self.0.payment_method().id()
    }

    fn payer_name(&self) -> Option<String> {
        self.0.payer_name()
    }

    fn payer_email(&self) -> Option<String> {
        self.0.payer_email()
    }

    fn wallet_name(&self) -> Option<String> {
        self.0.wallet_name()
    }

    fn shipping_option_id(&self) -> Option<String> {
        self.0.shipping_option().map(|option| option.shipping_option_id())
    }

    fn complete(&self, status: CompletionStatus) {
        self.0.complete(status.as_str());
    }
}

/// Await a `confirmCardPayment` promise and read `{ error }` or
/// `{ paymentIntent }` off the result.
pub(crate) async fn await_confirmation(call: Result<Promise, JsValue>) -> PaymentResult {
    let promise = match call {
        Ok(p) => p,
        Err(e) => return PaymentResult::Error(js_to_stripe_error(e)),
    };

    let result = match JsFuture::from(promise).await {
        Ok(result) => result,
        Err(js_err) => return PaymentResult::Error(js_to_stripe_error(js_err)),
    };

    let error = property(&result, "error");
    if !error.is_undefined() && !error.is_null() {
        return PaymentResult::Error(js_to_stripe_error(error));
    }

    let intent = property(&result, "paymentIntent");
    if intent.is_undefined() || intent.is_null() {
        return PaymentResult::Error(StripeError::message(
            "confirmation returned neither an error nor a payment intent",
        ));
    }

    PaymentResult::Success(PaymentIntentInfo {
        id: property(&intent, "id").as_string().unwrap_or_default(),
        status: property(&intent, "status")
            .as_string()
            .map(|s| IntentStatus::from(s.as_str()))
            .unwrap_or_else(|| IntentStatus::Other(String::new())),
    })
}

fn property(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Serialize into a plain JS object (not a `Map`), as Stripe.js expects.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, StripeError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(serde_error_to_stripe_error)
}

/// Convert any caught `JsValue` into a `StripeError` with best effort.
pub fn js_to_stripe_error(value: JsValue) -> StripeError {
    from_value::<StripeError>(value.clone()).unwrap_or_else(|_| StripeError {
        message: value.as_string().unwrap_or_else(|| format!("{:?}", value)),
        error_type: None,
        code: None,
    })
}

/// Convert a `serde_wasm_bindgen::Error` (from serialization) into `StripeError`.
fn serde_error_to_stripe_error(err: serde_wasm_bindgen::Error) -> StripeError {
    StripeError::message(err.to_string())
}
