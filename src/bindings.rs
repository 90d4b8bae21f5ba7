//! yew_stripe_payment_request/src/bindings.rs
//!
//! Low‐level wasm-bindgen bindings to the parts of Stripe.js v3 used by the
//! Payment Request Button.
//!
//! Exposes the raw Stripe.js handles (`JsStripe`, `JsElements`,
//! `JsPaymentRequest`, `JsPaymentRequestButton`, `JsPaymentMethodEvent`) and
//! their async methods via `js_sys::Promise`.
//! Higher-level wrappers live in `client.rs`.

use wasm_bindgen::prelude::*;
use web_sys::js_sys::{Function, Promise};
use web_sys::Element;

#[wasm_bindgen]
extern "C" {
    //------------------------------------------------------------------------------
    // Core Types
    //------------------------------------------------------------------------------

    /// Raw Stripe.js client handle.
    #[wasm_bindgen(js_name = Stripe)]
    #[derive(Debug, Clone)]
    pub type JsStripe;

    /// Raw Elements factory handle.
    #[wasm_bindgen(js_name = Elements)]
    #[derive(Debug, Clone)]
    pub type JsElements;

    /// Raw `PaymentRequest` handle returned by `stripe.paymentRequest(...)`.
    #[wasm_bindgen(js_name = PaymentRequest)]
    #[derive(Debug, Clone)]
    pub type JsPaymentRequest;

    /// Raw `paymentRequestButton` element handle.
    #[wasm_bindgen(js_name = PaymentRequestButtonElement)]
    #[derive(Debug, Clone)]
    pub type JsPaymentRequestButton;

    /// Event object passed to `paymentRequest.on("paymentmethod", ...)`.
    #[derive(Debug, Clone)]
    pub type JsPaymentMethodEvent;

    /// `event.paymentMethod`
    #[derive(Debug, Clone)]
    pub type JsPaymentMethod;

    /// `event.shippingOption`
    #[derive(Debug, Clone)]
    pub type JsShippingOption;

    //------------------------------------------------------------------------------
    // Constructors
    //------------------------------------------------------------------------------

    /// Construct a new `JsStripe` from your publishable key.
    ///
    /// ```js
    ///   const stripe = Stripe("pk_test_...");
    /// ```
    #[wasm_bindgen(catch, js_name = Stripe, js_namespace = window)]
    pub fn new_stripe(publishable_key: &str) -> Result<JsStripe, JsValue>;

    //------------------------------------------------------------------------------
    // Stripe
    //------------------------------------------------------------------------------

    /// `stripe.elements(options)` → `JsElements`
    #[wasm_bindgen(method, catch, js_name = elements)]
    pub fn elements(this: &JsStripe, options: JsValue) -> Result<JsElements, JsValue>;

    /// `stripe.paymentRequest(options)` → `JsPaymentRequest`
    #[wasm_bindgen(method, catch, js_name = paymentRequest)]
    pub fn payment_request(this: &JsStripe, options: JsValue) -> Result<JsPaymentRequest, JsValue>;

    /// `stripe.confirmCardPayment(clientSecret, data, options)` → JS `Promise`
    #[wasm_bindgen(method, catch, js_name = confirmCardPayment)]
    pub fn confirm_card_payment(
        this: &JsStripe,
        client_secret: &str,
        data: JsValue,
        options: JsValue,
    ) -> Result<Promise, JsValue>;

    /// `stripe.confirmCardPayment(clientSecret)` → JS `Promise`, letting
    /// Stripe.js run any pending next action (3-D Secure).
    #[wasm_bindgen(method, catch, js_name = confirmCardPayment)]
    pub fn confirm_card_payment_next_action(
        this: &JsStripe,
        client_secret: &str,
    ) -> Result<Promise, JsValue>;

    //------------------------------------------------------------------------------
    // Elements / button
    //------------------------------------------------------------------------------

    /// `elements.create("paymentRequestButton", options)` → `JsPaymentRequestButton`
    #[wasm_bindgen(method, catch, js_name = create)]
    pub fn create_element(
        this: &JsElements,
        element_type: &str,
        options: JsValue,
    ) -> Result<JsPaymentRequestButton, JsValue>;

    /// `button.mount(domElement)` → `()`
    #[wasm_bindgen(method, catch, js_name = mount)]
    pub fn mount(this: &JsPaymentRequestButton, target: &Element) -> Result<(), JsValue>;

    /// `button.unmount()` → `()`
    #[wasm_bindgen(method, catch, js_name = unmount)]
    pub fn unmount(this: &JsPaymentRequestButton) -> Result<(), JsValue>;

    //------------------------------------------------------------------------------
    // PaymentRequest
    //------------------------------------------------------------------------------

    /// `paymentRequest.canMakePayment()` → JS `Promise` of an object or `null`
    #[wasm_bindgen(method, catch, js_name = canMakePayment)]
    pub fn can_make_payment(this: &JsPaymentRequest) -> Result<Promise, JsValue>;

    /// `paymentRequest.on(eventName, handler)`
    #[wasm_bindgen(method, catch, js_name = on)]
    pub fn on(this: &JsPaymentRequest, event: &str, handler: &Function) -> Result<(), JsValue>;

    //------------------------------------------------------------------------------
    // paymentmethod event
    //------------------------------------------------------------------------------

    #[wasm_bindgen(method, getter = paymentMethod)]
    pub fn payment_method(this: &JsPaymentMethodEvent) -> JsPaymentMethod;

    #[wasm_bindgen(method, getter = payerName)]
    pub fn payer_name(this: &JsPaymentMethodEvent) -> Option<String>;

    #[wasm_bindgen(method, getter = payerEmail)]
    pub fn payer_email(this: &JsPaymentMethodEvent) -> Option<String>;

    #[wasm_bindgen(method, getter = walletName)]
    pub fn wallet_name(this: &JsPaymentMethodEvent) -> Option<String>;

    #[wasm_bindgen(method, getter = shippingOption)]
    pub fn shipping_option(this: &JsPaymentMethodEvent) -> Option<JsShippingOption>;

    /// `event.complete("success" | "fail")`
    #[wasm_bindgen(method, js_name = complete)]
    pub fn complete(this: &JsPaymentMethodEvent, status: &str);

    #[wasm_bindgen(method, getter = id)]
    pub fn id(this: &JsPaymentMethod) -> String;

    #[wasm_bindgen(method, getter = id)]
    pub fn shipping_option_id(this: &JsShippingOption) -> String;
}
