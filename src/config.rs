//! Widget configuration read from the host element, and the payment request
//! descriptor handed to `stripe.paymentRequest(...)`.
//!
//! The host page describes the purchase with attributes on the element the
//! button is mounted into:
//!
//! ```html
//! <div class="payment-request-form"
//!      data-stripe-publishable-key="pk_test_…"
//!      data-payment-intent-path="/checkout/payment_intent"
//!      data-item-total="2500"
//!      data-item-label="Order total"
//!      data-country="US"
//!      data-currency="usd"
//!      data-request-shipping="true"
//!      data-shipping-options='[{"id":"std","label":"Standard","amount":0}]'>
//! </div>
//! ```
//!
//! Attributes are parsed once into a [`WidgetConfig`]; required ones are
//! checked eagerly so a misconfigured page fails with a [`ConfigError`]
//! instead of a confusing Stripe.js exception later on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use web_sys::Element;

use crate::error::ConfigError;

/// Attribute names understood by [`WidgetConfig::from_attributes`].
pub mod attr {
    pub const PUBLISHABLE_KEY: &str = "stripe-publishable-key";
    pub const PAYMENT_INTENT_PATH: &str = "payment-intent-path";
    pub const ITEM_TOTAL: &str = "item-total";
    pub const ITEM_LABEL: &str = "item-label";
    pub const COUNTRY: &str = "country";
    pub const CURRENCY: &str = "currency";
    pub const REQUEST_NAME: &str = "request-name";
    pub const REQUEST_EMAIL: &str = "request-email";
    pub const REQUEST_SHIPPING: &str = "request-shipping";
    pub const SHIPPING_OPTIONS: &str = "shipping-options";
}

/// A shipping option offered in the wallet sheet.
///
/// Fields Stripe.js accepts but this crate does not interpret are kept in
/// `extra` so they survive a parse/serialize cycle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ShippingOption {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Minor currency units.
    pub amount: i64,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// `{ label, amount }` line shown as the total in the wallet sheet.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PaymentItem {
    pub label: String,
    pub amount: i64,
}

/// Options for `stripe.paymentRequest(...)`.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestOptions {
    pub country: String,
    pub currency: String,
    pub total: PaymentItem,
    pub request_payer_name: bool,
    pub request_payer_email: bool,
    pub request_shipping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_options: Option<Vec<ShippingOption>>,
}

/// Immutable configuration of one widget instance.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetConfig {
    pub publishable_key: String,
    pub payment_intent_path: String,
    pub currency: String,
    pub country: String,
    pub item_label: String,
    /// Minor currency units (e.g. cents).
    pub item_total: i64,
    pub request_payer_name: bool,
    pub request_payer_email: bool,
    pub request_shipping: bool,
    pub shipping_options: Option<Vec<ShippingOption>>,
}

impl WidgetConfig {
    /// Build a configuration from an attribute lookup.
    ///
    /// `get` receives the bare attribute name (e.g. `"item-total"`). Boolean
    /// flags are `true` only for the literal string `"true"`; when a flag is
    /// absent the Stripe defaults apply (payer name and email requested,
    /// shipping not requested).
    pub fn from_attributes<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            get(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingAttribute(name))
        };
        let flag = |name: &str, default: bool| get(name).map_or(default, |v| v == "true");

        let raw_total = required(attr::ITEM_TOTAL)?;
        let item_total = raw_total
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidAmount(raw_total.clone()))?;

        // The list is not read at all unless shipping is requested.
        let request_shipping = flag(attr::REQUEST_SHIPPING, false);
        let shipping_options = if request_shipping {
            get(attr::SHIPPING_OPTIONS)
                .filter(|v| !v.trim().is_empty())
                .map(|raw| parse_shipping_options(&raw))
                .transpose()?
        } else {
            None
        };

        Ok(Self {
            publishable_key: required(attr::PUBLISHABLE_KEY)?,
            payment_intent_path: required(attr::PAYMENT_INTENT_PATH)?,
            currency: required(attr::CURRENCY)?,
            country: required(attr::COUNTRY)?,
            item_label: required(attr::ITEM_LABEL)?,
            item_total,
            request_payer_name: flag(attr::REQUEST_NAME, true),
            request_payer_email: flag(attr::REQUEST_EMAIL, true),
            request_shipping,
            shipping_options,
        })
    }

    /// Read the configuration off a DOM element.
    ///
    /// `data-<name>` takes precedence over a plain `<name>` attribute.
    pub fn from_element(element: &Element) -> Result<Self, ConfigError> {
        Self::from_attributes(|name| {
            element
                .get_attribute(&format!("data-{name}"))
                .or_else(|| element.get_attribute(name))
        })
    }

    /// Descriptor for `stripe.paymentRequest(...)`.
    ///
    /// Shipping options are only sent when shipping is requested.
    pub fn payment_request_options(&self) -> PaymentRequestOptions {
        PaymentRequestOptions {
            country: self.country.clone(),
            currency: self.currency.clone(),
            total: PaymentItem {
                label: self.item_label.clone(),
                amount: self.item_total,
            },
            request_payer_name: self.request_payer_name,
            request_payer_email: self.request_payer_email,
            request_shipping: self.request_shipping,
            shipping_options: if self.request_shipping {
                self.shipping_options.clone()
            } else {
                None
            },
        }
    }
}

/// Parse the `shipping-options` attribute (a JSON array).
pub fn parse_shipping_options(raw: &str) -> Result<Vec<ShippingOption>, ConfigError> {
    serde_json::from_str(raw).map_err(ConfigError::InvalidShippingOptions)
}
