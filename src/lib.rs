pub mod bindings;
pub mod client;
pub mod component;
pub mod config;
pub mod error;
pub mod events;
pub mod form;
pub mod intent;
pub mod interop;
pub mod processor;
pub mod widget;

pub use bindings::*;
pub use client::{js_to_stripe_error, StripePaymentMethodEvent, StripeProcessor};
pub use component::*;
pub use config::{PaymentRequestOptions, ShippingOption, WidgetConfig};
pub use error::{ConfigError, PaymentError, StripeError};
pub use events::{DomEventSink, EventSink, WidgetEvent};
pub use form::{ConfirmationPayload, PaymentRequestForm, PAYMENT_DATA_PARAM};
pub use intent::HttpIntentSource;
pub use interop::{load_stripejs, use_stripejs};
pub use processor::*;
pub use widget::{PaymentRequestWidget, StripePaymentRequestForm};
