//! Page integration: attach a payment request form to a host element.
//!
//! From Rust:
//!
//! ```rust,ignore
//! let widget = PaymentRequestWidget::attach(host).await?;
//! // later, when the page submits its form:
//! let mut fields = Vec::new();
//! widget.form().prepare_submit(&mut fields);
//! ```
//!
//! From JavaScript (the same type is exported through wasm-bindgen):
//!
//! ```js
//! const widget = await PaymentRequestWidget.attach(el);
//! el.addEventListener("payment_succeeded", () => {
//!   const params = [];
//!   widget.prepareSubmit(params); // [["stripe_payment_data", "{…}"]]
//! });
//! ```

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::js_sys::{Array, Object, Reflect};
use web_sys::Element;

use crate::client::{StripePaymentMethodEvent, StripeProcessor};
use crate::config::WidgetConfig;
use crate::error::StripeError;
use crate::events::DomEventSink;
use crate::form::PaymentRequestForm;
use crate::intent::HttpIntentSource;
use crate::interop::{leak_closure, load_stripejs};

/// The form as wired up against Stripe.js, `fetch` and the DOM.
pub type StripePaymentRequestForm =
    PaymentRequestForm<StripeProcessor, HttpIntentSource, DomEventSink>;

/// A payment request button mounted into a host element.
#[wasm_bindgen]
#[derive(Clone)]
pub struct PaymentRequestWidget {
    form: Rc<StripePaymentRequestForm>,
}

impl PaymentRequestWidget {
    /// Build the form for `config`, subscribe to the wallet sheet's events and
    /// start the capability check. Stripe.js must already be loaded.
    ///
    /// `init_succeeded` / `init_failed` are dispatched on `sink`'s element once
    /// the check completes.
    pub fn with_config(
        host: Element,
        config: WidgetConfig,
        sink: DomEventSink,
    ) -> Result<Self, StripeError> {
        let processor = StripeProcessor::new(&config, host)?;
        let intents = HttpIntentSource::new(config.payment_intent_path.clone());
        let form = Rc::new(PaymentRequestForm::new(config, processor, intents, sink));

        subscribe(&form)?;

        let init = Rc::clone(&form);
        wasm_bindgen_futures::spawn_local(async move {
            init.init().await;
        });

        Ok(Self { form })
    }

    pub fn form(&self) -> &StripePaymentRequestForm {
        &self.form
    }
}

#[wasm_bindgen]
impl PaymentRequestWidget {
    /// Read the configuration from `element`'s attributes and attach.
    /// Stripe.js must already be loaded; see [`PaymentRequestWidget::attach`].
    #[wasm_bindgen(constructor)]
    pub fn new(element: Element) -> Result<PaymentRequestWidget, JsValue> {
        let config =
            WidgetConfig::from_element(&element).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let sink = DomEventSink::new(element.clone());
        Self::with_config(element, config, sink).map_err(|e| JsValue::from_str(&e.message))
    }

    /// Load Stripe.js if needed, then attach to `element`.
    pub async fn attach(element: Element) -> Result<PaymentRequestWidget, JsValue> {
        load_stripejs().await?;
        Self::new(element)
    }

    /// Push the accumulated `[name, value]` pairs onto `params`.
    #[wasm_bindgen(js_name = prepareSubmit)]
    pub fn prepare_submit(&self, params: &Array) {
        let mut pairs = Vec::new();
        self.form.prepare_submit(&mut pairs);
        for (name, value) in pairs {
            params.push(&Array::of2(&JsValue::from_str(&name), &JsValue::from_str(&value)));
        }
    }

    /// Accumulated parameters as a plain object.
    pub fn params(&self) -> Object {
        let params = Object::new();
        for (name, value) in self.form.params() {
            let _ = Reflect::set(&params, &JsValue::from_str(&name), &JsValue::from_str(&value));
        }
        params
    }

    /// Name of the last dispatched event, if any.
    #[wasm_bindgen(js_name = lastEvent)]
    pub fn last_event(&self) -> Option<String> {
        self.form.last_event().map(|e| e.as_str().to_string())
    }

    /// Remove the button from the page.
    pub fn unmount(&self) -> Result<(), JsValue> {
        self.form
            .processor()
            .unmount_button()
            .map_err(|e| JsValue::from_str(&e.message))
    }
}

/// Route the `PaymentRequest`'s `paymentmethod` and `cancel` events into the
/// form. The handlers live as long as the page.
fn subscribe(form: &Rc<StripePaymentRequestForm>) -> Result<(), StripeError> {
    let payment_request = form.processor().payment_request();

    let on_payment_method = {
        let form = Rc::clone(form);
        leak_closure(move |event: JsValue| {
            let form = Rc::clone(&form);
            wasm_bindgen_futures::spawn_local(async move {
                form.handle_payment_method(StripePaymentMethodEvent::from(event))
                    .await;
            });
        })
    };
    payment_request
        .on("paymentmethod", &on_payment_method)
        .map_err(crate::client::js_to_stripe_error)?;

    let on_cancel = {
        let form = Rc::clone(form);
        leak_closure(move |_| form.handle_cancel())
    };
    payment_request
        .on("cancel", &on_cancel)
        .map_err(crate::client::js_to_stripe_error)?;

    Ok(())
}
