//! A Yew payment request button for your app to drop in.
//!
//! This component loads Stripe.js, mounts the wallet button once the browser
//! reports it can pay, runs the confirmation flow when the customer authorizes
//! in the wallet sheet, and reports every lifecycle step to your app. The same
//! events are dispatched on the component's host `<div>` and bubble, so
//! non-Yew code on the page can listen too.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use web_sys::Element;
use yew::prelude::*;

use crate::config::{ShippingOption, WidgetConfig};
use crate::events::{DomEventSink, EventSink, WidgetEvent};
use crate::use_stripejs;
use crate::widget::PaymentRequestWidget;

/// Properties for the [`PaymentRequestButton`] component.
///
/// # Fields
///
/// * `publishable_key` – Your Stripe Publishable Key (`pk_…`).
/// * `payment_intent_path` – Endpoint that creates a PaymentIntent (`POST`,
///   answers `{ "data": { "client_secret": … } }`).
/// * `item_total` – Amount in minor currency units.
/// * `request_payer_name` / `request_payer_email` – default `true`.
/// * `on_event` – Invoked with every [`WidgetEvent`].
/// * `on_payment_data` – Invoked after `payment_succeeded` with the form
///   fields to submit alongside your order.
#[derive(Properties, PartialEq, Clone)]
pub struct PaymentRequestButtonProps {
    pub publishable_key: AttrValue,
    pub payment_intent_path: AttrValue,
    pub currency: AttrValue,
    pub country: AttrValue,
    pub item_label: AttrValue,
    pub item_total: i64,
    #[prop_or(true)]
    pub request_payer_name: bool,
    #[prop_or(true)]
    pub request_payer_email: bool,
    #[prop_or_default]
    pub request_shipping: bool,
    #[prop_or_default]
    pub shipping_options: Option<Vec<ShippingOption>>,
    #[prop_or_default]
    pub on_event: Callback<WidgetEvent>,
    #[prop_or_default]
    pub on_payment_data: Callback<Vec<(String, String)>>,
    #[prop_or_default]
    pub class: Classes,
}

impl PaymentRequestButtonProps {
    fn widget_config(&self) -> WidgetConfig {
        WidgetConfig {
            publishable_key: self.publishable_key.to_string(),
            payment_intent_path: self.payment_intent_path.to_string(),
            currency: self.currency.to_string(),
            country: self.country.to_string(),
            item_label: self.item_label.to_string(),
            item_total: self.item_total,
            request_payer_name: self.request_payer_name,
            request_payer_email: self.request_payer_email,
            request_shipping: self.request_shipping,
            shipping_options: self.shipping_options.clone(),
        }
    }
}

/// Yew function component rendering a Stripe Payment Request Button.
///
/// The widget is created once, after Stripe.js has loaded; later prop changes
/// do not rebuild it.
///
/// # Example
///
/// ```rust,ignore
/// use yew::prelude::*;
/// use yew_stripe_payment_request::{PaymentRequestButton, WidgetEvent};
///
/// #[function_component(Checkout)]
/// fn checkout() -> Html {
///     let on_event = Callback::from(|event: WidgetEvent| {
///         log::info!("wallet payment: {event}");
///     });
///
///     html! {
///         <PaymentRequestButton
///             publishable_key="pk_test_123"
///             payment_intent_path="/checkout/payment_intent"
///             currency="usd"
///             country="US"
///             item_label="Order total"
///             item_total={2500}
///             {on_event}
///         />
///     }
/// }
/// ```
#[function_component(PaymentRequestButton)]
pub fn payment_request_button(props: &PaymentRequestButtonProps) -> Html {
    let stripe_ready = use_stripejs();
    let host = use_node_ref();
    let widget = use_mut_ref(|| None::<PaymentRequestWidget>);

    {
        let host = host.clone();
        let widget = widget.clone();
        let props = props.clone();
        use_effect_with(stripe_ready, move |ready| {
            if *ready && widget.borrow().is_none() {
                if let Some(element) = host.cast::<Element>() {
                    mount(element, &props, &widget);
                }
            }
            || ()
        });
    }

    html! {
        <div ref={host} class={classes!("payment-request-button", props.class.clone())} />
    }
}

fn mount(
    element: Element,
    props: &PaymentRequestButtonProps,
    slot: &Rc<RefCell<Option<PaymentRequestWidget>>>,
) {
    let sink = DomEventSink::new(element.clone()).with_observer(forward_events(
        Rc::downgrade(slot),
        props.on_event.clone(),
        props.on_payment_data.clone(),
    ));

    match PaymentRequestWidget::with_config(element, props.widget_config(), sink.clone()) {
        Ok(created) => *slot.borrow_mut() = Some(created),
        Err(err) => {
            log::error!("PaymentRequestButton: failed to create payment request: {err}");
            sink.emit(WidgetEvent::InitFailed);
        }
    }
}

/// Observer feeding the component callbacks. Holds the widget slot weakly:
/// the widget owns the sink that owns this closure.
fn forward_events(
    slot: Weak<RefCell<Option<PaymentRequestWidget>>>,
    on_event: Callback<WidgetEvent>,
    on_payment_data: Callback<Vec<(String, String)>>,
) -> impl Fn(WidgetEvent) + 'static {
    move |event| {
        if event == WidgetEvent::PaymentSucceeded {
            if let Some(slot) = slot.upgrade() {
                if let Some(widget) = slot.borrow().as_ref() {
                    let mut fields = Vec::new();
                    widget.form().prepare_submit(&mut fields);
                    on_payment_data.emit(fields);
                }
            }
        }
        on_event.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn observer_does_not_keep_widget_slot_alive() {
        let slot = Rc::new(RefCell::new(None::<PaymentRequestWidget>));
        let observer = forward_events(Rc::downgrade(&slot), Callback::noop(), Callback::noop());

        assert_eq!(Rc::strong_count(&slot), 1);
        drop(slot);
        observer(WidgetEvent::PaymentSucceeded);
    }

    #[test]
    fn events_are_forwarded_after_slot_is_dropped() {
        let seen = Rc::new(Cell::new(0));
        let payloads = Rc::new(Cell::new(0));
        let on_event = {
            let seen = Rc::clone(&seen);
            Callback::from(move |_: WidgetEvent| seen.set(seen.get() + 1))
        };
        let on_payment_data = {
            let payloads = Rc::clone(&payloads);
            Callback::from(move |_: Vec<(String, String)>| payloads.set(payloads.get() + 1))
        };

        let slot = Rc::new(RefCell::new(None::<PaymentRequestWidget>));
        let observer = forward_events(Rc::downgrade(&slot), on_event, on_payment_data);
        drop(slot);

        observer(WidgetEvent::PaymentSucceeded);
        observer(WidgetEvent::PaymentFinished);
        assert_eq!(seen.get(), 2);
        assert_eq!(payloads.get(), 0);
    }
}
