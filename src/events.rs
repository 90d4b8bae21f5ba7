//! Lifecycle events dispatched on the host element.
//!
//! Page code observes the widget by listening on the host element (or any
//! ancestor, since every event bubbles). Events carry no payload; the
//! confirmation data is read through
//! [`PaymentRequestForm::prepare_submit`](crate::form::PaymentRequestForm::prepare_submit).

use std::fmt;
use std::rc::Rc;

use web_sys::{CustomEvent, CustomEventInit, Element};

/// Every event the widget can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetEvent {
    InitSucceeded,
    InitFailed,
    PaymentStarted,
    PaymentFailed,
    PaymentSucceeded,
    AdditionalActionFailed,
    AdditionalActionSucceeded,
    PaymentCancelled,
    PaymentFinished,
}

impl WidgetEvent {
    /// DOM event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            WidgetEvent::InitSucceeded => "init_succeeded",
            WidgetEvent::InitFailed => "init_failed",
            WidgetEvent::PaymentStarted => "payment_started",
            WidgetEvent::PaymentFailed => "payment_failed",
            WidgetEvent::PaymentSucceeded => "payment_succeeded",
            WidgetEvent::AdditionalActionFailed => "additional_action_failed",
            WidgetEvent::AdditionalActionSucceeded => "additional_action_succeeded",
            WidgetEvent::PaymentCancelled => "payment_cancelled",
            WidgetEvent::PaymentFinished => "payment_finished",
        }
    }
}

impl fmt::Display for WidgetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for lifecycle events.
pub trait EventSink {
    fn emit(&self, event: WidgetEvent);
}

impl<T: EventSink + ?Sized> EventSink for Rc<T> {
    fn emit(&self, event: WidgetEvent) {
        (**self).emit(event)
    }
}

/// Dispatches each event as a bubbling, composed `CustomEvent` on the host
/// element, then hands it to an optional in-process observer.
#[derive(Clone)]
pub struct DomEventSink {
    element: Element,
    observer: Option<Rc<dyn Fn(WidgetEvent)>>,
}

impl DomEventSink {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            observer: None,
        }
    }

    /// Also call `observer` after every dispatch. Used by the Yew component to
    /// forward events into a `Callback`.
    pub fn with_observer(mut self, observer: impl Fn(WidgetEvent) + 'static) -> Self {
        self.observer = Some(Rc::new(observer));
        self
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl EventSink for DomEventSink {
    fn emit(&self, event: WidgetEvent) {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_composed(true);

        match CustomEvent::new_with_event_init_dict(event.as_str(), &init) {
            Ok(dom_event) => {
                if let Err(err) = self.element.dispatch_event(&dom_event) {
                    log::error!("PaymentRequestForm: failed to dispatch \"{event}\": {err:?}");
                } else {
                    log::debug!("PaymentRequestForm: dispatched event \"{event}\"");
                }
            }
            Err(err) => log::error!("PaymentRequestForm: failed to create \"{event}\": {err:?}"),
        }

        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::RefCell;

    #[rstest]
    #[case(WidgetEvent::InitSucceeded, "init_succeeded")]
    #[case(WidgetEvent::InitFailed, "init_failed")]
    #[case(WidgetEvent::PaymentStarted, "payment_started")]
    #[case(WidgetEvent::PaymentFailed, "payment_failed")]
    #[case(WidgetEvent::PaymentSucceeded, "payment_succeeded")]
    #[case(WidgetEvent::AdditionalActionFailed, "additional_action_failed")]
    #[case(WidgetEvent::AdditionalActionSucceeded, "additional_action_succeeded")]
    #[case(WidgetEvent::PaymentCancelled, "payment_cancelled")]
    #[case(WidgetEvent::PaymentFinished, "payment_finished")]
    fn event_names_match_public_api(#[case] event: WidgetEvent, #[case] name: &str) {
        assert_eq!(event.as_str(), name);
        assert_eq!(event.to_string(), name);
    }

    struct Recording(RefCell<Vec<WidgetEvent>>);

    impl EventSink for Recording {
        fn emit(&self, event: WidgetEvent) {
            self.0.borrow_mut().push(event);
        }
    }

    #[rstest]
    fn shared_sinks_forward_through_rc() {
        let sink = Rc::new(Recording(RefCell::new(Vec::new())));
        let shared: Rc<Recording> = Rc::clone(&sink);
        shared.emit(WidgetEvent::PaymentCancelled);
        assert_eq!(*sink.0.borrow(), vec![WidgetEvent::PaymentCancelled]);
    }
}
