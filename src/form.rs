//! The payment request form: capability check and button mount, the
//! `paymentmethod` / `cancel` handlers, and the parameters handed to the
//! page's form submission.
//!
//! `PaymentRequestForm` is generic over the processor, the intent endpoint and
//! the event sink so the whole flow runs the same against Stripe.js in a
//! browser and against in-memory fakes in tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::WidgetConfig;
use crate::error::PaymentError;
use crate::events::{EventSink, WidgetEvent};
use crate::processor::{
    CompletionStatus, ConfirmCardPaymentOptions, IntentSource, PaymentIntentInfo,
    PaymentMethodEvent, PaymentProcessor, PaymentResult,
};

/// Form field carrying the serialized [`ConfirmationPayload`].
pub const PAYMENT_DATA_PARAM: &str = "stripe_payment_data";

/// Data sent to the server with the page's form once a payment is confirmed.
///
/// The page submits multipart form data, so this travels as a single JSON
/// string under [`PAYMENT_DATA_PARAM`].
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ConfirmationPayload {
    pub payment_method_id: String,
    pub payment_intent_id: String,
    pub payment_intent_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_option_id: Option<String>,
}

impl ConfirmationPayload {
    fn new<M: PaymentMethodEvent>(event: &M, intent: &PaymentIntentInfo) -> Self {
        Self {
            payment_method_id: event.payment_method_id(),
            payment_intent_id: intent.id.clone(),
            payment_intent_status: intent.status.as_str().to_string(),
            payer_name: event.payer_name(),
            payer_email: event.payer_email(),
            wallet_name: event.wallet_name(),
            shipping_option_id: event.shipping_option_id(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InitState {
    Idle,
    Pending,
    Done(bool),
}

/// Wallet sheet handle that reports at most one outcome.
struct Sheet<'a, M> {
    event: &'a M,
    completed: Cell<bool>,
}

impl<'a, M: PaymentMethodEvent> Sheet<'a, M> {
    fn new(event: &'a M) -> Self {
        Self {
            event,
            completed: Cell::new(false),
        }
    }

    fn complete(&self, status: CompletionStatus) {
        if !self.completed.replace(true) {
            self.event.complete(status);
        }
    }
}

/// One payment request widget instance.
pub struct PaymentRequestForm<P, I, S> {
    config: WidgetConfig,
    processor: P,
    intents: I,
    sink: S,
    params: RefCell<BTreeMap<String, String>>,
    init: Cell<InitState>,
    last_event: Cell<Option<WidgetEvent>>,
}

impl<P, I, S> PaymentRequestForm<P, I, S>
where
    P: PaymentProcessor,
    I: IntentSource,
    S: EventSink,
{
    pub fn new(config: WidgetConfig, processor: P, intents: I, sink: S) -> Self {
        Self {
            config,
            processor,
            intents,
            sink,
            params: RefCell::new(BTreeMap::new()),
            init: Cell::new(InitState::Idle),
            last_event: Cell::new(None),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Name of the last event dispatched, if any.
    pub fn last_event(&self) -> Option<WidgetEvent> {
        self.last_event.get()
    }

    /// Snapshot of the accumulated form parameters.
    pub fn params(&self) -> BTreeMap<String, String> {
        self.params.borrow().clone()
    }

    /// Run the capability check and mount the button if the device can pay.
    ///
    /// Emits `init_succeeded` or `init_failed`. The check runs once per
    /// instance; later calls return the first outcome (or `false` while it is
    /// still pending) without touching the processor.
    pub async fn init(&self) -> bool {
        match self.init.get() {
            InitState::Idle => {}
            InitState::Pending => {
                log::warn!("PaymentRequestForm: init already in progress");
                return false;
            }
            InitState::Done(mounted) => {
                log::warn!("PaymentRequestForm: init already ran");
                return mounted;
            }
        }
        self.init.set(InitState::Pending);

        let mounted = match self.processor.can_make_payment().await {
            Ok(true) => match self.processor.mount_button() {
                Ok(()) => true,
                Err(err) => {
                    log::error!("PaymentRequestForm: failed to mount button: {err}");
                    false
                }
            },
            Ok(false) => {
                log::warn!("PaymentRequestForm: not allowed to make payment");
                false
            }
            Err(err) => {
                log::warn!("PaymentRequestForm: capability check failed: {err}");
                false
            }
        };

        self.init.set(InitState::Done(mounted));
        self.emit(if mounted {
            WidgetEvent::InitSucceeded
        } else {
            WidgetEvent::InitFailed
        });
        mounted
    }

    /// Handle the wallet sheet's `paymentmethod` event.
    ///
    /// `payment_started` is emitted before anything is awaited and
    /// `payment_finished` is always the last event of the attempt.
    pub async fn handle_payment_method<M: PaymentMethodEvent>(&self, event: M) {
        self.emit(WidgetEvent::PaymentStarted);

        let sheet = Sheet::new(&event);
        if let Err(err) = self.confirm(&sheet).await {
            log::error!("PaymentRequestForm: payment failed: {err}");
            sheet.complete(CompletionStatus::Fail);
            self.emit(WidgetEvent::PaymentFailed);
        }

        self.emit(WidgetEvent::PaymentFinished);
    }

    /// Handle the wallet sheet's `cancel` event.
    pub fn handle_cancel(&self) {
        self.emit(WidgetEvent::PaymentCancelled);
    }

    /// Append the accumulated parameters to the page's outgoing form fields.
    pub fn prepare_submit(&self, params: &mut Vec<(String, String)>) {
        params.extend(
            self.params
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    async fn confirm<M: PaymentMethodEvent>(&self, sheet: &Sheet<'_, M>) -> Result<(), PaymentError> {
        let secret = self.intents.fetch_client_secret().await?;
        let payment_method_id = sheet.event.payment_method_id();

        // Next actions are deferred so the sheet can be closed first.
        let result = self
            .processor
            .confirm_card_payment(
                &secret,
                &payment_method_id,
                ConfirmCardPaymentOptions {
                    handle_actions: false,
                },
            )
            .await;

        let intent = match result {
            PaymentResult::Success(intent) => intent,
            PaymentResult::Error(err) => {
                log::error!("PaymentRequestForm: confirmation failed for {payment_method_id}: {err}");
                sheet.complete(CompletionStatus::Fail);
                self.emit(WidgetEvent::PaymentFailed);
                return Ok(());
            }
        };

        let payload = ConfirmationPayload::new(sheet.event, &intent);
        let encoded = serde_json::to_string(&payload).map_err(PaymentError::Serialization)?;
        self.params
            .borrow_mut()
            .insert(PAYMENT_DATA_PARAM.to_string(), encoded);
        sheet.complete(CompletionStatus::Success);
        log::debug!("PaymentRequestForm: confirmed {} ({})", intent.id, intent.status.as_str());

        if !intent.status.requires_action() {
            self.emit(WidgetEvent::PaymentSucceeded);
            return Ok(());
        }

        match self.processor.handle_card_action(&secret).await {
            PaymentResult::Success(_) => {
                self.emit(WidgetEvent::AdditionalActionSucceeded);
                self.emit(WidgetEvent::PaymentSucceeded);
            }
            PaymentResult::Error(err) => {
                log::error!("PaymentRequestForm: additional action failed for {}: {err}", intent.id);
                self.emit(WidgetEvent::AdditionalActionFailed);
                self.emit(WidgetEvent::PaymentFailed);
            }
        }
        Ok(())
    }

    fn emit(&self, event: WidgetEvent) {
        self.last_event.set(Some(event));
        self.sink.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StripeError;
    use crate::processor::IntentStatus;
    use futures::executor::block_on;
    use rstest::{fixture, rstest};
    use std::rc::Rc;

    /// Shared, ordered record of everything the fakes observe.
    #[derive(Default)]
    struct Journal(RefCell<Vec<String>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.borrow_mut().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.borrow().clone()
        }

        fn events(&self) -> Vec<String> {
            self.entries()
                .into_iter()
                .filter_map(|e| e.strip_prefix("event:").map(str::to_string))
                .collect()
        }
    }

    struct FakeSink(Rc<Journal>);

    impl EventSink for FakeSink {
        fn emit(&self, event: WidgetEvent) {
            self.0.push(format!("event:{event}"));
        }
    }

    struct FakeProcessor {
        journal: Rc<Journal>,
        can_pay: Result<bool, StripeError>,
        mount: Result<(), StripeError>,
        confirm: PaymentResult,
        action: PaymentResult,
    }

    impl PaymentProcessor for FakeProcessor {
        async fn can_make_payment(&self) -> Result<bool, StripeError> {
            self.journal.push("can_make_payment");
            self.can_pay.clone()
        }

        fn mount_button(&self) -> Result<(), StripeError> {
            self.journal.push("mount");
            self.mount.clone()
        }

        async fn confirm_card_payment(
            &self,
            client_secret: &str,
            payment_method_id: &str,
            options: ConfirmCardPaymentOptions,
        ) -> PaymentResult {
            self.journal.push(format!(
                "confirm:{client_secret}:{payment_method_id}:{}",
                options.handle_actions
            ));
            self.confirm.clone()
        }

        async fn handle_card_action(&self, client_secret: &str) -> PaymentResult {
            self.journal.push(format!("action:{client_secret}"));
            self.action.clone()
        }
    }

    enum Reply {
        Secret(&'static str),
        Missing,
        Offline,
    }

    struct FakeIntents {
        journal: Rc<Journal>,
        reply: Reply,
    }

    impl IntentSource for FakeIntents {
        async fn fetch_client_secret(&self) -> Result<String, PaymentError> {
            self.journal.push("fetch");
            match self.reply {
                Reply::Secret(s) => Ok(s.to_string()),
                Reply::Missing => Err(PaymentError::MissingClientSecret),
                Reply::Offline => Err(PaymentError::Network("offline".into())),
            }
        }
    }

    struct FakeEvent {
        journal: Rc<Journal>,
    }

    impl PaymentMethodEvent for FakeEvent {
        fn payment_method_id(&self) -> String {
            "pm_card_visa".into()
        }

        fn payer_email(&self) -> Option<String> {
            Some("jenny@example.com".into())
        }

        fn wallet_name(&self) -> Option<String> {
            Some("applePay".into())
        }

        fn complete(&self, status: CompletionStatus) {
            self.journal.push(format!("complete:{}", status.as_str()));
        }
    }

    type Form = PaymentRequestForm<FakeProcessor, FakeIntents, FakeSink>;

    fn intent(status: &str) -> PaymentResult {
        PaymentResult::Success(PaymentIntentInfo {
            id: "pi_123".into(),
            status: IntentStatus::from(status),
        })
    }

    fn declined() -> PaymentResult {
        PaymentResult::Error(StripeError {
            message: "Your card was declined.".into(),
            error_type: Some("card_error".into()),
            code: Some("card_declined".into()),
        })
    }

    fn config() -> WidgetConfig {
        WidgetConfig {
            publishable_key: "pk_test_123".into(),
            payment_intent_path: "/checkout/payment_intent".into(),
            currency: "usd".into(),
            country: "US".into(),
            item_label: "Order total".into(),
            item_total: 2500,
            request_payer_name: true,
            request_payer_email: true,
            request_shipping: false,
            shipping_options: None,
        }
    }

    struct Harness {
        journal: Rc<Journal>,
        form: Form,
    }

    impl Harness {
        fn new(
            can_pay: Result<bool, StripeError>,
            reply: Reply,
            confirm: PaymentResult,
            action: PaymentResult,
        ) -> Self {
            let journal = Rc::new(Journal::default());
            let form = PaymentRequestForm::new(
                config(),
                FakeProcessor {
                    journal: journal.clone(),
                    can_pay,
                    mount: Ok(()),
                    confirm,
                    action,
                },
                FakeIntents {
                    journal: journal.clone(),
                    reply,
                },
                FakeSink(journal.clone()),
            );
            Self { journal, form }
        }

        fn pay(&self) {
            let event = FakeEvent {
                journal: self.journal.clone(),
            };
            block_on(self.form.handle_payment_method(event));
        }
    }

    #[fixture]
    fn happy() -> Harness {
        Harness::new(
            Ok(true),
            Reply::Secret("pi_123_secret_abc"),
            intent("succeeded"),
            intent("succeeded"),
        )
    }

    #[rstest]
    fn capable_device_mounts_button(happy: Harness) {
        assert!(block_on(happy.form.init()));
        assert_eq!(
            happy.journal.entries(),
            vec!["can_make_payment", "mount", "event:init_succeeded"]
        );
        assert_eq!(happy.form.last_event(), Some(WidgetEvent::InitSucceeded));
    }

    #[rstest]
    #[case::denied(Ok(false))]
    #[case::check_errored(Err(StripeError::message("Stripe.js not loaded")))]
    fn incapable_device_gets_init_failed_only(#[case] can_pay: Result<bool, StripeError>) {
        let h = Harness::new(can_pay, Reply::Missing, declined(), declined());
        assert!(!block_on(h.form.init()));
        assert_eq!(
            h.journal.entries(),
            vec!["can_make_payment", "event:init_failed"]
        );
    }

    #[rstest]
    fn mount_failure_reports_init_failed() {
        let h = Harness::new(Ok(true), Reply::Missing, declined(), declined());
        let form = PaymentRequestForm::new(
            config(),
            FakeProcessor {
                journal: h.journal.clone(),
                can_pay: Ok(true),
                mount: Err(StripeError::message("element not found")),
                confirm: declined(),
                action: declined(),
            },
            FakeIntents {
                journal: h.journal.clone(),
                reply: Reply::Missing,
            },
            FakeSink(h.journal.clone()),
        );
        assert!(!block_on(form.init()));
        assert_eq!(h.journal.events(), vec!["init_failed"]);
    }

    #[rstest]
    fn capability_check_runs_once(happy: Harness) {
        assert!(block_on(happy.form.init()));
        assert!(block_on(happy.form.init()));
        let checks = happy
            .journal
            .entries()
            .iter()
            .filter(|e| *e == "can_make_payment")
            .count();
        assert_eq!(checks, 1);
        assert_eq!(happy.journal.events(), vec!["init_succeeded"]);
    }

    #[rstest]
    fn straight_success_stores_payload(happy: Harness) {
        happy.pay();
        assert_eq!(
            happy.journal.entries(),
            vec![
                "event:payment_started",
                "fetch",
                "confirm:pi_123_secret_abc:pm_card_visa:false",
                "complete:success",
                "event:payment_succeeded",
                "event:payment_finished",
            ]
        );

        let params = happy.form.params();
        let payload: serde_json::Value =
            serde_json::from_str(&params[PAYMENT_DATA_PARAM]).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "payment_method_id": "pm_card_visa",
                "payment_intent_id": "pi_123",
                "payment_intent_status": "succeeded",
                "payer_email": "jenny@example.com",
                "wallet_name": "applePay",
            })
        );
    }

    #[rstest]
    #[case::missing_secret(Reply::Missing)]
    #[case::network_error(Reply::Offline)]
    fn intent_fetch_failure_fails_the_sheet(#[case] reply: Reply) {
        let h = Harness::new(Ok(true), reply, intent("succeeded"), intent("succeeded"));
        h.pay();
        assert_eq!(
            h.journal.entries(),
            vec![
                "event:payment_started",
                "fetch",
                "complete:fail",
                "event:payment_failed",
                "event:payment_finished",
            ]
        );
        assert!(h.form.params().is_empty());
    }

    #[rstest]
    fn declined_confirmation_fails_the_sheet() {
        let h = Harness::new(
            Ok(true),
            Reply::Secret("pi_123_secret_abc"),
            declined(),
            intent("succeeded"),
        );
        h.pay();
        assert_eq!(
            h.journal.entries(),
            vec![
                "event:payment_started",
                "fetch",
                "confirm:pi_123_secret_abc:pm_card_visa:false",
                "complete:fail",
                "event:payment_failed",
                "event:payment_finished",
            ]
        );
        assert!(h.form.params().is_empty());
        assert_eq!(h.form.last_event(), Some(WidgetEvent::PaymentFinished));
    }

    #[rstest]
    fn failed_additional_action() {
        let h = Harness::new(
            Ok(true),
            Reply::Secret("pi_123_secret_abc"),
            intent("requires_action"),
            declined(),
        );
        h.pay();
        assert_eq!(
            h.journal.entries(),
            vec![
                "event:payment_started",
                "fetch",
                "confirm:pi_123_secret_abc:pm_card_visa:false",
                "complete:success",
                "action:pi_123_secret_abc",
                "event:additional_action_failed",
                "event:payment_failed",
                "event:payment_finished",
            ]
        );
        // Confirmation itself succeeded, so the payload is kept.
        assert!(h.form.params().contains_key(PAYMENT_DATA_PARAM));
    }

    #[rstest]
    fn successful_additional_action() {
        let h = Harness::new(
            Ok(true),
            Reply::Secret("pi_123_secret_abc"),
            intent("requires_action"),
            intent("succeeded"),
        );
        h.pay();
        assert_eq!(
            h.journal.events(),
            vec![
                "payment_started",
                "additional_action_succeeded",
                "payment_succeeded",
                "payment_finished",
            ]
        );
        let payload: serde_json::Value =
            serde_json::from_str(&h.form.params()[PAYMENT_DATA_PARAM]).unwrap();
        assert_eq!(payload["payment_intent_status"], "requires_action");
    }

    #[rstest]
    fn cancel_emits_only_payment_cancelled(happy: Harness) {
        happy.form.handle_cancel();
        assert_eq!(happy.journal.entries(), vec!["event:payment_cancelled"]);
        assert!(happy.form.params().is_empty());
    }

    #[rstest]
    fn prepare_submit_appends_after_existing_fields(happy: Harness) {
        let mut fields = vec![("order_id".to_string(), "42".to_string())];
        happy.form.prepare_submit(&mut fields);
        assert_eq!(fields.len(), 1);

        happy.pay();
        happy.form.prepare_submit(&mut fields);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, "order_id");
        assert_eq!(fields[1].0, PAYMENT_DATA_PARAM);
    }

    #[rstest]
    fn sheet_completes_once() {
        let journal = Rc::new(Journal::default());
        let event = FakeEvent {
            journal: journal.clone(),
        };
        let sheet = Sheet::new(&event);
        sheet.complete(CompletionStatus::Success);
        sheet.complete(CompletionStatus::Fail);
        assert_eq!(journal.entries(), vec!["complete:success"]);
    }
}
