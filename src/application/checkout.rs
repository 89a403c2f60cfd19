use crate::domain::cart::{Cart, CartLine, LineId, Totals};
use crate::domain::catalog::Catalog;
use crate::domain::customer::CustomerDetails;
use crate::domain::money::Price;
use crate::domain::order::{OrderPayload, Step, SubmissionStatus};
use crate::domain::payment::PaymentTarget;
use crate::domain::ports::{NotifierBox, NotifyError, TemplateParams};
use crate::error::{CheckoutError, Result, ValidationError};
use rust_decimal_macros::dec;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Merchant-side settings for the checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutConfig {
    /// Charged once per non-empty order.
    delivery_fee: Price,
    /// UPI address shown on the payment step.
    merchant_vpa: String,
    payee_name: String,
}

impl CheckoutConfig {
    pub fn new(
        delivery_fee: Price,
        merchant_vpa: impl Into<String>,
        payee_name: impl Into<String>,
    ) -> Result<Self> {
        if delivery_fee < Price::ZERO {
            return Err(CheckoutError::NegativeDeliveryFee(delivery_fee));
        }
        Ok(Self {
            delivery_fee,
            merchant_vpa: merchant_vpa.into(),
            payee_name: payee_name.into(),
        })
    }

    pub fn delivery_fee(&self) -> Price {
        self.delivery_fee
    }

    pub fn merchant_vpa(&self) -> &str {
        &self.merchant_vpa
    }

    pub fn payee_name(&self) -> &str {
        &self.payee_name
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            delivery_fee: Price::new(dec!(30)),
            merchant_vpa: "spiceofindia@upi".to_string(),
            payee_name: "Spice Of India".to_string(),
        }
    }
}

/// Result of a confirmed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub order: OrderPayload,
    /// True when no relay credentials were configured and delivery was skipped.
    pub simulated: bool,
}

/// Marks a submission as in flight for as long as it lives.
///
/// If the send future is dropped before `finish` or `fail` runs, the status
/// falls back to `Error` so the shopper can retry or go back.
struct InFlight<'a> {
    status: &'a watch::Sender<SubmissionStatus>,
    last_error: &'a mut Option<String>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn start(
        status: &'a watch::Sender<SubmissionStatus>,
        last_error: &'a mut Option<String>,
    ) -> Self {
        *last_error = None;
        status.send_replace(SubmissionStatus::Sending);
        Self {
            status,
            last_error,
            settled: false,
        }
    }

    fn finish(mut self) {
        self.settled = true;
        self.status.send_replace(SubmissionStatus::Success);
    }

    fn fail(mut self, reason: String) {
        self.settled = true;
        *self.last_error = Some(reason);
        self.status.send_replace(SubmissionStatus::Error);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Order submission interrupted");
            *self.last_error = Some("submission interrupted".to_string());
            self.status.send_replace(SubmissionStatus::Error);
        }
    }
}

/// Drives one shopper through selection, details, payment and confirmation.
///
/// `CheckoutSequencer` owns the whole order state and is the only thing that
/// mutates it. Every operation checks the current step first and leaves the
/// state untouched when it is rejected.
pub struct CheckoutSequencer {
    catalog: Catalog,
    config: CheckoutConfig,
    notifier: NotifierBox,
    step: Step,
    cart: Cart,
    details: Option<CustomerDetails>,
    payment_reference: Option<String>,
    status: watch::Sender<SubmissionStatus>,
    last_error: Option<String>,
}

impl CheckoutSequencer {
    /// Creates a new `CheckoutSequencer`.
    ///
    /// # Arguments
    ///
    /// * `catalog` - The products the shopper can pick from.
    /// * `config` - Delivery fee and payment target settings.
    /// * `notifier` - Where finalized orders are delivered.
    pub fn new(catalog: Catalog, config: CheckoutConfig, notifier: NotifierBox) -> Self {
        Self {
            catalog,
            config,
            notifier,
            step: Step::Selecting,
            cart: Cart::new(),
            details: None,
            payment_reference: None,
            status: watch::Sender::new(SubmissionStatus::Idle),
            last_error: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn status(&self) -> SubmissionStatus {
        *self.status.borrow()
    }

    /// Follows the submission status, e.g. to disable a submit button while
    /// an order is `Sending`.
    pub fn watch_status(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    pub fn details(&self) -> Option<&CustomerDetails> {
        self.details.as_ref()
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    /// Reason of the last failed submission, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                from: self.step,
                action,
            })
        }
    }

    /// Adds a product variant to the cart, merging with an existing line.
    pub fn add_to_cart(&mut self, product_id: &str, variant: &str, quantity: u32) -> Result<LineId> {
        self.expect_step(Step::Selecting, "add to cart")?;
        if quantity == 0 {
            return Err(CheckoutError::InvalidQuantity(quantity));
        }
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CheckoutError::UnknownProduct(product_id.to_string()))?;
        let unit_price = product
            .price_of(variant)
            .ok_or_else(|| CheckoutError::UnknownVariant {
                product: product_id.to_string(),
                variant: variant.to_string(),
            })?;

        let id = self
            .cart
            .add(&product.id, &product.name, variant, quantity, unit_price);
        info!(line = %id, product = product_id, variant, quantity, "Added to cart");
        Ok(id)
    }

    /// Changes a line's quantity by `delta`, never below 1. Unknown lines are ignored.
    pub fn update_quantity(&mut self, line_id: LineId, delta: i64) -> Result<()> {
        self.expect_step(Step::Selecting, "change quantities")?;
        self.cart.update_quantity(line_id, delta);
        Ok(())
    }

    pub fn remove_line(&mut self, line_id: LineId) -> Result<()> {
        self.expect_step(Step::Selecting, "remove items")?;
        if self.cart.remove(line_id) {
            info!(line = %line_id, "Removed from cart");
        }
        Ok(())
    }

    pub fn compute_totals(&self) -> Totals {
        self.cart.totals(self.config.delivery_fee())
    }

    pub fn advance_to_details(&mut self) -> Result<()> {
        self.expect_step(Step::Selecting, "proceed to checkout")?;
        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        self.step = Step::Details;
        info!(lines = self.cart.lines().len(), "Moved to details step");
        Ok(())
    }

    pub fn back_to_selection(&mut self) -> Result<()> {
        self.expect_step(Step::Details, "go back to selection")?;
        self.step = Step::Selecting;
        Ok(())
    }

    pub fn submit_details(&mut self, details: CustomerDetails) -> Result<()> {
        self.expect_step(Step::Details, "submit details")?;
        details.validate().map_err(ValidationError::Fields)?;
        self.details = Some(details);
        self.step = Step::Payment;
        info!("Moved to payment step");
        Ok(())
    }

    pub fn back_to_details(&mut self) -> Result<()> {
        self.expect_step(Step::Payment, "go back to details")?;
        self.step = Step::Details;
        Ok(())
    }

    /// The UPI target for the current grand total.
    pub fn payment_target(&self) -> Result<PaymentTarget> {
        self.expect_step(Step::Payment, "show payment details")?;
        let note = match &self.details {
            Some(details) => format!("Order for {}", details.name.trim()),
            None => "Spice order".to_string(),
        };
        Ok(PaymentTarget::new(
            self.config.merchant_vpa(),
            self.config.payee_name(),
            self.compute_totals().total,
            note,
        ))
    }

    /// Finalizes the order and hands it to the notifier.
    ///
    /// A blank reference is only accepted when the notifier has no
    /// credentials, in which case the order is confirmed without a send.
    /// On a delivery failure the sequencer stays on the payment step so the
    /// shopper can retry. The same holds if the returned future is dropped
    /// before the notifier answers.
    pub async fn confirm_payment(&mut self, payment_reference: &str) -> Result<Confirmation> {
        self.expect_step(Step::Payment, "confirm payment")?;

        let reference = payment_reference.trim();
        if reference.is_empty() && self.notifier.is_configured() {
            return Err(ValidationError::MissingPaymentReference.into());
        }

        let customer = self
            .details
            .clone()
            .ok_or(CheckoutError::InvalidTransition {
                from: self.step,
                action: "confirm payment without details",
            })?;
        let order = OrderPayload {
            customer,
            lines: self.cart.lines().to_vec(),
            totals: self.compute_totals(),
            payment_reference: (!reference.is_empty()).then(|| reference.to_string()),
        };

        let in_flight = InFlight::start(&self.status, &mut self.last_error);
        let simulated = match self.notifier.send(TemplateParams::from(&order)).await {
            Ok(()) => false,
            Err(NotifyError::Unconfigured) => {
                warn!("Email relay credentials missing. Confirming order without sending.");
                true
            }
            Err(e) => {
                error!(error = %e, "Order notification failed");
                in_flight.fail(e.to_string());
                return Err(e.into());
            }
        };
        in_flight.finish();

        self.payment_reference = order.payment_reference.clone();
        self.step = Step::Confirmed;
        info!(total = %order.totals.total, simulated, "Order confirmed");

        Ok(Confirmation { order, simulated })
    }

    /// Discards the current order and starts over at selection.
    pub fn reset(&mut self) {
        self.step = Step::Selecting;
        self.cart = Cart::new();
        self.details = None;
        self.payment_reference = None;
        self.status.send_replace(SubmissionStatus::Idle);
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::{Field, FieldProblem};
    use crate::domain::ports::Notifier;
    use crate::infrastructure::in_memory::RecordingNotifier;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Holds every send until the gate is opened.
    struct GatedNotifier {
        gate: Arc<Notify>,
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Notifier for GatedNotifier {
        fn is_configured(&self) -> bool {
            true
        }

        async fn send(&self, _params: TemplateParams) -> std::result::Result<(), NotifyError> {
            self.gate.notified().await;
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn gated() -> (GatedNotifier, Arc<Notify>, Arc<AtomicUsize>) {
        let gate = Arc::new(Notify::new());
        let sent = Arc::new(AtomicUsize::new(0));
        let notifier = GatedNotifier {
            gate: gate.clone(),
            sent: sent.clone(),
        };
        (notifier, gate, sent)
    }

    fn details() -> CustomerDetails {
        CustomerDetails {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9820000000".to_string(),
            alternate_phone: None,
            address: "12 Marine Drive".to_string(),
            landmark: None,
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "400001".to_string(),
            notes: None,
        }
    }

    fn sequencer(notifier: RecordingNotifier) -> CheckoutSequencer {
        CheckoutSequencer::new(
            Catalog::spices(),
            CheckoutConfig::default(),
            Box::new(notifier),
        )
    }

    async fn at_payment(notifier: RecordingNotifier) -> CheckoutSequencer {
        at_payment_with(Box::new(notifier)).await
    }

    async fn at_payment_with(notifier: NotifierBox) -> CheckoutSequencer {
        let mut checkout = CheckoutSequencer::new(Catalog::spices(), CheckoutConfig::default(), notifier);
        checkout.add_to_cart("red-chilli", "100g", 2).unwrap();
        checkout.add_to_cart("turmeric", "250g", 1).unwrap();
        checkout.advance_to_details().unwrap();
        checkout.submit_details(details()).unwrap();
        checkout
    }

    #[test]
    fn test_add_to_cart_merges_lines() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        let a = checkout.add_to_cart("coriander", "50g", 1).unwrap();
        let b = checkout.add_to_cart("coriander", "50g", 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(checkout.lines().len(), 1);
        assert_eq!(checkout.lines()[0].quantity, 3);
    }

    #[test]
    fn test_add_to_cart_rejects_bad_input() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        assert!(matches!(
            checkout.add_to_cart("saffron", "50g", 1),
            Err(CheckoutError::UnknownProduct(_))
        ));
        assert!(matches!(
            checkout.add_to_cart("turmeric", "1kg", 1),
            Err(CheckoutError::UnknownVariant { .. })
        ));
        assert!(matches!(
            checkout.add_to_cart("turmeric", "50g", 0),
            Err(CheckoutError::InvalidQuantity(0))
        ));
        assert!(checkout.lines().is_empty());
    }

    #[test]
    fn test_quantity_and_removal() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        let id = checkout.add_to_cart("turmeric", "100g", 2).unwrap();

        checkout.update_quantity(id, -10).unwrap();
        assert_eq!(checkout.lines()[0].quantity, 1);

        checkout.update_quantity(LineId(42), 1).unwrap();
        checkout.remove_line(id).unwrap();
        checkout.remove_line(id).unwrap();
        assert!(checkout.lines().is_empty());
    }

    #[test]
    fn test_totals_example_order() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        assert_eq!(checkout.compute_totals().total, Price::ZERO);

        checkout.add_to_cart("red-chilli", "100g", 2).unwrap();
        checkout.add_to_cart("turmeric", "250g", 1).unwrap();

        let totals = checkout.compute_totals();
        assert_eq!(totals.subtotal, Price::new(dec!(220)));
        assert_eq!(totals.total, Price::new(dec!(250)));
    }

    #[test]
    fn test_advance_with_empty_cart_stays_selecting() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        let result = checkout.advance_to_details();
        assert!(matches!(
            result,
            Err(CheckoutError::Validation(ValidationError::EmptyCart))
        ));
        assert_eq!(checkout.step(), Step::Selecting);
    }

    #[test]
    fn test_cart_is_locked_outside_selection() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        let id = checkout.add_to_cart("turmeric", "100g", 1).unwrap();
        checkout.advance_to_details().unwrap();

        assert!(matches!(
            checkout.add_to_cart("turmeric", "100g", 1),
            Err(CheckoutError::InvalidTransition { from: Step::Details, .. })
        ));
        assert!(checkout.remove_line(id).is_err());

        checkout.back_to_selection().unwrap();
        assert_eq!(checkout.step(), Step::Selecting);
        checkout.update_quantity(id, 1).unwrap();
        assert_eq!(checkout.lines()[0].quantity, 2);
    }

    #[test]
    fn test_no_forward_skips() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        checkout.add_to_cart("turmeric", "100g", 1).unwrap();
        assert!(matches!(
            checkout.submit_details(details()),
            Err(CheckoutError::InvalidTransition { from: Step::Selecting, .. })
        ));
        assert!(checkout.payment_target().is_err());
        assert!(checkout.back_to_details().is_err());
    }

    #[test]
    fn test_submit_details_pincode() {
        let mut checkout = sequencer(RecordingNotifier::unconfigured());
        checkout.add_to_cart("turmeric", "100g", 1).unwrap();
        checkout.advance_to_details().unwrap();

        for bad in ["4000A1", "40000"] {
            let mut d = details();
            d.pincode = bad.to_string();
            match checkout.submit_details(d) {
                Err(CheckoutError::Validation(ValidationError::Fields(errors))) => {
                    assert_eq!(errors.problem(Field::Pincode), Some(FieldProblem::Invalid));
                }
                other => panic!("expected pincode failure, got {other:?}"),
            }
            assert_eq!(checkout.step(), Step::Details);
            assert!(checkout.details().is_none());
        }

        checkout.submit_details(details()).unwrap();
        assert_eq!(checkout.step(), Step::Payment);
        assert_eq!(checkout.details().unwrap().pincode, "400001");
    }

    #[tokio::test]
    async fn test_payment_target_uses_grand_total() {
        let checkout = at_payment(RecordingNotifier::unconfigured()).await;
        let target = checkout.payment_target().unwrap();
        assert_eq!(target.amount, Price::new(dec!(250)));
        assert_eq!(target.note, "Order for Asha Rao");
        assert!(target.upi_link().contains("am=250.00"));
    }

    #[tokio::test]
    async fn test_blank_reference_rejected_when_configured() {
        let notifier = RecordingNotifier::configured();
        let mut checkout = at_payment(notifier.clone()).await;

        let result = checkout.confirm_payment("  ").await;
        assert!(matches!(
            result,
            Err(CheckoutError::Validation(ValidationError::MissingPaymentReference))
        ));
        assert_eq!(checkout.step(), Step::Payment);
        assert_eq!(checkout.status(), SubmissionStatus::Idle);
        assert!(notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_notifier_simulates_success() {
        let notifier = RecordingNotifier::unconfigured();
        let mut checkout = at_payment(notifier.clone()).await;

        let confirmation = checkout.confirm_payment("TXN123").await.unwrap();
        assert!(confirmation.simulated);
        assert_eq!(checkout.step(), Step::Confirmed);
        assert_eq!(checkout.status(), SubmissionStatus::Success);
        assert_eq!(checkout.payment_reference(), Some("TXN123"));
        assert!(notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_order_is_delivered() {
        let notifier = RecordingNotifier::configured();
        let mut checkout = at_payment(notifier.clone()).await;

        let confirmation = checkout.confirm_payment("TXN123").await.unwrap();
        assert!(!confirmation.simulated);
        assert_eq!(confirmation.order.totals.total, Price::new(dec!(250)));
        assert_eq!(confirmation.order.lines.len(), 2);

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].get("total_price"), Some("Rs 250"));
        assert_eq!(sent[0].get("payment_reference"), Some("TXN123"));
    }

    #[tokio::test]
    async fn test_failure_stays_on_payment_and_retry_succeeds() {
        let notifier = RecordingNotifier::configured();
        notifier.fail_next("The template ID is invalid").await;
        let mut checkout = at_payment(notifier.clone()).await;

        let result = checkout.confirm_payment("TXN123").await;
        assert!(matches!(
            result,
            Err(CheckoutError::Notify(NotifyError::Rejected(_)))
        ));
        assert_eq!(checkout.step(), Step::Payment);
        assert_eq!(checkout.status(), SubmissionStatus::Error);
        assert_eq!(checkout.last_error(), Some("The template ID is invalid"));

        checkout.confirm_payment("TXN123").await.unwrap();
        assert_eq!(checkout.step(), Step::Confirmed);
        assert_eq!(checkout.last_error(), None);
        assert_eq!(notifier.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_after_confirmation() {
        let mut checkout = at_payment(RecordingNotifier::unconfigured()).await;
        checkout.confirm_payment("TXN123").await.unwrap();

        checkout.reset();
        assert_eq!(checkout.step(), Step::Selecting);
        assert_eq!(checkout.status(), SubmissionStatus::Idle);
        assert!(checkout.lines().is_empty());
        assert!(checkout.details().is_none());
        assert!(checkout.payment_reference().is_none());
        assert_eq!(checkout.compute_totals().total, Price::ZERO);
    }

    #[tokio::test]
    async fn test_back_to_details_keeps_cart() {
        let mut checkout = at_payment(RecordingNotifier::unconfigured()).await;
        checkout.back_to_details().unwrap();
        assert_eq!(checkout.step(), Step::Details);
        assert_eq!(checkout.lines().len(), 2);
        assert!(checkout.confirm_payment("TXN123").await.is_err());
    }

    #[test]
    fn test_config_rejects_negative_delivery_fee() {
        let result = CheckoutConfig::new(Price::new(dec!(-50)), "shop@upi", "Shop");
        match result {
            Err(e @ CheckoutError::NegativeDeliveryFee(_)) => {
                assert_eq!(e.to_string(), "Delivery fee cannot be negative: Rs -50");
            }
            other => panic!("expected negative fee error, got {other:?}"),
        }

        let free = CheckoutConfig::new(Price::ZERO, "shop@upi", "Shop").unwrap();
        assert_eq!(free.delivery_fee(), Price::ZERO);
        assert_eq!(free.merchant_vpa(), "shop@upi");
    }

    #[tokio::test]
    async fn test_status_is_sending_while_notifier_works() {
        let (notifier, gate, sent) = gated();
        let mut checkout = at_payment_with(Box::new(notifier)).await;
        let mut status = checkout.watch_status();
        assert_eq!(*status.borrow(), SubmissionStatus::Idle);

        let handle = tokio::spawn(async move {
            let result = checkout.confirm_payment("TXN123").await;
            (checkout, result)
        });

        status
            .wait_for(|s| *s == SubmissionStatus::Sending)
            .await
            .unwrap();
        assert_eq!(sent.load(Ordering::SeqCst), 0);
        gate.notify_one();

        let (checkout, result) = handle.await.unwrap();
        assert!(!result.unwrap().simulated);
        assert_eq!(checkout.status(), SubmissionStatus::Success);
        assert_eq!(*status.borrow_and_update(), SubmissionStatus::Success);
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interrupted_submission_can_be_retried() {
        let (notifier, gate, sent) = gated();
        let mut checkout = at_payment_with(Box::new(notifier)).await;

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), checkout.confirm_payment("TXN123")).await;
        assert!(timed_out.is_err());
        assert_eq!(checkout.step(), Step::Payment);
        assert_eq!(checkout.status(), SubmissionStatus::Error);
        assert_eq!(checkout.last_error(), Some("submission interrupted"));
        assert_eq!(sent.load(Ordering::SeqCst), 0);

        // Going back still works after an interrupted send
        checkout.back_to_details().unwrap();
        checkout.submit_details(details()).unwrap();

        gate.notify_one();
        let confirmation = checkout.confirm_payment("TXN123").await.unwrap();
        assert!(!confirmation.simulated);
        assert_eq!(checkout.step(), Step::Confirmed);
        assert_eq!(checkout.status(), SubmissionStatus::Success);
        assert_eq!(checkout.last_error(), None);
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }
}
