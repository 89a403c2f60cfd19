use super::cart::{CartLine, Totals};
use super::customer::{CustomerDetails, non_blank};
use super::ports::TemplateParams;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checkout wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Selecting,
    Details,
    Payment,
    Confirmed,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Selecting => "selecting",
            Step::Details => "details",
            Step::Payment => "payment",
            Step::Confirmed => "confirmed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Sending,
    Success,
    Error,
}

/// A finalized order, as handed to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub customer: CustomerDetails,
    pub lines: Vec<CartLine>,
    pub totals: Totals,
    pub payment_reference: Option<String>,
}

impl OrderPayload {
    /// One `"<name> (<variant>) x<qty> = Rs <total>"` entry per line.
    pub fn item_summary(&self) -> String {
        self.lines
            .iter()
            .map(|l| {
                format!(
                    "{} ({}) x{} = {}",
                    l.product_name,
                    l.variant,
                    l.quantity,
                    l.line_total()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Human-readable order summary used as the email body.
    pub fn message(&self) -> String {
        let c = &self.customer;
        let mut message = format!(
            "Order Details:\n{}\nSubtotal: {}\nDelivery Fee: {}\nTotal Price: {}\n",
            self.item_summary(),
            self.totals.subtotal,
            self.totals.delivery_fee,
            self.totals.total
        );
        if let Some(reference) = self.payment_reference.as_deref() {
            message.push_str(&format!("Payment Reference: {reference}\n"));
        }
        message.push_str(&format!(
            "\nDeliver to:\n{}\nPhone: {}\nEmail: {}",
            c.full_address(),
            c.phone.trim(),
            c.email.trim()
        ));
        if let Some(alternate) = non_blank(&c.alternate_phone) {
            message.push_str(&format!("\nAlternate Phone: {alternate}"));
        }
        if let Some(notes) = non_blank(&c.notes) {
            message.push_str(&format!("\nNotes: {notes}"));
        }
        message
    }
}

impl From<&OrderPayload> for TemplateParams {
    fn from(order: &OrderPayload) -> Self {
        let c = &order.customer;
        let mut params = TemplateParams::new();
        params
            .set("from_name", c.name.trim())
            .set("customer_email", c.email.trim())
            .set("customer_phone", c.phone.trim())
            .set("alternate_phone", non_blank(&c.alternate_phone).unwrap_or_default())
            .set("customer_address", c.full_address())
            .set("order_items", order.item_summary())
            .set("subtotal", order.totals.subtotal.to_string())
            .set("delivery_fee", order.totals.delivery_fee.to_string())
            .set("total_price", order.totals.total.to_string())
            .set(
                "payment_reference",
                order.payment_reference.as_deref().unwrap_or_default(),
            )
            .set("notes", non_blank(&c.notes).unwrap_or_default())
            .set("reply_to", c.email.trim())
            .set("message", order.message());
        params
    }
}
