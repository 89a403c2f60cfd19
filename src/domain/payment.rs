use super::money::Price;
use serde::{Deserialize, Serialize};

/// Where the shopper sends money out of band.
///
/// The checkout never verifies the transfer; it only records the reference
/// the shopper types back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTarget {
    /// Merchant UPI virtual payment address.
    pub merchant_vpa: String,
    pub payee_name: String,
    pub amount: Price,
    pub currency: String,
    pub note: String,
}

impl PaymentTarget {
    pub fn new(
        merchant_vpa: impl Into<String>,
        payee_name: impl Into<String>,
        amount: Price,
        note: impl Into<String>,
    ) -> Self {
        Self {
            merchant_vpa: merchant_vpa.into(),
            payee_name: payee_name.into(),
            amount,
            currency: "INR".to_string(),
            note: note.into(),
        }
    }

    /// UPI deep link, suitable for rendering as a QR code.
    pub fn upi_link(&self) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={}&cu={}&tn={}",
            encode_component(&self.merchant_vpa),
            encode_component(&self.payee_name),
            self.amount.to_fixed(),
            encode_component(&self.currency),
            encode_component(&self.note)
        )
    }
}

// RFC 3986 unreserved characters pass through; '@' is kept so VPAs stay readable.
fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'@' => {
                encoded.push(char::from(byte))
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
