use super::money::Price;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a cart line, unique within one order session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One product+variant entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub product_id: String,
    pub product_name: String,
    pub variant: String,
    pub quantity: u32,
    /// Unit price captured when the line was created.
    pub unit_price: Price,
}

impl CartLine {
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }
}

/// Subtotal, delivery fee and grand total of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

/// Order-preserving collection of cart lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
    next_id: u32,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of a product variant, merging into an existing line for
    /// the same product and variant. Returns the id of the affected line.
    ///
    /// Callers guarantee `quantity >= 1`.
    pub fn add(
        &mut self,
        product_id: &str,
        product_name: &str,
        variant: &str,
        quantity: u32,
        unit_price: Price,
    ) -> LineId {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id && l.variant == variant)
        {
            line.quantity = line.quantity.saturating_add(quantity);
            return line.id;
        }

        self.next_id += 1;
        let id = LineId(self.next_id);
        self.lines.push(CartLine {
            id,
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            variant: variant.to_string(),
            quantity,
            unit_price,
        });
        id
    }

    /// Applies a signed quantity change, never going below 1.
    /// Returns false if the line does not exist.
    pub fn update_quantity(&mut self, id: LineId, delta: i64) -> bool {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                let updated = (i64::from(line.quantity) + delta).clamp(1, i64::from(u32::MAX));
                line.quantity = u32::try_from(updated).unwrap_or(u32::MAX);
                true
            }
            None => false,
        }
    }

    /// Removes a line. Returns false if it was already absent.
    pub fn remove(&mut self, id: LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        self.lines.len() != before
    }

    pub fn get(&self, id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The delivery fee is charged once per non-empty order.
    pub fn totals(&self, delivery_fee: Price) -> Totals {
        if self.is_empty() {
            return Totals::default();
        }
        let subtotal = self.subtotal();
        Totals {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}
