use super::money::Price;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A weight-based SKU of a product and its unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantPrice {
    pub variant: String,
    pub price: Price,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price table in display order.
    pub prices: Vec<VariantPrice>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            prices: Vec::new(),
        }
    }

    pub fn with_price(mut self, variant: impl Into<String>, price: Price) -> Self {
        self.prices.push(VariantPrice {
            variant: variant.into(),
            price,
        });
        self
    }

    pub fn price_of(&self, variant: &str) -> Option<Price> {
        self.prices
            .iter()
            .find(|p| p.variant == variant)
            .map(|p| p.price)
    }

    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.prices.iter().map(|p| p.variant.as_str())
    }
}

/// The immutable product catalog, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The house range of ground spices.
    pub fn spices() -> Self {
        Self::new(vec![
            Product::new(
                "red-chilli",
                "Red Chilli Powder",
                "Pure, vibrant, and ethically sourced. No artificial colors.",
            )
            .with_price("50g", Price::new(dec!(25)))
            .with_price("100g", Price::new(dec!(45)))
            .with_price("250g", Price::new(dec!(120))),
            Product::new(
                "turmeric",
                "Turmeric Powder",
                "Golden purity with high curcumin content. Natural health in every pinch.",
            )
            .with_price("50g", Price::new(dec!(25)))
            .with_price("100g", Price::new(dec!(45)))
            .with_price("250g", Price::new(dec!(130))),
            Product::new(
                "coriander",
                "Coriander Powder",
                "Fragrant and earthy. Processed to keep the natural aroma intact.",
            )
            .with_price("50g", Price::new(dec!(20)))
            .with_price("100g", Price::new(dec!(40)))
            .with_price("250g", Price::new(dec!(90))),
        ])
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::spices()
    }
}
