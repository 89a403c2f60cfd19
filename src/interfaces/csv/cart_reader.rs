use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use std::io::Read;

/// One row of a cart file: `product,variant,quantity`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CartEntry {
    pub product: String,
    pub variant: String,
    pub quantity: u32,
}

/// Reads a cart file, one `product,variant,quantity` row per line after the
/// header.
///
/// Padding around cells is ignored. A row that does not make an entry, such as
/// one missing its quantity or with a quantity that is not a whole number,
/// comes back as an error for that row and the rows after it are still read.
pub struct CartReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CartReader<R> {
    /// Wraps an open cart file.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Yields one entry (or row error) per cart line, in file order.
    pub fn entries(self) -> impl Iterator<Item = Result<CartEntry>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CheckoutError::from))
    }
}
