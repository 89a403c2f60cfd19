use crate::domain::customer::CustomerDetails;
use crate::domain::inquiry::Inquiry;
use crate::error::Result;
use std::io::Read;

/// Reads customer details from a JSON document.
pub fn read_details<R: Read>(source: R) -> Result<CustomerDetails> {
    Ok(serde_json::from_reader(source)?)
}

/// Reads a contact-form inquiry from a JSON document.
pub fn read_inquiry<R: Read>(source: R) -> Result<Inquiry> {
    Ok(serde_json::from_reader(source)?)
}
