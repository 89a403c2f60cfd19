use super::customer::{Field, FieldErrors};
use super::ports::TemplateParams;
use serde::{Deserialize, Serialize};

/// A business or personal inquiry from the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub name: String,
    pub email: String,
    /// e.g. "wholesale", "distribution", "feedback"
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl Inquiry {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require(Field::Name, &self.name);
        errors.require(Field::Email, &self.email);
        errors.require(Field::InquiryType, &self.kind);
        errors.require(Field::Message, &self.message);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<&Inquiry> for TemplateParams {
    fn from(inquiry: &Inquiry) -> Self {
        let mut params = TemplateParams::new();
        params
            .set("name", inquiry.name.trim())
            .set("email", inquiry.email.trim())
            .set("type", inquiry.kind.trim())
            .set("message", inquiry.message.trim())
            .set("from_name", inquiry.name.trim())
            .set("reply_to", inquiry.email.trim());
        params
    }
}
