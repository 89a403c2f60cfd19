use serde::{Deserialize, Serialize};
use std::fmt;

/// A form field the shopper fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Phone,
    Address,
    City,
    State,
    Pincode,
    InquiryType,
    Message,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Address => "address",
            Field::City => "city",
            Field::State => "state",
            Field::Pincode => "pincode",
            Field::InquiryType => "inquiry type",
            Field::Message => "message",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    Invalid,
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(Vec<(Field, FieldProblem)>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, problem: FieldProblem) {
        self.0.push((field, problem));
    }

    /// Records `field` as missing when `value` is blank.
    pub fn require(&mut self, field: Field, value: &str) {
        if value.trim().is_empty() {
            self.push(field, FieldProblem::Missing);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn problem(&self, field: Field) -> Option<FieldProblem> {
        self.0.iter().find(|(f, _)| *f == field).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Field, FieldProblem)> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, problem)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match problem {
                FieldProblem::Missing => write!(f, "{field} is required")?,
                FieldProblem::Invalid => write!(f, "{field} is invalid")?,
            }
        }
        Ok(())
    }
}

/// Delivery and contact details collected during the details step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub alternate_phone: Option<String>,
    pub address: String,
    #[serde(default)]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerDetails {
    /// Checks that every required field is filled in and that the pincode is
    /// six digits.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require(Field::Name, &self.name);
        errors.require(Field::Email, &self.email);
        errors.require(Field::Phone, &self.phone);
        errors.require(Field::Address, &self.address);
        errors.require(Field::City, &self.city);
        errors.require(Field::State, &self.state);

        let pincode = self.pincode.trim();
        if pincode.is_empty() {
            errors.push(Field::Pincode, FieldProblem::Missing);
        } else if !is_valid_pincode(pincode) {
            errors.push(Field::Pincode, FieldProblem::Invalid);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Single-line delivery address including the optional landmark.
    pub fn full_address(&self) -> String {
        let mut parts = vec![self.address.trim()];
        if let Some(landmark) = non_blank(&self.landmark) {
            parts.push(landmark);
        }
        parts.push(self.city.trim());
        parts.push(self.state.trim());
        format!("{} - {}", parts.join(", "), self.pincode.trim())
    }
}

/// Returns the trimmed value of an optional field, if it holds anything.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.bytes().all(|b| b.is_ascii_digit())
}
