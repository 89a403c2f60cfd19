use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Named values substituted into a relay email template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TemplateParams(BTreeMap<String, String>);

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Credentials are missing; callers fall back to a simulated success.
    #[error("email relay is not configured")]
    Unconfigured,
    #[error("{0}")]
    Rejected(String),
    #[error("delivery failed: {0}")]
    Io(String),
}

/// Delivers a message to the merchant, e.g. through an email relay.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether all credentials needed for a live send are present.
    fn is_configured(&self) -> bool;

    async fn send(&self, params: TemplateParams) -> Result<(), NotifyError>;
}

pub type NotifierBox = Box<dyn Notifier>;
