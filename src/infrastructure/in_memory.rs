use crate::domain::ports::{Notifier, NotifyError, TemplateParams};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Outbox {
    sent: Vec<TemplateParams>,
    failures: VecDeque<String>,
}

/// A thread-safe in-memory notifier that keeps every message it is given.
///
/// Clones share the same outbox, so a test can hand one clone to the
/// sequencer and inspect deliveries through another. Failures can be queued
/// with [`RecordingNotifier::fail_next`].
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    configured: bool,
    outbox: Arc<RwLock<Outbox>>,
}

impl RecordingNotifier {
    /// A notifier that accepts and records every message.
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    /// A notifier with no credentials; every send reports `Unconfigured`.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Makes the next send fail with `reason`.
    pub async fn fail_next(&self, reason: impl Into<String>) {
        self.outbox.write().await.failures.push_back(reason.into());
    }

    pub async fn sent(&self) -> Vec<TemplateParams> {
        self.outbox.read().await.sent.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, params: TemplateParams) -> Result<(), NotifyError> {
        if !self.configured {
            return Err(NotifyError::Unconfigured);
        }
        let mut outbox = self.outbox.write().await;
        if let Some(reason) = outbox.failures.pop_front() {
            return Err(NotifyError::Rejected(reason));
        }
        outbox.sent.push(params);
        Ok(())
    }
}
