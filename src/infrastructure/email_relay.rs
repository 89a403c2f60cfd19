use crate::domain::ports::{Notifier, NotifyError, TemplateParams};
use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Credentials for one relay template.
///
/// All three identifiers are needed for a live send; any missing or blank
/// value leaves the relay unconfigured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayConfig {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
}

/// Complete credentials, borrowed from a [`RelayConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub service_id: &'a str,
    pub template_id: &'a str,
    pub public_key: &'a str,
}

impl RelayConfig {
    pub fn new(
        service_id: Option<String>,
        template_id: Option<String>,
        public_key: Option<String>,
    ) -> Self {
        Self {
            service_id,
            template_id,
            public_key,
        }
    }

    pub fn credentials(&self) -> Option<Credentials<'_>> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }
        Some(Credentials {
            service_id: present(&self.service_id)?,
            template_id: present(&self.template_id)?,
            public_key: present(&self.public_key)?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.credentials().is_some()
    }
}

/// Body of a relay `send` request.
#[derive(Debug, Serialize)]
pub struct RelayRequest<'a> {
    pub service_id: &'a str,
    pub template_id: &'a str,
    pub user_id: &'a str,
    pub template_params: &'a TemplateParams,
}

/// Writes each relay request as one JSON line instead of sending it.
///
/// The lines are exactly what the relay's send endpoint accepts, so a
/// separate delivery job can post them as-is.
#[derive(Clone)]
pub struct OutboxNotifier {
    config: RelayConfig,
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutboxNotifier {
    pub fn new(config: RelayConfig, sink: Box<dyn Write + Send>) -> Self {
        Self {
            config,
            sink: Arc::new(Mutex::new(sink)),
        }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    fn is_configured(&self) -> bool {
        self.config.is_complete()
    }

    async fn send(&self, params: TemplateParams) -> Result<(), NotifyError> {
        let credentials = self.config.credentials().ok_or(NotifyError::Unconfigured)?;
        let request = RelayRequest {
            service_id: credentials.service_id,
            template_id: credentials.template_id,
            user_id: credentials.public_key,
            template_params: &params,
        };
        let line = serde_json::to_string(&request).map_err(|e| NotifyError::Rejected(e.to_string()))?;

        let mut sink = self.sink.lock().await;
        writeln!(sink, "{line}").map_err(|e| NotifyError::Io(e.to_string()))?;
        sink.flush().map_err(|e| NotifyError::Io(e.to_string()))?;
        Ok(())
    }
}
