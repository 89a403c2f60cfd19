use crate::domain::inquiry::Inquiry;
use crate::domain::ports::{Notifier, NotifyError, TemplateParams};
use crate::error::{Result, ValidationError};
use tracing::{info, warn};

/// Validates a contact-form inquiry and forwards it to the merchant.
///
/// Returns `true` when the inquiry was actually delivered and `false` when the
/// relay is unconfigured and delivery was skipped.
pub async fn submit_inquiry(notifier: &dyn Notifier, inquiry: &Inquiry) -> Result<bool> {
    inquiry.validate().map_err(ValidationError::Fields)?;

    match notifier.send(TemplateParams::from(inquiry)).await {
        Ok(()) => {
            info!(kind = inquiry.kind.trim(), "Inquiry sent");
            Ok(true)
        }
        Err(NotifyError::Unconfigured) => {
            warn!("Email relay credentials missing. Inquiry not sent.");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
