//! Out-of-band delivery of reset codes and password-change notices.
//!
//! Mail transport lives outside this service; the default notifier records a
//! structured event so an operator can relay the code.

use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reset_code(&self, email: &str, code: &str) -> AppResult<()>;

    async fn password_changed(&self, email: &str) -> AppResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reset_code(&self, email: &str, code: &str) -> AppResult<()> {
        tracing::info!(target: "notify", email = %email, otp = %code, "no mail transport configured; reset code issued");
        Ok(())
    }

    async fn password_changed(&self, email: &str) -> AppResult<()> {
        tracing::info!(target: "notify", email = %email, "password changed notification");
        Ok(())
    }
}
