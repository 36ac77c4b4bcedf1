use async_trait::async_trait;
use tracing::debug;

/// Out-of-band OTP delivery. Deployments bind an SMTP or provider-API
/// sender here; a failed send makes the orchestrator roll the stored code
/// back so the user can retry cleanly.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, to: &str, code: &str) -> anyhow::Result<()>;
}

/// Local-dev binding: logs instead of sending, so running the service needs
/// no mail credentials. The code only ever appears at debug level here —
/// never in an HTTP response.
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp(&self, to: &str, code: &str) -> anyhow::Result<()> {
        debug!(to_email = %to, code = %code, "otp email send stub");
        Ok(())
    }
}
