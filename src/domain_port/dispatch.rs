use crate::application_port::SessionError;

/// Outbound SMS transport. Best-effort from the session service's point of
/// view: a stored OTP stays valid even if the send fails.
#[async_trait::async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone_number: &str, text: &str) -> Result<(), SessionError>;
}

/// Outbound email transport.
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to_address: &str, subject: &str, body: &str)
    -> Result<(), SessionError>;
}
