use crate::application_port::SessionError;
use crate::domain_port::{EmailSender, SmsSender};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct SentSms {
    pub phone_number: String,
    pub text: String,
}

/// Records outbound SMS instead of sending them.
#[derive(Default)]
pub struct MemorySmsSender {
    sent: Mutex<Vec<SentSms>>,
}

impl MemorySmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentSms> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl SmsSender for MemorySmsSender {
    async fn send(&self, phone_number: &str, text: &str) -> Result<(), SessionError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentSms {
                phone_number: phone_number.to_string(),
                text: text.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to_address: String,
    pub subject: String,
    pub body: String,
}

/// Records outbound email instead of sending it.
#[derive(Default)]
pub struct MemoryEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(
        &self,
        to_address: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), SessionError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                to_address: to_address.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        }
        Ok(())
    }
}
