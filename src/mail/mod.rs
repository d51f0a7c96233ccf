//! Outbound email: the message type, the transport seam and the templates for
//! every transactional message the shop sends.

mod log;
mod smtp;
pub mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{MailConfig, MailDriver};

pub use log::LogMailer;
pub use smtp::SmtpMailer;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(&'static str),
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.driver {
        MailDriver::Smtp => Ok(Arc::new(SmtpMailer::new(config)?)),
        MailDriver::Log => Ok(Arc::new(LogMailer)),
    }
}
