//! Delivery of unlock codes to donors.
//!
//! The HTTP layer hands codes to a [`CodeNotifier`] after the identity store
//! has done its work. [`SmtpNotifier`] mails codes through a relay,
//! [`LogNotifier`] stands in when no relay is configured, and
//! [`MemoryNotifier`] keeps deliveries for inspection.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use lettre::{
    Address,
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::info;

/// Display name on outgoing mail.
pub const SENDER_NAME: &str = "Snippy Bot";

/// Implicit-TLS submission port used when none is configured.
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Why a code is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeNotice {
    /// First donation; the code was just issued.
    Welcome,
    /// Another donation from a known donor.
    Repeat,
    /// The donor asked for their code again.
    Resend,
}

impl CodeNotice {
    /// Subject line for the notice.
    #[must_use]
    pub const fn subject(self) -> &'static str {
        match self {
            Self::Welcome => "Your Snippy Unlock Code",
            Self::Repeat => "You're already awesome, here's your code again",
            Self::Resend => "Your Snippy Unlock Code (Resent)",
        }
    }

    /// Plain-text body carrying the code.
    #[must_use]
    pub fn body(self, name: &str, code: &str) -> String {
        match self {
            Self::Welcome => {
                format!("Thanks for donating, {name}!\n\nHere is your Snippy unlock code:\n\n{code}")
            }
            Self::Repeat => format!(
                "You donated again! Snippy loves you.\n\nHere's your unlock code again just in \
                 case:\n\n{code}"
            ),
            Self::Resend => format!(
                "You asked for your unlock code. Here it is:\n\n{code}\n\nPaste this into \
                 Snippy's Settings to unlock premium features."
            ),
        }
    }
}

/// Errors returned by notifier adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The adapter could not hand the message over.
    #[error("delivery failed: {0}")]
    Delivery(String),
    /// A sender or recipient address did not parse.
    #[error("invalid address '{0}'")]
    Address(String),
    /// The transport could not be set up.
    #[error("mail transport misconfigured: {0}")]
    Transport(String),
}

/// Sends unlock codes to donors.
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    /// Deliver `code` to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Delivery`] when the message could not be sent.
    async fn send_code(
        &self,
        recipient: &str,
        name: &str,
        code: &str,
        notice: CodeNotice,
    ) -> Result<(), NotifyError>;
}

/// Notifier that records each delivery in the log without the code.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl CodeNotifier for LogNotifier {
    async fn send_code(
        &self,
        recipient: &str,
        name: &str,
        _code: &str,
        notice: CodeNotice,
    ) -> Result<(), NotifyError> {
        info!(%recipient, %name, ?notice, subject = notice.subject(), "unlock code notice");
        Ok(())
    }
}

/// Connection details for an SMTP relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    /// Relay host name.
    pub host: String,
    /// Implicit-TLS port.
    pub port: u16,
    /// Login; the relay is used unauthenticated when absent.
    pub username: Option<String>,
    /// Password for `username`.
    pub password: Option<String>,
    /// Bare sender address, shown as [`SENDER_NAME`].
    pub from: String,
}

/// Notifier that mails codes through an SMTP relay over implicit TLS.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Prepare a transport for `settings`. No connection is opened until the
    /// first delivery.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Address`] for an unparsable sender and
    /// [`NotifyError::Transport`] when TLS parameters cannot be built for the
    /// host.
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let from = sender(&settings.from)?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(settings.port);
        if let Some(user) = &settings.username {
            let password = settings.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(user.clone(), password));
        }
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl CodeNotifier for SmtpNotifier {
    async fn send_code(
        &self,
        recipient: &str,
        name: &str,
        code: &str,
        notice: CodeNotice,
    ) -> Result<(), NotifyError> {
        let message = compose(&self.from, recipient, name, code, notice)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        info!(%recipient, ?notice, "unlock code mailed");
        Ok(())
    }
}

fn sender(address: &str) -> Result<Mailbox, NotifyError> {
    let address = address
        .trim()
        .parse::<Address>()
        .map_err(|_| NotifyError::Address(address.to_owned()))?;
    Ok(Mailbox::new(Some(SENDER_NAME.to_owned()), address))
}

/// Build the plain-text message for one notice.
///
/// # Errors
///
/// Returns [`NotifyError::Address`] when `recipient` is not a mail address.
pub fn compose(
    from: &Mailbox,
    recipient: &str,
    name: &str,
    code: &str,
    notice: CodeNotice,
) -> Result<Message, NotifyError> {
    let to = recipient
        .trim()
        .parse::<Mailbox>()
        .map_err(|_| NotifyError::Address(recipient.to_owned()))?;
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(notice.subject())
        .header(ContentType::TEXT_PLAIN)
        .body(notice.body(name, code))
        .map_err(|e| NotifyError::Delivery(e.to_string()))
}

/// A delivery captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotice {
    /// Recipient email.
    pub recipient: String,
    /// Code that was sent.
    pub code: String,
    /// Kind of notice.
    pub notice: CodeNotice,
}

/// Notifier that keeps every delivery in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<SentNotice>>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Deliveries recorded so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentNotice> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CodeNotifier for MemoryNotifier {
    async fn send_code(
        &self,
        recipient: &str,
        _name: &str,
        code: &str,
        notice: CodeNotice,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentNotice {
                recipient: recipient.to_owned(),
                code: code.to_owned(),
                notice,
            });
        Ok(())
    }
}
