use std::sync::Arc;

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};

/// A plain-text message addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl OutgoingMail {
    pub fn reset_code(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset password".to_string(),
            text: format!("Reset code '{}' for password reset", code),
        }
    }

    pub fn password_changed(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Password update notification".to_string(),
            text: "You are receiving this email because your password was updated".to_string(),
        }
    }
}

/// Something that can actually put mail on the wire
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> AppResult<()>;
}

/// SMTP delivery through an authenticated relay
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(host: &str, username: &str, password: &str) -> AppResult<Self> {
        let from: Mailbox = username
            .parse()
            .map_err(|e| AppError::Mail(format!("Invalid sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Mail(format!("Invalid SMTP relay {}: {}", host, e)))?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> AppResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| AppError::Mail(format!("Invalid recipient {}: {}", mail.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .body(mail.text.clone())
            .map_err(|e| AppError::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        Ok(())
    }
}

/// Used when no SMTP account is configured; mail is logged and dropped
pub struct DisabledMailTransport;

#[async_trait::async_trait]
impl MailTransport for DisabledMailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> AppResult<()> {
        tracing::warn!(to = %mail.to, subject = %mail.subject, "Mail disabled, message dropped");
        Ok(())
    }
}

/// Queues outgoing mail for a background sender
///
/// Handlers never wait on SMTP: `send_in_background` returns immediately and
/// delivery failures are only logged.
#[derive(Clone)]
pub struct Mailer {
    outbox_tx: mpsc::UnboundedSender<OutgoingMail>,
}

/// Handle for gracefully shutting down the mail sender
pub struct MailerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl MailerHandle {
    /// Signals the sender task and waits until queued mail has been flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Mail sender shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Mail sender task panicked");
        }
    }
}

impl Mailer {
    /// Creates a mailer and spawns its sender task on the current runtime
    pub fn new(transport: Arc<dyn MailTransport>) -> (Self, MailerHandle) {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            Self::sender_task(transport, outbox_rx, shutdown_rx).await;
        });

        (Self { outbox_tx }, MailerHandle { shutdown_tx, task })
    }

    async fn sender_task(
        transport: Arc<dyn MailTransport>,
        mut outbox_rx: mpsc::UnboundedReceiver<OutgoingMail>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Mail sender task started");

        loop {
            tokio::select! {
                Some(mail) = outbox_rx.recv() => {
                    Self::deliver_logged(transport.as_ref(), mail).await;
                }
                // A dropped handle yields `None` and disables this arm
                Some(()) = shutdown_rx.recv() => {
                    // Drain whatever is already queued, then stop
                    let mut flushed = 0;
                    while let Ok(mail) = outbox_rx.try_recv() {
                        Self::deliver_logged(transport.as_ref(), mail).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Mail sender task stopped");
                    break;
                }
                else => {
                    tracing::info!("All mailers dropped, mail sender task stopped");
                    break;
                }
            }
        }
    }

    async fn deliver_logged(transport: &dyn MailTransport, mail: OutgoingMail) {
        match transport.deliver(&mail).await {
            Ok(()) => tracing::info!(to = %mail.to, subject = %mail.subject, "Mail sent"),
            Err(e) => tracing::error!(error = %e, to = %mail.to, "Failed to send mail"),
        }
    }

    /// Queues a message without waiting for delivery
    pub fn send_in_background(&self, mail: OutgoingMail) {
        if let Err(e) = self.outbox_tx.send(mail) {
            tracing::error!(error = %e, "Failed to queue outgoing mail");
        }
    }
}
