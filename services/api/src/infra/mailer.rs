use anyhow::Context as _;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;
use crate::domain::repository::Mailer;
use crate::domain::types::MailMessage;

/// Delivers mail through an SMTP relay (implicit TLS).
///
/// `send` only builds the message; delivery runs on a spawned task whose
/// outcome is logged.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> anyhow::Result<Self> {
        let from: Mailbox = settings.from.parse().context("parse MAIL_FROM")?;
        let builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .context("build SMTP transport")?
            .port(settings.port);
        let builder = match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, address: &str, message: MailMessage) {
        let to: Mailbox = match address.parse() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(to = %address, error = %e, "invalid email address, not sending");
                return;
            }
        };
        let email = match Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)
        {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(to = %address, error = %e, "failed to build email");
                return;
            }
        };

        let transport = self.transport.clone();
        let to = address.to_owned();
        tokio::spawn(async move {
            match transport.send(email).await {
                Ok(_) => tracing::info!(%to, "email sent"),
                Err(e) => tracing::error!(%to, error = %e, "failed to deliver email"),
            }
        });
    }
}

/// Writes mail to the log instead of sending it. Used when no SMTP relay is configured.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, address: &str, message: MailMessage) {
        tracing::info!(to = %address, subject = %message.subject, body = %message.html, "email not sent: no SMTP relay configured");
    }
}
