//! Email service for export-ready notifications.
//!
//! Supported providers:
//! - `console`: Logs emails to console (development)
//! - `smtp`: Sends via SMTP server (STARTTLS)
//!
//! Notification failures never fail the export: the caller treats a
//! send error as a logged warning, not a job error.

use std::sync::Arc;

use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Email service for transactional notifications.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Send an email message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "smtp" => self.send_smtp(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Notify a requester that their export is ready for download.
    pub async fn send_export_ready(
        &self,
        to_email: &str,
        download_link: &str,
        sharded: bool,
    ) -> Result<(), EmailError> {
        let message = EmailMessage {
            to: to_email.to_string(),
            subject: "Votre export est prêt".to_string(),
            body_text: export_ready_text(download_link, sharded),
            body_html: export_ready_html(download_link, sharded),
        };

        self.send(message).await
    }

    /// Console provider - logs email to console (for development).
    fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "📧 Email (console provider)"
        );
        info!(body_text = %message.body_text, "📧 Email body (plain text)");
        Ok(())
    }

    /// SMTP provider - sends a multipart message over STARTTLS.
    async fn send_smtp(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.smtp_host.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let from: Mailbox = format!("{} <{}>", self.config.sender_name, self.config.sender_email)
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.config.sender_email.clone()))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(message.to.clone()))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.body_text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.body_html),
                    ),
            )
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendFailed(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ))
            .build();

        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        info!(to = %message.to, "Export notification sent");
        Ok(())
    }
}

fn sharded_note_text(sharded: bool) -> &'static str {
    if sharded {
        "\n\nL'export contient un grand nombre d'avis : le fichier est une archive zip regroupant un fichier par année."
    } else {
        ""
    }
}

fn export_ready_text(download_link: &str, sharded: bool) -> String {
    format!(
        "Bonjour,\n\nVotre fichier d'export est prêt. Vous pouvez le télécharger en utilisant le lien suivant :\n\n{link}\n\nCe lien expirera dans 30 jours.{note}\n\nCordialement,\nL'équipe JDMA",
        link = download_link,
        note = sharded_note_text(sharded)
    )
}

fn export_ready_html(download_link: &str, sharded: bool) -> String {
    let note = if sharded {
        "L'export contient un grand nombre d'avis : le fichier est une archive zip regroupant un fichier par année.<br><br>"
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <style>
            body {{ font-family: Arial, sans-serif; }}
            .container {{ max-width: 640px; margin: 0 auto; padding: 20px; }}
            .footer {{ font-size: 12px; padding: 16px 32px; background: #F5F5FE; margin-top: 30px; }}
        </style>
    </head>
    <body>
        <div class="container">
            <div>
                <p>Bonjour,<br><br>
                Votre fichier d'export est prêt. Vous pouvez le télécharger en utilisant le lien suivant :<br><br>
                <a href="{link}">Télécharger le fichier</a><br><br>
                Ce lien expirera dans 30 jours.<br><br>
                {note}
                </p>
            </div>
            <div class="footer">
                <p>Pour toute question, merci de nous contacter à experts@design.numerique.gouv.fr.</p>
            </div>
        </div>
    </body>
</html>"#,
        link = download_link,
        note = note
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_ready_text_includes_link_and_expiry() {
        let body = export_ready_text("https://example.test/file.csv", false);
        assert!(body.contains("https://example.test/file.csv"));
        assert!(body.contains("30 jours"));
        assert!(!body.contains("archive zip"));
    }

    #[test]
    fn test_export_ready_text_mentions_archive_when_sharded() {
        let body = export_ready_text("https://example.test/file.zip", true);
        assert!(body.contains("archive zip"));
    }

    #[tokio::test]
    async fn test_disabled_service_skips_send() {
        let service = EmailService::new(EmailConfig::default());
        let result = service
            .send_export_ready("user@example.test", "https://example.test/f.csv", false)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected() {
        let config = EmailConfig {
            enabled: true,
            provider: "carrier-pigeon".to_string(),
            ..EmailConfig::default()
        };
        let service = EmailService::new(config);
        let result = service.send(EmailMessage {
            to: "user@example.test".to_string(),
            subject: "s".to_string(),
            body_text: "t".to_string(),
            body_html: "<p>t</p>".to_string(),
        });
        assert!(matches!(result.await, Err(EmailError::NotConfigured)));
    }
}
