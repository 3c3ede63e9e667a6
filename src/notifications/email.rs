//! Mail relay client built on lettre.

use std::path::Path;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment as MailAttachment, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::{EmailConfig, EmailTransportConfig};
use crate::notifications::{NotificationError, Notifier, OutgoingEmail};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
    Disabled,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        let transport = match &config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|e| NotificationError::Transport(format!("create SMTP transport: {e}")))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                }
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                tracing::info!("Email transport: SMTP relay {}:{}", host, port);
                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                // Development: messages land as .eml files on disk
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir)
                        .map_err(|e| NotificationError::Transport(format!("create emails directory: {e}")))?;
                }
                tracing::info!("Email transport: writing messages to {}", path);
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
            EmailTransportConfig::Disabled => {
                tracing::warn!("Email transport disabled - notifications will be reported as failed");
                EmailTransport::Disabled
            }
        };

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    fn build_message(&self, email: OutgoingEmail) -> Result<Message, NotificationError> {
        let from = mailbox(Some(&self.from_name), &self.from_email)?;
        let to = mailbox(email.to_name.as_deref(), &email.to)?;

        let mut builder = Message::builder().from(from).to(to).subject(email.subject);
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(mailbox(None, reply_to)?);
        }

        let alternative = MultiPart::alternative_plain_html(email.text_body, email.html_body);
        let body = match email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.mime_type)
                    .map_err(|e| NotificationError::Build(format!("attachment content type: {e}")))?;
                MultiPart::mixed()
                    .multipart(alternative)
                    .singlepart(MailAttachment::new(attachment.filename).body(attachment.content, content_type))
            }
            None => alternative,
        };

        builder
            .multipart(body)
            .map_err(|e| NotificationError::Build(format!("build email message: {e}")))
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, NotificationError> {
    let address = address
        .parse()
        .map_err(|e: lettre::address::AddressError| NotificationError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError> {
        if matches!(self.transport, EmailTransport::Disabled) {
            return Err(NotificationError::NotConfigured);
        }

        let recipient = email.to.clone();
        let message = self.build_message(email)?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| NotificationError::Transport(format!("send SMTP email: {e}")))?;
            }
            EmailTransport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| NotificationError::Transport(format!("send file email: {e}")))?;
            }
            EmailTransport::Disabled => return Err(NotificationError::NotConfigured),
        }

        tracing::debug!("Email sent to {}", recipient);
        Ok(())
    }

    fn sender(&self) -> (&str, &str) {
        (&self.from_name, &self.from_email)
    }
}
