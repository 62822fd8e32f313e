//! Transactional mail delivery
//!
//! The `Mailer` trait is the seam between the OTP flow and the SMTP
//! transport; tests substitute a recording fake.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

/// Mail sending error
#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to send email: {0}")]
    SendFailed(String),

    #[error("invalid mail configuration: {0}")]
    InvalidConfig(String),
}

/// Trait for transactional mail providers
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a one-time verification code
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), MailError>;
}

/// SMTP mailer backed by lettre's async transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a new SMTP mailer.
    ///
    /// Port 465 uses implicit TLS (SMTPS); other ports use STARTTLS when
    /// `use_tls` is set.
    pub fn new(
        host: &str,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
        from_address: &str,
    ) -> Result<Self, MailError> {
        let mut builder = if use_tls {
            let tls_params = TlsParameters::new(host.to_string())
                .map_err(|e| MailError::InvalidConfig(format!("TLS configuration error: {e}")))?;

            if port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .map_err(|e| MailError::InvalidConfig(format!("SMTP relay error: {e}")))?
                    .port(port)
                    .tls(Tls::Wrapper(tls_params))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| MailError::InvalidConfig(format!("SMTP relay error: {e}")))?
                    .port(port)
                    .tls(Tls::Required(tls_params))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        let from = from_address
            .parse()
            .map_err(|e| MailError::InvalidConfig(format!("invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| MailError::InvalidConfig(format!("invalid to address: {e}")))?;

        let text = format!(
            "Your verification code is {code}.\n\nIt expires in 10 minutes. \
             If you didn't request this, you can ignore this email.\n"
        );
        let html = format!(
            "<p>Your verification code is</p>\
             <p style=\"font-size:24px;font-weight:bold;letter-spacing:4px\">{code}</p>\
             <p>It expires in 10 minutes. If you didn't request this, you can ignore this email.</p>"
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("{code} is your verification code"))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| MailError::SendFailed(format!("failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}
