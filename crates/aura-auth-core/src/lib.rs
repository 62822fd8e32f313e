//! Aura Auth Core - Authentication business logic
//!
//! Credential verification (email OTP, Google and Apple id-tokens), session
//! issuance, and account resolution.

pub mod config;
pub mod error;
pub mod mailer;
pub mod oauth;
pub mod otp;
pub mod resolver;
pub mod service;
pub mod session;

pub use config::*;
pub use error::*;
pub use mailer::{MailError, Mailer, SmtpMailer};
pub use oauth::{GoogleOauthClient, IdTokenVerifier, OidcProvider};
pub use otp::{generate_otp_code, OtpService};
pub use resolver::AccountResolver;
pub use service::*;
pub use session::{SessionClaims, SessionIssuer};
