use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

const SMTP_RELAY: &str = "smtp.gmail.com";
const SENDER_NAME: &str = "PlayLink";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Outbound email over the Gmail SMTP relay. Constructed only when mailer
/// credentials are configured; callers hold an `Option<Mailer>` and treat
/// `None` as "sending disabled".
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(user: &str, password: &str) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(SMTP_RELAY)?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        let from = format!("\"{SENDER_NAME}\" <{user}>").parse::<Mailbox>()?;
        Ok(Self { transport, from })
    }

    /// Confirmation sent right after a tester registers.
    pub async fn send_confirmation(
        &self,
        name: &str,
        email: &str,
        platform_label: &str,
    ) -> Result<(), MailError> {
        let subject =
            format!("[{SENDER_NAME}] Your {platform_label} beta test application has been received");
        let text = format!(
            "Hi {name},\n\n\
             Your {platform_label} beta test application is complete.\n\
             We will follow up soon with instructions for getting started.\n\n\
             - The {SENDER_NAME} team -"
        );
        let html = format!(
            "<p>Hi {name},</p>\
             <p>Your {platform_label} beta test application is complete.</p>\
             <p>We will follow up soon with instructions for getting started.</p>\
             <p>- The {SENDER_NAME} team -</p>"
        );
        self.send(email, &subject, text, html).await
    }

    /// Invitation carrying the opt-in link for the Android beta track.
    pub async fn send_invitation(
        &self,
        name: &str,
        email: &str,
        invite_link: &str,
    ) -> Result<(), MailError> {
        let subject = format!("[{SENDER_NAME}] Your Android beta invitation is ready");
        let text = format!(
            "Hi {name},\n\n\
             You have been invited to the {SENDER_NAME} Android beta.\n\
             Join here: {invite_link}\n\n\
             - The {SENDER_NAME} team -"
        );
        let html = format!(
            "<p>Hi {name},</p>\
             <p>You have been invited to the {SENDER_NAME} Android beta.</p>\
             <p><a href=\"{invite_link}\">Join the beta</a></p>\
             <p>- The {SENDER_NAME} team -</p>"
        );
        self.send(email, &subject, text, html).await
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))?;
        self.transport.send(message).await?;
        Ok(())
    }
}
