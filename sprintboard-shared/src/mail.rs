/// Outgoing email
///
/// Handlers build an [`EmailMessage`] and hand it to whatever [`Mailer`] the
/// application was started with. Only [`ConsoleMailer`] ships here; it writes
/// the message to the log, which is what local development and tests want.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::role::MemberRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to send email: {0}")]
    Send(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Logs each message at info level instead of delivering it
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            from = %message.from,
            subject = %message.subject,
            body = %message.text,
            "Email sent (console)"
        );
        Ok(())
    }
}

/// Everything needed to tell someone they were added to a project
#[derive(Debug, Clone)]
pub struct Invitation<'a> {
    pub project_id: Uuid,
    pub project_name: &'a str,
    /// Inviter's display name, or their email when unnamed
    pub inviter: &'a str,
    pub invitee_email: &'a str,
    pub role: MemberRole,
    /// Public base URL of the web app, without trailing slash
    pub app_url: &'a str,
}

impl Invitation<'_> {
    pub fn project_url(&self) -> String {
        format!(
            "{}/projects?project={}",
            self.app_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

pub fn invitation_email(invitation: &Invitation<'_>, from: &str) -> EmailMessage {
    let project_url = invitation.project_url();

    EmailMessage {
        to: invitation.invitee_email.to_string(),
        from: from.to_string(),
        subject: format!("You've been invited to join \"{}\"", invitation.project_name),
        text: format!(
            "Hello,\n\n\
             {inviter} has invited you to join the project \"{project}\" as a {role}.\n\n\
             You can now access this project and collaborate with the team.\n\n\
             View the project: {project_url}\n\n\
             If you don't have an account yet, sign up with this email address to get started.\n",
            inviter = invitation.inviter,
            project = invitation.project_name,
            role = invitation.role.display_name(),
        ),
    }
}
