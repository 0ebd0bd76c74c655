// ============================================================================
// NOTIFICATIONS (EMAIL)
// ============================================================================
//
// Description:
//   Envoi des emails d'activation, de reset password et de bienvenue.
//   Best-effort : un échec est loggé puis ignoré, il ne fait jamais échouer
//   l'inscription ou l'activation qui l'a déclenché (déjà committées).
//
// Backends (MAIL_BACKEND):
//   - console : écrit l'email dans les logs (dev)
//   - http    : POST JSON vers MAIL_API_URL (relai d'envoi type Mailgun)
//
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{Config, MailBackend};
use crate::models::users;

const SITE_NAME: &str = "CrowdFund Egypt";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

//trait = Interface vers le service d'envoi
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String>;
}

pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "📧 (console) email:\n{}",
            email.text
        );
        Ok(())
    }
}

pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        let mut request = self.client.post(&self.api_url).json(email);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("Mail API unreachable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Mail API returned {}", response.status()));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    base_url: String,
    from: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, base_url: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            base_url: base_url.into(),
            from: from.into(),
        }
    }

    /// Construit le Notifier selon MAIL_BACKEND
    pub fn from_config(config: &Config) -> Self {
        let mailer: Arc<dyn Mailer> = match &config.mail_backend {
            MailBackend::Console => Arc::new(ConsoleMailer),
            MailBackend::Http { api_url, api_key } => {
                Arc::new(HttpMailer::new(api_url.clone(), api_key.clone()))
            }
        };
        Self::new(mailer, config.public_base_url.clone(), config.mail_from.clone())
    }

    pub fn activation_link(&self, token: &str) -> String {
        format!("{}/api/auth/activate/{}", self.base_url, token)
    }

    pub fn password_reset_link(&self, token: &str) -> String {
        format!("{}/api/auth/reset-password/{}", self.base_url, token)
    }

    pub async fn send_activation_email(&self, user: &users::Model, link: &str) -> bool {
        let text = format!(
            "Hello {} {},\n\nPlease activate your account by opening the link below \
             (valid for 24 hours):\n\n{}\n",
            user.first_name, user.last_name, link
        );
        self.deliver(user, format!("Activate your account - {}", SITE_NAME), text, "activation")
            .await
    }

    pub async fn send_password_reset_email(&self, user: &users::Model, link: &str) -> bool {
        let text = format!(
            "Hello {},\n\nA password reset was requested for your account. \
             Open the link below to choose a new password (valid for 24 hours):\n\n{}\n\n\
             If you did not request this, you can ignore this email.\n",
            user.first_name, link
        );
        self.deliver(user, format!("Reset your password - {}", SITE_NAME), text, "password_reset")
            .await
    }

    pub async fn send_welcome_email(&self, user: &users::Model) -> bool {
        let text = format!(
            "Welcome {} {}!\n\nYour account is now active. You can now:\n\
             - create crowdfunding projects\n\
             - support projects you like\n\
             - rate and comment on projects\n\n\
             Explore the projects: {}/api/projects\n",
            user.first_name, user.last_name, self.base_url
        );
        self.deliver(user, format!("Welcome to {}!", SITE_NAME), text, "welcome")
            .await
    }

    async fn deliver(&self, user: &users::Model, subject: String, text: String, kind: &str) -> bool {
        let email = OutgoingEmail {
            from: self.from.clone(),
            to: user.email.clone(),
            subject,
            text,
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                tracing::debug!(user_id = user.id, kind, "email sent");
                true
            }
            Err(e) => {
                tracing::warn!(user_id = user.id, kind, error = %e, "failed to send email");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_user, FailingMailer, RecordingMailer};

    #[tokio::test]
    async fn test_activation_email_contains_link() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(mailer.clone(), "http://site.test", "no-reply@site.test");
        let user = sample_user(7, "mona@example.com");

        let link = notifier.activation_link("abc123");
        assert_eq!(link, "http://site.test/api/auth/activate/abc123");
        assert!(notifier.send_activation_email(&user, &link).await);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "mona@example.com");
        assert!(sent[0].text.contains(&link));
    }

    #[tokio::test]
    async fn test_failure_is_reported_as_false() {
        let notifier = Notifier::new(Arc::new(FailingMailer), "http://site.test", "x@site.test");
        let user = sample_user(1, "a@example.com");

        assert!(!notifier.send_welcome_email(&user).await);
        assert!(!notifier.send_password_reset_email(&user, "http://l").await);
    }
}
