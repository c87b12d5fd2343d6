use crate::config::Config;

/// The signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }

    /// Resolve the local identity: configured user first, then the OS login name
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    fn resolve_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |id: &String| !id.trim().is_empty();
        let id = config
            .user_id
            .clone()
            .filter(non_blank)
            .or_else(|| env("USER").filter(non_blank))
            .or_else(|| env("USERNAME").filter(non_blank))
            .unwrap_or_else(|| "local-user".to_string());

        Self::new(id, config.user_email.clone())
    }

    /// Display name: the email's local part, or "You" when there is no email
    pub fn display_name(&self) -> String {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "You".to_string())
    }

    pub fn email_or_default(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{}@ait-os.com", self.id))
    }
}
