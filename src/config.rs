use axum_extra::extract::cookie::Key;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session_secret: Option<String>,
    /// Policy knobs; neither is exercised by the original app's UI, so they
    /// stay configurable instead of hard-coded.
    pub allow_self_follows: bool,
    pub allow_self_likes: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://warbler.db?mode=rwc".into());
        let session_secret = std::env::var("SESSION_SECRET").ok();
        Ok(Self {
            database_url,
            session_secret,
            allow_self_follows: env_flag("ALLOW_SELF_FOLLOWS"),
            allow_self_likes: env_flag("ALLOW_SELF_LIKES"),
        })
    }

    /// Key used to sign the session cookie. Without a configured secret a
    /// random key is generated, so sessions do not survive a restart.
    pub fn session_key(&self) -> anyhow::Result<Key> {
        match self.session_secret.as_deref() {
            Some(secret) if secret.len() >= 32 => Ok(Key::derive_from(secret.as_bytes())),
            Some(_) => anyhow::bail!("SESSION_SECRET must be at least 32 bytes"),
            None => {
                tracing::warn!("SESSION_SECRET not set; using a random session key");
                Ok(Key::generate())
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            session_secret: Some("warbler-test-secret-warbler-test-secret-warbler-test-secret!!".into()),
            allow_self_follows: false,
            allow_self_likes: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
