use anyhow::{anyhow, Result};
use base64::Engine;
use orghook_github::{AppCredentials, DEFAULT_BASE_URL};

#[derive(Clone)]
pub struct Config {
    pub github_api_base: String,
    pub github_token: Option<String>,
    pub github_app: Option<AppConfig>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub app_id: String,
    pub private_key: String,
    pub installation_id: i64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("github_api_base", &self.github_api_base)
            .field("github_token", &self.github_token.as_ref().map(|_| ".."))
            .field("github_app", &self.github_app)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_id", &self.app_id)
            .field("installation_id", &self.installation_id)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn credentials(&self) -> AppCredentials {
        AppCredentials::new(self.app_id.clone(), self.private_key.clone())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let github_app = match var("GITHUB_APP_ID") {
            Some(app_id) => {
                let private_key = var("GITHUB_PRIVATE_KEY_BASE64")
                    .ok_or_else(|| anyhow!("GITHUB_PRIVATE_KEY_BASE64 is required with GITHUB_APP_ID"))?;
                let installation_id = var("GITHUB_INSTALLATION_ID")
                    .ok_or_else(|| anyhow!("GITHUB_INSTALLATION_ID is required with GITHUB_APP_ID"))?
                    .parse()?;
                Some(AppConfig {
                    app_id,
                    private_key: decode_private_key(private_key)?,
                    installation_id,
                })
            }
            None => None,
        };

        Ok(Self {
            github_api_base: var("GITHUB_API_BASE").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            github_token: var("GITHUB_TOKEN")
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            github_app,
        })
    }
}

/// Accepts the key either as PEM text or as base64-encoded PEM.
fn decode_private_key(value: String) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }
    let decoded = base64::engine::general_purpose::STANDARD.decode(value.trim())?;
    Ok(String::from_utf8(decoded)?)
}
