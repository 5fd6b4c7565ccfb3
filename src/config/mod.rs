use rocket::Config as RocketConfig;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Secrets shipped in `Rocket.toml` and `.env.example`.
const PLACEHOLDER_SECRETS: [&str; 2] = ["default-secret", "change-me"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] rocket::figment::Error),
    #[error(
        "profile `{0}` has no firebase_project_id and a placeholder auth_secret; \
         set ROCKET_FIREBASE_PROJECT_ID or a real ROCKET_AUTH_SECRET"
    )]
    InsecureAuth(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// Runtime settings, loaded once at ignition and handed to every service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreBackend,
    pub mongodb_uri: String,
    pub database_name: String,
    /// When set, ID tokens are verified against Firebase's signing keys.
    pub firebase_project_id: Option<String>,
    /// HS256 secret for locally issued tokens (development and tests).
    pub auth_secret: String,
    pub reactivation_window_days: i64,
    pub auto_verify_recruiters: bool,
    pub default_logo: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store: StoreBackend::Mongo,
            mongodb_uri: "mongodb://localhost:27017/?replicaSet=rs0".to_string(),
            database_name: "internhub".to_string(),
            firebase_project_id: None,
            auth_secret: "default-secret".to_string(),
            reactivation_window_days: 30,
            auto_verify_recruiters: false,
            default_logo: "/static/default-company-logo.png".to_string(),
        }
    }
}

impl Settings {
    /// Extracts settings for the figment's selected profile. Outside
    /// `development`, HS256 verification needs a non-placeholder secret.
    pub fn from_figment(figment: &Figment) -> Result<Settings, ConfigError> {
        let settings = figment.extract::<Settings>()?;
        let profile = figment.profile();
        if profile != "development" && settings.uses_placeholder_secret() {
            return Err(ConfigError::InsecureAuth(profile.to_string()));
        }
        Ok(settings)
    }

    /// Trimmed project id, `None` when unset or blank.
    pub fn firebase_project(&self) -> Option<&str> {
        self.firebase_project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    fn uses_placeholder_secret(&self) -> bool {
        let secret = self.auth_secret.trim();
        self.firebase_project().is_none()
            && (secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret))
    }
}

pub struct Config;

impl Config {
    pub fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").split("__"))
    }

    pub fn is_development() -> bool {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());
        profile == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::providers::Serialized;

    fn figment(profile: &str) -> Figment {
        Figment::new()
            .merge(Serialized::default("auth_secret", "change-me"))
            .select(profile)
    }

    #[test]
    fn unparsable_key_is_an_error() {
        let figment = figment("production")
            .merge(Serialized::default("firebase_project_id", "my-proj"))
            .merge(Serialized::default("reactivation_window_days", "thirty"));
        assert!(matches!(
            Settings::from_figment(&figment),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn placeholder_secret_only_allowed_in_development() {
        assert!(Settings::from_figment(&figment("development")).is_ok());
        assert!(matches!(
            Settings::from_figment(&figment("production")),
            Err(ConfigError::InsecureAuth(p)) if p == "production"
        ));

        let firebase = figment("production")
            .merge(Serialized::default("firebase_project_id", "my-proj"));
        let settings = Settings::from_figment(&firebase).unwrap();
        assert_eq!(settings.firebase_project(), Some("my-proj"));

        let secret = figment("production")
            .merge(Serialized::default("auth_secret", "a-long-random-secret"));
        assert!(Settings::from_figment(&secret).is_ok());
    }

    #[test]
    fn blank_project_id_is_ignored() {
        let settings = Settings {
            firebase_project_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.firebase_project(), None);
    }
}
