use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);
/// Unknown `kid`s trigger at most one refetch per interval.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // auth uid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Custom claim set on operator accounts.
    #[serde(default)]
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("token has no subject")]
    EmptySubject,
    #[error("token signed with unknown key")]
    UnknownKey,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(#[from] reqwest::Error),
}

/// Verifies a bearer ID token and returns its claims. Identity is only ever
/// taken from a token that passed this check.
#[rocket::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

fn checked(claims: Claims) -> Result<Claims, AuthError> {
    if claims.sub.trim().is_empty() {
        return Err(AuthError::EmptySubject);
    }
    Ok(claims)
}

/// HS256 tokens signed with a shared secret. Used for local development and
/// tests, where it also mints tokens.
pub struct SharedSecretVerifier {
    secret: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        SharedSecretVerifier {
            secret: secret.into(),
        }
    }

    pub fn issue(
        &self,
        uid: &str,
        email: Option<&str>,
        admin: bool,
        ttl_secs: i64,
    ) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uid.to_string(),
            email: email.map(str::to_string),
            admin,
            exp: now + ttl_secs,
            iat: now,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }
}

#[rocket::async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        checked(token_data.claims)
    }
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

enum KeyLookup {
    Found(DecodingKey),
    Unknown,
    Refresh,
}

impl CachedKeys {
    fn lookup(&self, kid: &str, now: Instant) -> Result<KeyLookup, AuthError> {
        if self.expires_at <= now {
            return Ok(KeyLookup::Refresh);
        }
        if let Some(jwk) = self.keys.find(kid) {
            return Ok(KeyLookup::Found(DecodingKey::from_jwk(jwk)?));
        }
        if now.duration_since(self.fetched_at) < MIN_REFRESH_INTERVAL {
            Ok(KeyLookup::Unknown)
        } else {
            Ok(KeyLookup::Refresh)
        }
    }
}

fn lookup(cached: Option<&CachedKeys>, kid: &str) -> Result<KeyLookup, AuthError> {
    match cached {
        Some(cached) => cached.lookup(kid, Instant::now()),
        None => Ok(KeyLookup::Refresh),
    }
}

/// Firebase Auth ID tokens: RS256, signed by Google's securetoken service
/// account, audience is the project id.
pub struct FirebaseTokenVerifier {
    project_id: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        FirebaseTokenVerifier {
            project_id: project_id.into(),
            http: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AuthError> {
        let response = self
            .http
            .get(FIREBASE_JWKS_URL)
            .send()
            .await?
            .error_for_status()?;

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_KEY_TTL);
        let keys = response.json::<JwkSet>().await?;
        debug!("Fetched {} Firebase signing keys (ttl {:?})", keys.keys.len(), ttl);

        let now = Instant::now();
        Ok(CachedKeys {
            keys,
            fetched_at: now,
            expires_at: now + ttl,
        })
    }

    /// Returns the decoding key for `kid`. The cached set is refetched when
    /// it has expired, or when it lacks `kid` and was fetched more than
    /// `MIN_REFRESH_INTERVAL` ago.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        match lookup(self.keys.read().await.as_ref(), kid)? {
            KeyLookup::Found(key) => return Ok(key),
            KeyLookup::Unknown => return Err(AuthError::UnknownKey),
            KeyLookup::Refresh => {}
        }

        // one fetch at a time; waiters re-check what it stored
        let mut cached = self.keys.write().await;
        match lookup(cached.as_ref(), kid)? {
            KeyLookup::Found(key) => return Ok(key),
            KeyLookup::Unknown => return Err(AuthError::UnknownKey),
            KeyLookup::Refresh => {}
        }
        let fresh = self.fetch_keys().await?;
        let key = fresh
            .keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()?;
        *cached = Some(fresh);
        key.ok_or(AuthError::UnknownKey)
    }
}

#[rocket::async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::UnknownKey)?;
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);

        let token_data = decode::<Claims>(token, &key, &validation)?;
        checked(token_data.claims)
    }
}

fn max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.parse::<u64>().ok())
        .map(Duration::from_secs)
}
