//! OAuth id-token verification with JWKS caching
//!
//! Google and Apple issue RS256 id-tokens; both verify through the same
//! machinery, parameterized by issuer, JWKS endpoint, and audience.

use aura_types::{AuthProvider, VerifiedIdentity};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::AuthError;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const APPLE_JWKS_URL: &str = "https://appleid.apple.com/auth/keys";
const APPLE_AUTH_URL: &str = "https://appleid.apple.com/auth/authorize";

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// Individual JWK (JSON Web Key)
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    pub alg: Option<String>,
    pub n: String,
    pub e: String,
}

/// An OIDC identity provider this service accepts id-tokens from
#[derive(Debug, Clone)]
pub struct OidcProvider {
    /// Which provider tag resolved identities carry
    pub provider: AuthProvider,
    /// JWKS endpoint
    pub jwks_url: String,
    /// Accepted `iss` values
    pub issuers: Vec<String>,
    /// Expected `aud` (the app's client id)
    pub client_id: String,
}

impl OidcProvider {
    /// Google Sign-In. Google historically issues both bare and
    /// https-prefixed issuer forms.
    pub fn google(client_id: impl Into<String>) -> Self {
        Self {
            provider: AuthProvider::Google,
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            issuers: vec![
                "https://accounts.google.com".to_string(),
                "accounts.google.com".to_string(),
            ],
            client_id: client_id.into(),
        }
    }

    /// Sign in with Apple
    pub fn apple(client_id: impl Into<String>) -> Self {
        Self {
            provider: AuthProvider::Apple,
            jwks_url: APPLE_JWKS_URL.to_string(),
            issuers: vec!["https://appleid.apple.com".to_string()],
            client_id: client_id.into(),
        }
    }
}

/// Claims extracted from a verified id-token
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Id-token verifier with JWKS caching.
///
/// Caches the full key set and the list of known key ids so an attacker
/// cannot trigger a JWKS refetch per request by sending unknown kids.
#[derive(Clone)]
pub struct IdTokenVerifier {
    oidc: OidcProvider,
    http_client: reqwest::Client,
    /// Cache of kid -> DecodingKey
    key_cache: Cache<String, Arc<DecodingKey>>,
    /// Cache of known valid key IDs (prevents fetch flooding)
    jwks_kids_cache: Cache<String, Arc<Vec<String>>>,
}

impl IdTokenVerifier {
    /// Create a new verifier for the given provider
    pub fn new(oidc: OidcProvider, cache_duration: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            oidc,
            http_client,
            key_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(100)
                .build(),
            jwks_kids_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(1)
                .build(),
        }
    }

    /// Verify an id-token and reduce it to a verified identity tuple.
    ///
    /// Fails with `InvalidIdToken` on any signature/audience/issuer mismatch
    /// and when the payload carries no email.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let claims = self.decode_claims(token).await?;

        let email = claims.email.ok_or_else(|| {
            tracing::debug!(provider = %self.oidc.provider, "Id-token payload lacks an email");
            AuthError::InvalidIdToken
        })?;

        Ok(VerifiedIdentity {
            email,
            provider: self.oidc.provider,
            external_id: Some(claims.sub),
            name: claims.name,
            picture: claims.picture,
        })
    }

    async fn decode_claims(&self, token: &str) -> Result<IdTokenClaims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!("Failed to decode id-token header: {}", e);
            AuthError::InvalidIdToken
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("Id-token missing kid");
            AuthError::InvalidIdToken
        })?;

        let decoding_key = self.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&self.oidc.issuers);
        validation.set_audience(&[self.oidc.client_id.as_str()]);

        let token_data =
            decode::<IdTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
                tracing::debug!("Id-token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::IdTokenExpired,
                    _ => AuthError::InvalidIdToken,
                }
            })?;

        Ok(token_data.claims)
    }

    /// Get a decoding key for the given kid.
    ///
    /// If the cached known-kid list does not contain the kid, reject
    /// immediately without refetching.
    async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.key_cache.get(kid).await {
            return Ok(key);
        }

        if let Some(known_kids) = self.jwks_kids_cache.get("jwks").await {
            if !known_kids.contains(&kid.to_string()) {
                tracing::debug!(kid = %kid, "Unknown key ID not in cached JWKS");
                return Err(AuthError::InvalidIdToken);
            }
        }

        let jwks = self.fetch_jwks().await?;

        let kids: Vec<String> = jwks.keys.iter().map(|k| k.kid.clone()).collect();
        self.jwks_kids_cache
            .insert("jwks".to_string(), Arc::new(kids))
            .await;

        let jwk = jwks.keys.iter().find(|k| k.kid == kid).ok_or_else(|| {
            tracing::debug!(kid = %kid, "Key not found in JWKS");
            AuthError::InvalidIdToken
        })?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            tracing::error!("Failed to create decoding key: {}", e);
            AuthError::Internal("failed to create decoding key".to_string())
        })?;

        let key = Arc::new(decoding_key);

        for k in &jwks.keys {
            if k.kty != "RSA" {
                continue;
            }
            if let Ok(dk) = DecodingKey::from_rsa_components(&k.n, &k.e) {
                self.key_cache.insert(k.kid.clone(), Arc::new(dk)).await;
            }
        }

        Ok(key)
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AuthError> {
        let url = &self.oidc.jwks_url;
        tracing::debug!("Fetching JWKS from {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to fetch JWKS: {}", e);
            AuthError::Upstream("failed to fetch JWKS".to_string())
        })?;

        if !response.status().is_success() {
            tracing::error!("JWKS fetch returned status: {}", response.status());
            return Err(AuthError::Upstream("failed to fetch JWKS".to_string()));
        }

        response.json::<Jwks>().await.map_err(|e| {
            tracing::error!("Failed to parse JWKS: {}", e);
            AuthError::Upstream("failed to parse JWKS".to_string())
        })
    }

    /// Invalidate all caches (useful when keys rotate)
    pub async fn invalidate_cache(&self) {
        self.key_cache.invalidate_all();
        self.jwks_kids_cache.invalidate_all();
    }
}

impl std::fmt::Debug for IdTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdTokenVerifier")
            .field("provider", &self.oidc.provider)
            .finish_non_exhaustive()
    }
}

/// Google authorization-code client for the browser redirect flow.
///
/// The native mobile flow hands us an id-token directly; the web flow goes
/// through the consent redirect and exchanges the returned code here.
#[derive(Clone)]
pub struct GoogleOauthClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleOauthClient {
    /// Create a new Google OAuth client
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Build the consent-screen URL the client is redirected to
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{GOOGLE_AUTH_URL}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for the id-token it grants
    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let form = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google token exchange request failed");
                AuthError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange error");
            return Err(AuthError::Upstream(format!(
                "token exchange returned {status}"
            )));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse token exchange response");
            AuthError::Upstream(e.to_string())
        })?;

        tokens.id_token.ok_or_else(|| {
            tracing::error!("Token exchange response carried no id_token");
            AuthError::Upstream("token exchange response missing id_token".to_string())
        })
    }
}

impl std::fmt::Debug for GoogleOauthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOauthClient")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

/// Build the Sign in with Apple consent URL
pub fn apple_authorize_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{APPLE_AUTH_URL}?response_type=code%20id_token&response_mode=form_post\
         &client_id={}&redirect_uri={}&scope={}&state={}",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode("name email"),
        urlencoding::encode(state),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_provider_issuers() {
        let oidc = OidcProvider::google("client-123");
        assert_eq!(oidc.provider, AuthProvider::Google);
        assert!(oidc.issuers.contains(&"https://accounts.google.com".to_string()));
        assert!(oidc.issuers.contains(&"accounts.google.com".to_string()));
    }

    #[test]
    fn test_apple_provider_issuer() {
        let oidc = OidcProvider::apple("app.aura.ios");
        assert_eq!(oidc.provider, AuthProvider::Apple);
        assert_eq!(oidc.issuers, vec!["https://appleid.apple.com".to_string()]);
    }

    #[test]
    fn test_authorize_url_encodes_params() {
        let client = GoogleOauthClient::new(
            "client-123",
            "secret",
            "https://api.aura.app/auth/google/callback",
        );
        let url = client.authorize_url("state-xyz");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapi.aura.app%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=state-xyz"));
    }

    #[test]
    fn test_apple_authorize_url() {
        let url = apple_authorize_url("app.aura.ios", "https://api.aura.app/auth/apple", "s1");
        assert!(url.starts_with("https://appleid.apple.com/auth/authorize?"));
        assert!(url.contains("response_mode=form_post"));
        assert!(url.contains("client_id=app.aura.ios"));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let verifier = IdTokenVerifier::new(
            OidcProvider::google("client-123"),
            Duration::from_secs(3600),
        );
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let result = rt.block_on(verifier.verify("not-a-jwt"));
        assert!(matches!(result, Err(AuthError::InvalidIdToken)));
    }
}
