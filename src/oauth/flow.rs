use crate::config::ProviderConfig;
use crate::error::ApiError;
use crate::oauth::state::generate_state;
use crate::oauth::token_store::TokenStore;
use crate::oauth::types::{Token, TokenDelivery};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// OAuth endpoint URLs for one provider
#[derive(Debug, Clone)]
pub struct OAuthUrls {
    pub authorize: String,
    pub token: String,
    pub revoke: String,
}

/// Authorization-code OAuth flow for one provider
///
/// Owns the provider's token state and its persisted record. The anti-replay
/// `state` value is drawn once per flow instance.
pub struct OAuthFlow {
    provider_name: String,
    config: ProviderConfig,
    urls: OAuthUrls,
    state: String,
    client: reqwest::Client,
    timeout: Duration,
    token: RwLock<Token>,
    refresh_lock: Mutex<()>,
    store: Arc<TokenStore>,
}

impl OAuthFlow {
    pub async fn new(
        provider_name: &str,
        config: ProviderConfig,
        urls: OAuthUrls,
        store: Arc<TokenStore>,
    ) -> Self {
        let token = store.load(provider_name).await;
        let timeout = Duration::from_secs(config.timeout_seconds);

        Self {
            provider_name: provider_name.to_string(),
            config,
            urls,
            state: generate_state(),
            client: reqwest::Client::new(),
            timeout,
            token: RwLock::new(token),
            refresh_lock: Mutex::new(()),
            store,
        }
    }

    /// The URL the user should be redirected to for authorization
    pub fn authorize_url(&self) -> Result<String, ApiError> {
        let mut url = url::Url::parse(&self.urls.authorize)
            .map_err(|e| ApiError::Config(format!("Invalid authorize URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", &self.state);

        for (key, value) in &self.config.extra_authorize_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        tracing::debug!(provider = %self.provider_name, url = %url, "Prepared authorization url");
        Ok(url.to_string())
    }

    /// Handle the provider redirect carrying `code` and `state`
    ///
    /// Missing parameters or a state mismatch are logged and ignored; no
    /// token exchange happens. A failed exchange leaves the token untouched.
    pub async fn handle_redirect(&self, params: &HashMap<String, String>) -> Result<(), ApiError> {
        let (code, state) = match (params.get("code"), params.get("state")) {
            (Some(code), Some(state)) => (code, state),
            _ => {
                tracing::error!(provider = %self.provider_name, "Invalid redirect parameters");
                return Ok(());
            }
        };

        if *state != self.state {
            tracing::error!(provider = %self.provider_name, "Invalid state encountered");
            return Ok(());
        }
        tracing::debug!(provider = %self.provider_name, "Received valid authorization code");

        let mut form = HashMap::new();
        form.insert("client_id", self.config.client_id.as_str());
        form.insert("client_secret", self.config.client_secret.as_str());
        form.insert("redirect_uri", self.config.redirect_uri.as_str());
        form.insert("grant_type", "authorization_code");
        form.insert("code", code.as_str());

        let response = match self
            .client
            .post(&self.urls.token)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(provider = %self.provider_name, error = %e, "Code exchange request failed");
                return Ok(());
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = %self.provider_name,
                status = %status,
                body = %body,
                "Code exchange failed"
            );
            return Ok(());
        }

        let delivery: TokenDelivery = match response.json().await {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::error!(provider = %self.provider_name, error = %e, "Malformed token response");
                return Ok(());
            }
        };

        self.authorize(delivery).await
    }

    /// Apply a first token delivery and persist it
    pub async fn authorize(&self, delivery: TokenDelivery) -> Result<(), ApiError> {
        let mut token = self.token.write().await;
        token.authorize(delivery, Utc::now().timestamp());
        self.store.save(&self.provider_name, &token).await?;

        tracing::info!(
            provider = %self.provider_name,
            expires_at = %token.expiration_datetime(),
            "Token authorized"
        );
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// Concurrent callers are serialized; a caller that finds the token fresh
    /// by the time it holds the lock reuses the in-flight result instead of
    /// issuing a second exchange. A non-success response leaves the stored
    /// token unchanged, so the next call will retry.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        if !self.token.read().await.has_expired() {
            return Ok(());
        }

        self.exchange_refresh().await
    }

    /// Refresh after a rejected request, regardless of the local expiry clock
    ///
    /// Skips the exchange only when the access token the caller observed was
    /// already replaced by a concurrent refresh.
    pub async fn refresh_from(&self, observed_access: Option<&str>) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        {
            let token = self.token.read().await;
            if token.access_token.as_deref() != observed_access && !token.has_expired() {
                return Ok(());
            }
        }

        self.exchange_refresh().await
    }

    // Caller must hold refresh_lock
    async fn exchange_refresh(&self) -> Result<(), ApiError> {
        let refresh_token = {
            let token = self.token.read().await;
            token.refresh_token.clone().ok_or_else(|| {
                ApiError::Config(format!(
                    "No refresh token available for provider '{}'",
                    self.provider_name
                ))
            })?
        };

        tracing::info!(provider = %self.provider_name, url = %self.urls.token, "Refreshing token");

        let mut form = HashMap::new();
        form.insert("client_id", self.config.client_id.as_str());
        form.insert("client_secret", self.config.client_secret.as_str());
        form.insert("refresh_token", refresh_token.as_str());
        form.insert("grant_type", "refresh_token");

        let response = self
            .client
            .post(&self.urls.token)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = %self.provider_name,
                status = %status,
                body = %body,
                "Token refresh failed"
            );
            return Err(ApiError::Exchange { status, body });
        }

        let delivery: TokenDelivery = response.json().await?;

        let mut token = self.token.write().await;
        token.refresh(delivery, Utc::now().timestamp());
        self.store.save(&self.provider_name, &token).await?;

        tracing::info!(provider = %self.provider_name, "Token refreshed successfully");
        Ok(())
    }

    /// Revoke the current token
    ///
    /// Local revocation is authoritative: the token fields are cleared and
    /// the persisted record removed even when the remote call fails.
    pub async fn revoke(&self) -> Result<(), ApiError> {
        tracing::info!(provider = %self.provider_name, url = %self.urls.revoke, "Revoking token");

        let access_token = self.token.read().await.access_token.clone();

        let mut form = HashMap::new();
        form.insert("client_id", self.config.client_id.as_str());
        let token_value = access_token.unwrap_or_default();
        form.insert("token", token_value.as_str());

        match self
            .client
            .post(&self.urls.revoke)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                tracing::error!(
                    provider = %self.provider_name,
                    status = %response.status().as_u16(),
                    "Remote revocation failed"
                );
            }
            Err(e) => {
                tracing::error!(provider = %self.provider_name, error = %e, "Revoke request failed");
            }
            Ok(_) => {}
        }

        self.token.write().await.clear();
        self.store.delete(&self.provider_name).await
    }

    pub async fn has_expired(&self) -> bool {
        self.token.read().await.has_expired()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.token.read().await.access_token.clone()
    }

    /// Snapshot of the current token state
    pub async fn token(&self) -> Token {
        self.token.read().await.clone()
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}
