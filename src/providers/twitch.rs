use crate::config::ProviderConfig;
use crate::endpoint::Endpoint;
use crate::oauth::flow::{OAuthFlow, OAuthUrls};
use crate::oauth::token_store::TokenStore;
use crate::quota::QuotaBucket;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "twitch";

/// Helix per-minute request budget
pub const QUOTA_SIZE: u64 = 800;
pub const QUOTA_RATE: f64 = 800.0 / 60.0;

const API_BASE: &str = "https://api.twitch.tv/helix";

fn default_oauth_urls() -> OAuthUrls {
    OAuthUrls {
        authorize: "https://id.twitch.tv/oauth2/authorize".to_string(),
        token: "https://id.twitch.tv/oauth2/token".to_string(),
        revoke: "https://id.twitch.tv/oauth2/revoke".to_string(),
    }
}

/// Twitch Helix API endpoint
pub struct TwitchEndpoint {
    api: Endpoint,
    api_base: String,
}

impl TwitchEndpoint {
    pub async fn new(config: ProviderConfig, store: Arc<TokenStore>) -> Self {
        Self::with_urls(config, store, default_oauth_urls(), API_BASE.to_string()).await
    }

    /// Construct against overridden URLs (mock servers in tests)
    pub async fn with_urls(
        mut config: ProviderConfig,
        store: Arc<TokenStore>,
        oauth_urls: OAuthUrls,
        api_base: String,
    ) -> Self {
        // Helix rejects bearer-only requests without the application id
        let client_id = config.client_id.clone();
        config
            .custom_headers
            .entry("Client-Id".to_string())
            .or_insert(client_id);

        let timeout = Duration::from_secs(config.timeout_seconds);
        let custom_headers = config.custom_headers.clone();
        let flow = OAuthFlow::new(PROVIDER_NAME, config, oauth_urls, store).await;

        Self {
            api: Endpoint::new(
                flow,
                QuotaBucket::new(QUOTA_SIZE, QUOTA_RATE),
                timeout,
                custom_headers,
            ),
            api_base,
        }
    }

    /// https://dev.twitch.tv/docs/api/reference#get-users
    pub async fn users(&self, ids: &[String], logins: &[String]) -> Option<Value> {
        let mut params = Vec::new();
        for id in ids {
            params.push(("id", id.clone()));
        }
        for login in logins {
            params.push(("login", login.clone()));
        }
        self.api
            .fetch(&format!("{}/users", self.api_base), &params, 1)
            .await
    }

    /// https://dev.twitch.tv/docs/api/reference#get-streams
    pub async fn streams(&self, logins: &[String]) -> Option<Value> {
        let mut params = vec![("first", "100".to_string())];
        for login in logins {
            params.push(("user_login", login.clone()));
        }
        self.api
            .fetch(&format!("{}/streams", self.api_base), &params, 1)
            .await
    }

    /// https://dev.twitch.tv/docs/api/reference#get-games
    pub async fn games(&self, ids: &[String]) -> Option<Value> {
        let params: Vec<(&str, String)> = ids.iter().map(|id| ("id", id.clone())).collect();
        self.api
            .fetch(&format!("{}/games", self.api_base), &params, 1)
            .await
    }

    pub fn api(&self) -> &Endpoint {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_parameters() {
        assert_eq!(QUOTA_SIZE, 800);
        assert!((QUOTA_RATE - 800.0 / 60.0).abs() < f64::EPSILON);
    }
}
