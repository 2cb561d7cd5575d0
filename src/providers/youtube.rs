use crate::config::ProviderConfig;
use crate::endpoint::Endpoint;
use crate::oauth::flow::{OAuthFlow, OAuthUrls};
use crate::oauth::token_store::TokenStore;
use crate::quota::QuotaBucket;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "youtube";

/// Daily quota published for the YouTube Data API v3
pub const QUOTA_SIZE: u64 = 10_000;
pub const QUOTA_RATE: f64 = 10_000.0 / 86_400.0;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

fn default_oauth_urls() -> OAuthUrls {
    OAuthUrls {
        authorize: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token: "https://www.googleapis.com/oauth2/v4/token".to_string(),
        revoke: "https://accounts.google.com/o/oauth2/revoke".to_string(),
    }
}

/// YouTube Data API endpoint
///
/// Resource methods mirror the remote API: each declares its URL, parameter
/// contract and fixed quota cost. Responses are returned as raw JSON; any
/// failure is logged and yields `None`.
pub struct YoutubeEndpoint {
    api: Endpoint,
    api_base: String,
}

impl YoutubeEndpoint {
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
        // Google only issues a refresh token for offline, consented flows
        config
            .extra_authorize_params
            .entry("access_type".to_string())
            .or_insert_with(|| "offline".to_string());
        config
            .extra_authorize_params
            .entry("prompt".to_string())
            .or_insert_with(|| "consent".to_string());

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

    /// https://developers.google.com/youtube/v3/docs/channels/list
    pub async fn channels_list(
        &self,
        for_username: Option<&str>,
        channel_id: Option<&str>,
    ) -> Option<Value> {
        let mut params = vec![
            ("part", "snippet,contentDetails".to_string()),
            ("maxResults", "50".to_string()),
        ];
        if let Some(for_username) = for_username {
            params.push(("forUsername", for_username.to_string()));
        }
        if let Some(channel_id) = channel_id {
            params.push(("id", channel_id.to_string()));
        }
        self.api
            .fetch(&format!("{}/channels", self.api_base), &params, 5)
            .await
    }

    /// https://developers.google.com/youtube/v3/docs/playlistItems/list
    pub async fn playlist_items_list(
        &self,
        playlist_id: &str,
        part: &str,
        page_token: Option<&str>,
    ) -> Option<Value> {
        let mut params = vec![
            ("part", part.to_string()),
            ("maxResults", "50".to_string()),
            ("playlistId", playlist_id.to_string()),
        ];
        if let Some(page_token) = page_token {
            params.push(("pageToken", page_token.to_string()));
        }
        self.api
            .fetch(
                &format!("{}/playlistItems", self.api_base),
                &params,
                playlist_items_cost(part),
            )
            .await
    }

    /// https://developers.google.com/youtube/v3/docs/search/list
    pub async fn search_list(
        &self,
        channel_id: Option<&str>,
        resource_type: Option<&str>,
    ) -> Option<Value> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("maxResults", "50".to_string()),
            ("order", "date".to_string()),
        ];
        if let Some(channel_id) = channel_id {
            params.push(("channelId", channel_id.to_string()));
        }
        if let Some(resource_type) = resource_type {
            params.push(("type", resource_type.to_string()));
        }
        self.api
            .fetch(&format!("{}/search", self.api_base), &params, 100)
            .await
    }

    /// https://developers.google.com/youtube/v3/docs/videos/list
    pub async fn videos_list(&self, video_id: &str) -> Option<Value> {
        let params = vec![
            ("part", "snippet".to_string()),
            ("id", video_id.to_string()),
        ];
        self.api
            .fetch(&format!("{}/videos", self.api_base), &params, 3)
            .await
    }

    pub fn api(&self) -> &Endpoint {
        &self.api
    }
}

/// Listing with snippets costs more than bare ids
fn playlist_items_cost(part: &str) -> u64 {
    if part == "snippet" {
        3
    } else {
        1
    }
}
