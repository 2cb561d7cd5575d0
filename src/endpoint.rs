use crate::error::ApiError;
use crate::oauth::flow::OAuthFlow;
use crate::quota::QuotaBucket;
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of a metered resource request
///
/// Callers that only want data use [`FetchOutcome::into_data`], which folds
/// every non-success case into `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 200 response, parsed JSON body unchanged
    Success(serde_json::Value),
    /// No access token was available for the request
    Unauthorized,
    /// Non-success response from the resource endpoint
    RequestFailed { status: u16, body: String },
}

impl FetchOutcome {
    pub fn into_data(self) -> Option<serde_json::Value> {
        match self {
            FetchOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

/// Authenticated, quota-metered access to one provider's REST resources
pub struct Endpoint {
    oauth_flow: OAuthFlow,
    quota_bucket: QuotaBucket,
    client: reqwest::Client,
    timeout: Duration,
    custom_headers: HashMap<String, String>,
}

impl Endpoint {
    pub fn new(
        oauth_flow: OAuthFlow,
        quota_bucket: QuotaBucket,
        timeout: Duration,
        custom_headers: HashMap<String, String>,
    ) -> Self {
        Self {
            oauth_flow,
            quota_bucket,
            client: reqwest::Client::new(),
            timeout,
            custom_headers,
        }
    }

    /// Execute a metered GET against a provider resource
    ///
    /// Charges `cost` against the quota bucket first; exhaustion is logged
    /// but never blocks the call. An expired access token is refreshed before
    /// the request, and a 401 triggers one more refresh and a single retry.
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        cost: u64,
    ) -> Result<FetchOutcome, ApiError> {
        if !self.quota_bucket.consume(cost) {
            tracing::warn!(
                provider = %self.oauth_flow.provider_name(),
                cost = %cost,
                "Quota bucket exhausted"
            );
        }

        if self.oauth_flow.has_expired().await {
            if let Err(e) = self.oauth_flow.refresh().await {
                tracing::warn!(
                    provider = %self.oauth_flow.provider_name(),
                    error = %e,
                    "Token refresh failed before request"
                );
            }
        }

        let Some(access_token) = self.oauth_flow.access_token().await else {
            tracing::warn!(
                provider = %self.oauth_flow.provider_name(),
                "No access token available"
            );
            return Ok(FetchOutcome::Unauthorized);
        };

        let response = self.send(url, params, &access_token).await?;

        if response.status().as_u16() != 401 {
            return self.finish(response).await;
        }

        // One refresh, one retry; a second 401 surfaces as a failure
        if let Err(e) = self.oauth_flow.refresh_from(Some(&access_token)).await {
            tracing::warn!(
                provider = %self.oauth_flow.provider_name(),
                error = %e,
                "Token refresh failed after 401"
            );
        }

        let Some(access_token) = self.oauth_flow.access_token().await else {
            return Ok(FetchOutcome::Unauthorized);
        };

        let response = self.send(url, params, &access_token).await?;
        self.finish(response).await
    }

    /// Flatten the request outcome to optional data, logging failures
    pub async fn fetch(
        &self,
        url: &str,
        params: &[(&str, String)],
        cost: u64,
    ) -> Option<serde_json::Value> {
        match self.get(url, params, cost).await {
            Ok(outcome) => outcome.into_data(),
            Err(e) => {
                tracing::error!(
                    provider = %self.oauth_flow.provider_name(),
                    url = %url,
                    error = %e,
                    "Resource request failed"
                );
                None
            }
        }
    }

    async fn send(
        &self,
        url: &str,
        params: &[(&str, String)],
        access_token: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self
            .client
            .get(url)
            .timeout(self.timeout)
            .query(params)
            .header("Authorization", format!("Bearer {}", access_token));

        for (key, value) in &self.custom_headers {
            builder = builder.header(key, value);
        }

        Ok(builder.send().await?)
    }

    async fn finish(&self, response: reqwest::Response) -> Result<FetchOutcome, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = %self.oauth_flow.provider_name(),
                status = %status.as_u16(),
                body = %body,
                "Wrong answer from API"
            );
            return Ok(FetchOutcome::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let value = response.json().await?;
        Ok(FetchOutcome::Success(value))
    }

    pub fn oauth_flow(&self) -> &OAuthFlow {
        &self.oauth_flow
    }

    /// Remaining quota as a filled ratio
    pub fn quota_fill_ratio(&self) -> f64 {
        self.quota_bucket.fill_ratio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_data_keeps_success_body() {
        let outcome = FetchOutcome::Success(json!({"items": []}));
        assert_eq!(outcome.into_data(), Some(json!({"items": []})));
    }

    #[test]
    fn test_into_data_folds_failures_to_none() {
        assert_eq!(FetchOutcome::Unauthorized.into_data(), None);
        let failed = FetchOutcome::RequestFailed {
            status: 500,
            body: "oops".to_string(),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.into_data(), None);
    }
}
