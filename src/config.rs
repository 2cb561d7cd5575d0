use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub token_store: TokenStoreConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenStoreConfig {
    /// Path of the JSON file holding one token record per provider
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub youtube: Option<ProviderConfig>,
    #[serde(default)]
    pub twitch: Option<ProviderConfig>,
}

/// OAuth application credentials and request settings for one provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Extra headers sent with every resource request (e.g. Client-Id for Twitch Helix)
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,

    /// Extra query parameters appended to the authorization URL
    /// (e.g. access_type=offline&prompt=consent for Google)
    #[serde(default)]
    pub extra_authorize_params: HashMap<String, String>,
}

fn default_timeout() -> u64 {
    30
}

pub fn load_config() -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::with_name("media-notify"))
        .add_source(config::Environment::with_prefix("MEDIA_NOTIFY").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.providers.youtube.is_none() && cfg.providers.twitch.is_none() {
        anyhow::bail!("At least one provider must be configured");
    }

    if cfg.token_store.path.is_empty() {
        anyhow::bail!("Token store path must not be empty");
    }

    if let Some(provider) = &cfg.providers.youtube {
        validate_provider(provider, "YouTube")?;
    }
    if let Some(provider) = &cfg.providers.twitch {
        validate_provider(provider, "Twitch")?;
    }

    Ok(())
}

fn validate_provider(provider: &ProviderConfig, name: &str) -> anyhow::Result<()> {
    if provider.client_id.is_empty() {
        anyhow::bail!("{} provider has an empty client_id", name);
    }
    if provider.client_secret.is_empty() {
        anyhow::bail!("{} provider has an empty client_secret", name);
    }
    if provider.redirect_uri.is_empty() {
        anyhow::bail!("{} provider has an empty redirect_uri", name);
    }
    if provider.timeout_seconds == 0 {
        anyhow::bail!("{} provider has a zero request timeout", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> ProviderConfig {
        ProviderConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8000/redirect".to_string(),
            scope: "read".to_string(),
            timeout_seconds: default_timeout(),
            custom_headers: HashMap::new(),
            extra_authorize_params: HashMap::new(),
        }
    }

    #[test]
    fn test_validate_requires_a_provider() {
        let cfg = Config {
            token_store: TokenStoreConfig {
                path: "tokens.json".to_string(),
            },
            providers: ProvidersConfig {
                youtube: None,
                twitch: None,
            },
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_client_id() {
        let mut provider = test_provider();
        provider.client_id.clear();
        assert!(validate_provider(&provider, "YouTube").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut provider = test_provider();
        provider.timeout_seconds = 0;
        assert!(validate_provider(&provider, "Twitch").is_err());
    }

    #[test]
    fn test_valid_config_passes() {
        let cfg = Config {
            token_store: TokenStoreConfig {
                path: "tokens.json".to_string(),
            },
            providers: ProvidersConfig {
                youtube: Some(test_provider()),
                twitch: None,
            },
        };
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_provider_config_defaults() {
        let toml = r#"
            client_id = "id"
            client_secret = "secret"
            redirect_uri = "http://localhost/redirect"
            scope = "read"
        "#;
        let provider: ProviderConfig = toml::from_str(toml).unwrap();
        assert_eq!(provider.timeout_seconds, 30);
        assert!(provider.custom_headers.is_empty());
        assert!(provider.extra_authorize_params.is_empty());
    }
}
