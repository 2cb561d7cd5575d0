use crate::error::ApiError;
use crate::oauth::types::Token;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;

/// Token persistence, one JSON record per provider
///
/// A missing or empty record means the provider is not authorized.
#[derive(Debug)]
pub struct TokenStore {
    storage_path: PathBuf,
    tokens: RwLock<HashMap<String, Token>>,
}

impl TokenStore {
    pub async fn new(storage_path: PathBuf) -> Result<Self, ApiError> {
        let tokens = if storage_path.exists() {
            let content = fs::read_to_string(&storage_path)
                .await
                .map_err(|e| ApiError::Store(format!("Failed to read token file: {}", e)))?;
            serde_json::from_str(&content)
                .map_err(|e| ApiError::Store(format!("Failed to parse token file: {}", e)))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            storage_path,
            tokens: RwLock::new(tokens),
        })
    }

    /// Get the stored token for a provider, empty if none was ever saved
    pub async fn load(&self, provider_name: &str) -> Token {
        let tokens = self.tokens.read().await;
        tokens.get(provider_name).cloned().unwrap_or_default()
    }

    pub async fn save(&self, provider_name: &str, token: &Token) -> Result<(), ApiError> {
        {
            let mut tokens = self.tokens.write().await;
            tokens.insert(provider_name.to_string(), token.clone());
        }

        self.persist().await
    }

    pub async fn delete(&self, provider_name: &str) -> Result<(), ApiError> {
        {
            let mut tokens = self.tokens.write().await;
            tokens.remove(provider_name);
        }

        self.persist().await
    }

    pub async fn providers(&self) -> Vec<String> {
        let tokens = self.tokens.read().await;
        tokens.keys().cloned().collect()
    }

    async fn persist(&self) -> Result<(), ApiError> {
        let content = {
            let tokens = self.tokens.read().await;
            serde_json::to_string_pretty(&*tokens)
                .map_err(|e| ApiError::Store(format!("Failed to serialize tokens: {}", e)))?
        };

        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Store(format!("Failed to create token directory: {}", e)))?;
        }

        fs::write(&self.storage_path, &content)
            .await
            .map_err(|e| ApiError::Store(format!("Failed to write token file: {}", e)))?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.storage_path, Permissions::from_mode(0o600))
                .await
                .map_err(|e| ApiError::Store(format!("Failed to set file permissions: {}", e)))?;
        }

        Ok(())
    }
}
