use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token state for one provider
///
/// All fields start absent; `authorize` fills them from a grant response,
/// `refresh` rotates the access token, `clear` returns to the empty state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds, as reported by the provider
    pub expires_in: Option<i64>,
    /// Unix timestamp of the last token delivery
    pub delivery_time: Option<i64>,
}

/// Token endpoint response body (authorization-code or refresh grant)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenDelivery {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl Token {
    /// An unset delivery time or lifetime counts as expired.
    pub fn has_expired_at(&self, now: i64) -> bool {
        match (self.delivery_time, self.expires_in) {
            (Some(delivery_time), Some(expires_in)) => now >= delivery_time + expires_in,
            _ => true,
        }
    }

    pub fn has_expired(&self) -> bool {
        self.has_expired_at(Utc::now().timestamp())
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.expires_in.is_none()
            && self.delivery_time.is_none()
    }

    /// Apply a first token delivery. Providers that omit the refresh token
    /// reuse the access token in its place.
    pub fn authorize(&mut self, delivery: TokenDelivery, now: i64) {
        self.refresh_token = Some(
            delivery
                .refresh_token
                .unwrap_or_else(|| delivery.access_token.clone()),
        );
        self.access_token = Some(delivery.access_token);
        self.expires_in = Some(delivery.expires_in);
        self.delivery_time = Some(now);
    }

    /// Apply a refresh delivery. The stored refresh token is kept unless the
    /// response carries a new one.
    pub fn refresh(&mut self, delivery: TokenDelivery, now: i64) {
        self.access_token = Some(delivery.access_token);
        if let Some(refresh_token) = delivery.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.delivery_time = Some(now);
    }

    pub fn clear(&mut self) {
        *self = Token::default();
    }

    pub fn delivery_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.delivery_time.unwrap_or(0), 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
    }

    pub fn expiration_datetime(&self) -> DateTime<Utc> {
        match (self.delivery_time, self.expires_in) {
            (Some(delivery_time), Some(expires_in)) => Utc
                .timestamp_opt(delivery_time + expires_in, 0)
                .single()
                .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap()),
            _ => Utc.timestamp_opt(0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(refresh_token: Option<&str>) -> TokenDelivery {
        TokenDelivery {
            access_token: "A".to_string(),
            refresh_token: refresh_token.map(String::from),
            expires_in: 10,
        }
    }

    #[test]
    fn test_empty_token_has_expired() {
        let token = Token::default();
        assert!(token.has_expired_at(0));
        assert!(token.is_empty());
    }

    #[test]
    fn test_expiry_boundary() {
        let token = Token {
            access_token: Some("A".to_string()),
            refresh_token: Some("R".to_string()),
            expires_in: Some(3600),
            delivery_time: Some(1000),
        };
        assert!(!token.has_expired_at(1000 + 3599));
        assert!(token.has_expired_at(1000 + 3600));
        assert!(token.has_expired_at(1000 + 3601));
    }

    #[test]
    fn test_authorize_falls_back_to_access_token() {
        let mut token = Token::default();
        token.authorize(delivery(None), 42);
        assert_eq!(token.access_token.as_deref(), Some("A"));
        assert_eq!(token.refresh_token.as_deref(), Some("A"));
        assert_eq!(token.expires_in, Some(10));
        assert_eq!(token.delivery_time, Some(42));
    }

    #[test]
    fn test_refresh_preserves_refresh_token() {
        let mut token = Token::default();
        token.authorize(delivery(Some("R")), 42);

        token.refresh(
            TokenDelivery {
                access_token: "A2".to_string(),
                refresh_token: None,
                expires_in: 10,
            },
            100,
        );
        assert_eq!(token.access_token.as_deref(), Some("A2"));
        assert_eq!(token.refresh_token.as_deref(), Some("R"));
        assert_eq!(token.delivery_time, Some(100));
    }

    #[test]
    fn test_refresh_adopts_new_refresh_token() {
        let mut token = Token::default();
        token.authorize(delivery(Some("R")), 42);

        token.refresh(
            TokenDelivery {
                access_token: "A2".to_string(),
                refresh_token: Some("R2".to_string()),
                expires_in: 10,
            },
            100,
        );
        assert_eq!(token.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn test_clear_empties_all_fields() {
        let mut token = Token::default();
        token.authorize(delivery(Some("R")), 42);
        token.clear();
        assert!(token.is_empty());
    }

    #[test]
    fn test_expiration_datetime_unset_is_epoch() {
        let token = Token::default();
        assert_eq!(token.expiration_datetime().timestamp(), 0);
        assert_eq!(token.delivery_datetime().timestamp(), 0);
    }
}
