//! Redis service for sessions and e-mail verification codes

use rand::RngCore;
use redis::{AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    models::session::SessionData,
};

fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

fn registry_key(email: &str) -> String {
    format!("session:registry:{}", email.trim().to_lowercase())
}

fn verification_key(email: &str) -> String {
    format!("verify:email:{}", email.trim().to_lowercase())
}

/// Random opaque session identifier (256 bits, hex encoded)
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service; connections are opened per operation
    pub fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// Round-trip check used at startup and by the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }

    /// Store a new session and return its id.
    ///
    /// Only one session per account is kept: the previous one is revoked.
    pub async fn create_session(&self, data: &SessionData, ttl_seconds: u64) -> AppResult<String> {
        let mut conn = self.connection().await?;
        let session_id = generate_session_id();
        let payload = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Failed to serialize session: {}", e)))?;

        let previous: Option<String> = conn.get(registry_key(&data.email)).await?;
        if let Some(previous) = previous {
            conn.del::<_, ()>(session_key(&previous)).await?;
        }

        conn.set_ex::<_, _, ()>(session_key(&session_id), payload, ttl_seconds)
            .await?;
        conn.set_ex::<_, _, ()>(registry_key(&data.email), &session_id, ttl_seconds)
            .await?;

        Ok(session_id)
    }

    /// Load a live session
    pub async fn get_session(&self, session_id: &str) -> AppResult<Option<SessionData>> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = conn.get(session_key(session_id)).await?;

        match payload {
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(data) => Ok(Some(data)),
                Err(e) => {
                    tracing::warn!("Discarding unreadable session payload: {}", e);
                    conn.del::<_, ()>(session_key(session_id)).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Whether `session_id` is the one the registry holds for `email`
    pub async fn is_current_session(&self, email: &str, session_id: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let current: Option<String> = conn.get(registry_key(email)).await?;
        Ok(current.as_deref() == Some(session_id))
    }

    /// Remove a session (logout)
    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        if let Some(data) = self.get_session(session_id).await? {
            let current: Option<String> = conn.get(registry_key(&data.email)).await?;
            if current.as_deref() == Some(session_id) {
                conn.del::<_, ()>(registry_key(&data.email)).await?;
            }
        }
        conn.del::<_, ()>(session_key(session_id)).await?;
        Ok(())
    }

    /// Revoke whatever session the account currently has
    pub async fn purge_sessions_for(&self, email: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let current: Option<String> = conn.get(registry_key(email)).await?;
        if let Some(session_id) = current {
            conn.del::<_, ()>(session_key(&session_id)).await?;
        }
        conn.del::<_, ()>(registry_key(email)).await?;
        Ok(())
    }

    /// Store a verification code, replacing any previous one
    pub async fn store_verification_code(
        &self,
        email: &str,
        code: &str,
        expiration_seconds: u64,
    ) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(verification_key(email), code, expiration_seconds)
            .await
            .map_err(|e| {
                AppError::Internal(format!("Failed to store verification code in Redis: {}", e))
            })?;
        Ok(())
    }

    /// Verify and consume a verification code
    pub async fn verify_code(&self, email: &str, code: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let key = verification_key(email);

        let stored: Option<String> = conn.get(&key).await?;
        match stored {
            Some(stored) if stored == code.trim() => {
                conn.del::<_, ()>(&key).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_random_hex() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_keys_ignore_email_case() {
        assert_eq!(registry_key("Ada@Uni.edu "), "session:registry:ada@uni.edu");
        assert_eq!(verification_key("ADA@uni.edu"), "verify:email:ada@uni.edu");
    }

    #[test]
    fn test_client_creation_does_not_connect() {
        assert!(RedisService::new("redis://127.0.0.1:1").is_ok());
        assert!(RedisService::new("not a url").is_err());
    }
}
