use async_trait::async_trait;

use crate::error::Result;

/// Durable storage for the bearer token.
///
/// The token is the only state that survives a restart. It is read once at
/// startup and written on login, cleared on logout or authorization failure.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn load_token(&self) -> Result<Option<String>>;

    async fn save_token(&self, token: &str) -> Result<()>;

    /// Removes the stored token. Succeeds when nothing is stored.
    async fn clear_token(&self) -> Result<()>;
}
