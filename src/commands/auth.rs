//! Credential command handlers.
//!
//! This module implements the CLI commands for:
//! - `tally auth --token <TOKEN>` - Store the bearer token issued by the service
//! - `tally auth --verify` - Check the stored token against the service
//! - `tally auth --logout` - Forget the stored token

use crate::api::{Credential, Mode};
use crate::commands::Out;
use crate::{Config, Result, Session};
use tracing::debug;

/// Handles `tally auth --token <TOKEN>`. The token is stored in the token file with permissions
/// that keep other users from reading it.
pub async fn auth(config: &Config, token: &str) -> Result<Out<()>> {
    let credential = Credential::new(token)?;
    config.save_credential(&credential).await?;
    Ok("Signed in, the token has been saved".into())
}

/// Handles `tally auth --verify`. Makes one request with the stored token so that a missing,
/// expired or rejected token is reported now rather than in the middle of something else.
pub async fn auth_verify(config: &Config, mode: Mode) -> Result<Out<()>> {
    let session = Session::open(config, mode).await?;
    let transactions = session.load_transactions().await?;
    debug!("The service returned {} transactions", transactions.len());
    Ok("Your token is valid!".into())
}

/// Handles `tally auth --logout`.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    if config.clear_credential().await? {
        Ok("Signed out, the stored token has been removed".into())
    } else {
        Ok("Not signed in, there was no stored token".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_auth_and_logout() {
        let env = TestEnv::new().await;
        let config = env.config();
        logout(&config).await.unwrap();
        assert!(config.credential().await.unwrap().is_none());

        let err = auth(&config, "   ").await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::AuthMissing);

        auth(&config, "new-token").await.unwrap();
        let stored = config.credential().await.unwrap().unwrap();
        assert_eq!(stored, Credential::new("new-token").unwrap());

        let out = logout(&config).await.unwrap();
        assert!(out.message().starts_with("Signed out"));
        let out = logout(&config).await.unwrap();
        assert!(out.message().starts_with("Not signed in"));
    }

    #[tokio::test]
    async fn test_verify_in_test_mode() {
        let env = TestEnv::new().await;
        let config = env.config();
        assert!(auth_verify(&config, Mode::Test).await.is_ok());
        logout(&config).await.unwrap();
        let err = auth_verify(&config, Mode::Test).await.unwrap_err();
        assert!(err.is_auth_missing());
    }
}
