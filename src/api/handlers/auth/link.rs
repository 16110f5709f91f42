//! Dashboard links handed to chat users.
//!
//! The chat command handler calls `issue_dashboard_link`; the user only ever
//! sees the exchange code, never the token id.

use std::time::Duration;
use tracing::warn;
use url::Url;

use super::{
    error::AuthError,
    registry::{TokenOwner, TokenRegistry},
};

pub const EXCHANGE_CODE_PARAM: &str = "code";

#[derive(Clone, Debug)]
pub struct DashboardLink {
    pub url: Url,
    pub code: String,
    pub expires_in: Duration,
}

/// Mint a token for `owner` plus a one-time exchange code, and build the
/// dashboard URL carrying the code as a query parameter.
///
/// No token is left behind when the code cannot be minted.
///
/// # Errors
/// Returns `AuthError::Randomness` if the OS random source fails, or
/// `AuthError::NotFound` if the token was revoked before its code was minted.
pub fn issue_dashboard_link(
    registry: &TokenRegistry,
    base_url: &Url,
    owner: TokenOwner,
    is_admin: bool,
) -> Result<DashboardLink, AuthError> {
    let token_id = registry.issue_token(owner, is_admin)?;
    link_for_token(registry, base_url, &token_id, |id| {
        registry.issue_exchange_code(id)
    })
}

fn link_for_token<F>(
    registry: &TokenRegistry,
    base_url: &Url,
    token_id: &str,
    mint_code: F,
) -> Result<DashboardLink, AuthError>
where
    F: FnOnce(&str) -> Result<String, AuthError>,
{
    let code = match mint_code(token_id) {
        Ok(code) => code,
        Err(err) => {
            registry.revoke_token(token_id);
            warn!(error = %err, "dropped session token after exchange code failure");
            return Err(err);
        }
    };

    let mut url = base_url.clone();
    url.query_pairs_mut().append_pair(EXCHANGE_CODE_PARAM, &code);

    Ok(DashboardLink {
        url,
        code,
        expires_in: registry.config().exchange_code_ttl(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::{registry::SessionConfig, role::Role};
    use anyhow::{Context, Result};

    #[tokio::test]
    async fn link_carries_code_that_exchanges_for_token() -> Result<()> {
        let registry = TokenRegistry::new(SessionConfig::new());
        let base = Url::parse("https://dash.example.com/")?;
        let link = issue_dashboard_link(&registry, &base, TokenOwner::new(9, "carol", "Carol"), true)?;

        let code = link
            .url
            .query_pairs()
            .find(|(key, _)| key == EXCHANGE_CODE_PARAM)
            .map(|(_, value)| value.into_owned())
            .context("code missing from link")?;
        assert_eq!(code, link.code);
        assert_eq!(link.expires_in, Duration::from_secs(60));

        let token_id = registry.exchange_code(&code).context("exchange failed")?;
        let token = registry.validate_token(&token_id).context("token missing")?;
        assert_eq!(token.role(), Role::Admin);
        assert_eq!(token.owner().user_id, 9);
        Ok(())
    }

    #[tokio::test]
    async fn failed_code_mint_revokes_the_token() -> Result<()> {
        let registry = TokenRegistry::new(SessionConfig::new());
        let base = Url::parse("https://dash.example.com/")?;
        let token_id = registry.issue_token(TokenOwner::new(4, "dave", "Dave"), true)?;
        assert_eq!(registry.token_count(), 1);

        let result = link_for_token(&registry, &base, &token_id, |_| Err(AuthError::NotFound));
        assert!(matches!(result, Err(AuthError::NotFound)));
        assert_eq!(registry.token_count(), 0);
        assert_eq!(registry.code_count(), 0);
        assert!(registry.validate_token(&token_id).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn link_preserves_existing_query() -> Result<()> {
        let registry = TokenRegistry::new(SessionConfig::new());
        let base = Url::parse("https://dash.example.com/app?theme=dark")?;
        let link = issue_dashboard_link(&registry, &base, TokenOwner::default(), false)?;

        let pairs: Vec<(String, String)> = link.url.query_pairs().into_owned().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("theme".to_string(), "dark".to_string()));
        assert_eq!(pairs[1].0, EXCHANGE_CODE_PARAM);
        assert_eq!(link.url.path(), "/app");
        Ok(())
    }
}
