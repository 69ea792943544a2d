//! Caller authentication.
//!
//! The lake only needs to know who is calling; how tokens are issued and
//! verified belongs to the service in front of it. [`StaticTokens`] covers
//! the local case of tokens listed in configuration.

use crate::config::AuthConfig;
use crate::error::LakeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub tenant_id: String,
    pub user_id: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            tenant_id: "0".to_string(),
            user_id: "anonymous".to_string(),
        }
    }
}

pub trait Authenticator: Send + Sync {
    /// Identify the caller holding `token`, or fail with `Unauthorized`.
    fn authenticate(&self, token: Option<&str>) -> Result<Identity, LakeError>;
}

/// Accepts every caller as the anonymous identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl Authenticator for Anonymous {
    fn authenticate(&self, _token: Option<&str>) -> Result<Identity, LakeError> {
        Ok(Identity::anonymous())
    }
}

/// Bearer tokens mapped to identities.
#[derive(Debug, Default, Clone)]
pub struct StaticTokens {
    tokens: HashMap<String, Identity>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

impl Authenticator for StaticTokens {
    fn authenticate(&self, token: Option<&str>) -> Result<Identity, LakeError> {
        let token = token.ok_or_else(|| LakeError::Unauthorized("no token".to_string()))?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| LakeError::Unauthorized("invalid token".to_string()))
    }
}

/// Authenticator described by the `[auth]` configuration section.
pub fn from_config(config: &AuthConfig) -> Box<dyn Authenticator> {
    if !config.enabled {
        return Box::new(Anonymous);
    }
    let tokens = config
        .tokens
        .iter()
        .fold(StaticTokens::new(), |tokens, entry| {
            tokens.with_token(
                entry.token.clone(),
                Identity {
                    tenant_id: entry.tenant_id.clone(),
                    user_id: entry.user_id.clone(),
                },
            )
        });
    Box::new(tokens)
}
