//! Provider account keys and bearer credentials

use crate::defaults::{CACHE_KEY_PREFIX_LEN, TOKEN_KEY_PREFIX};
use serde::{Deserialize, Serialize};

/// Stable identifier of a provider account (e.g. `do_token1`)
///
/// Newtype so account keys are never confused with tokens or machine names.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Deref,
)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key for the n-th configured account (`do_token{n}`)
    pub fn from_index(index: u32) -> Self {
        Self(format!("{TOKEN_KEY_PREFIX}{index}"))
    }

    /// Parse an account selector as written in configuration.
    ///
    /// A bare number `n` selects `do_token{n}`; anything else is taken verbatim.
    pub fn from_selector(selector: &str) -> Self {
        let selector = selector.trim();
        match selector.parse::<u32>() {
            Ok(index) => Self::from_index(index),
            Err(_) => Self(selector.to_string()),
        }
    }

    /// Whether a top-level configuration key names an account token
    pub fn is_token_key(key: &str) -> bool {
        key.starts_with(TOKEN_KEY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Bearer credential for one provider account.
///
/// The token never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: AccountKey,
    token: String,
}

impl Credential {
    /// Build a credential from a raw configuration value.
    ///
    /// Values may carry a human label in front of the token (`"main: dop_v1_..."`);
    /// only the part after the first `:` is kept.
    pub fn new(key: AccountKey, raw_token: &str) -> Self {
        let token = match raw_token.split_once(':') {
            Some((_, token)) => token.trim(),
            None => raw_token.trim(),
        };
        Self {
            key,
            token: token.to_string(),
        }
    }

    pub fn key(&self) -> &AccountKey {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Token prefix used to namespace cache entries per account
    pub fn cache_prefix(&self) -> &str {
        match self.token.char_indices().nth(CACHE_KEY_PREFIX_LEN) {
            Some((idx, _)) => &self.token[..idx],
            None => &self.token,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
