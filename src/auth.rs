use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

/// External sign-in. A successful `sign_in` only means the provider
/// authenticated someone; admission is decided by [`AccessGate`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<Identity, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Fixed identity taken from the command line or environment.
pub struct StaticIdentity {
    email: Option<String>,
}

impl StaticIdentity {
    pub fn new(email: Option<String>) -> Self {
        Self { email }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self) -> Result<Identity, AuthError> {
        match &self.email {
            Some(email) if !email.trim().is_empty() => Ok(Identity {
                email: email.clone(),
            }),
            _ => Err(AuthError::NoIdentity(
                "pass --user or set SCORE_MANAGER_USER".to_string(),
            )),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Allow-list check. Entries and candidates are trimmed; otherwise the match
/// is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    allowed: HashSet<String>,
}

impl AccessGate {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn admits(&self, identity: &Identity) -> bool {
        self.allowed.contains(identity.email.trim())
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
