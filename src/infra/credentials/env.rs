use anyhow::Result;

use super::CredentialStore;
use crate::sources::Credential;

/// Reads the token from an environment variable at lookup time.
pub struct EnvCredentialStore {
    var: String,
}

impl EnvCredentialStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait::async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn credential(&self) -> Result<Option<Credential>> {
        Ok(std::env::var(&self.var).ok().and_then(Credential::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unset_variable_is_none() {
        let store = EnvCredentialStore::new("COURT_OVERVIEW_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(store.credential().await.unwrap().is_none());
    }
}
