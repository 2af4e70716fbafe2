//! Bearer credential lookup.
//!
//! The auth collaborator owns issuing and refreshing tokens; this crate only
//! reads the current one. [`CredentialStore`] is the async seam,
//! [`EnvCredentialStore`] reads an environment variable and
//! [`SessionFileStore`] reads a JSON session file.

mod env;
mod session_file;

pub use env::EnvCredentialStore;
pub use session_file::SessionFileStore;

use anyhow::Result;

use crate::sources::Credential;

/// Resolves the credential to attach to the next pass.
///
/// `Ok(None)` means no session exists; `Err` means the store itself failed.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn credential(&self) -> Result<Option<Credential>>;
}

/// Tries each store in order and returns the first credential found.
pub struct ChainedStore {
    stores: Vec<Box<dyn CredentialStore>>,
}

impl ChainedStore {
    pub fn new(stores: Vec<Box<dyn CredentialStore>>) -> Self {
        Self { stores }
    }
}

#[async_trait::async_trait]
impl CredentialStore for ChainedStore {
    async fn credential(&self) -> Result<Option<Credential>> {
        for store in &self.stores {
            if let Some(credential) = store.credential().await? {
                return Ok(Some(credential));
            }
        }
        Ok(None)
    }
}

#[async_trait::async_trait]
impl CredentialStore for Option<Credential> {
    async fn credential(&self) -> Result<Option<Credential>> {
        Ok(self.clone())
    }
}
