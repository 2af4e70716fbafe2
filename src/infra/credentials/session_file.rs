use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use super::CredentialStore;
use crate::sources::Credential;

/// Session file written by the auth collaborator:
/// ```json
/// { "token": "eyJhbGciOi..." }
/// ```
#[derive(Deserialize)]
struct SessionFile {
    #[serde(alias = "access_token", alias = "accessToken")]
    token: Option<String>,
}

/// Reads the token from a JSON session file. A missing file means no
/// session; an unreadable or malformed one is an error.
pub struct SessionFileStore {
    path: PathBuf,
}

impl SessionFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CredentialStore for SessionFileStore {
    async fn credential(&self) -> Result<Option<Credential>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read session file {}", self.path.display())
                });
            }
        };
        let session: SessionFile = serde_json::from_str(&content)
            .with_context(|| format!("malformed session file {}", self.path.display()))?;
        Ok(session.token.and_then(Credential::new))
    }
}
