use crate::credentials::JiraCredentials;
use crate::error::Result;

/// Produces the `Authorization` header for one outgoing tracker request.
///
/// Implementations see the method and the full URL so OAuth-style signers
/// can compute a per-request signature.
pub trait RequestSigner: Send + Sync {
    fn authorization(&self, method: &str, url: &str) -> Result<String>;
}

/// Sends the access token from the credentials file as a bearer credential.
pub struct AccessTokenSigner {
    access_token: String,
}

impl AccessTokenSigner {
    pub fn new(credentials: &JiraCredentials) -> Self {
        Self {
            access_token: credentials.access_token.clone(),
        }
    }
}

impl RequestSigner for AccessTokenSigner {
    fn authorization(&self, _method: &str, _url: &str) -> Result<String> {
        Ok(format!("Bearer {}", self.access_token))
    }
}
