use crate::error::Error;
use crate::models::ApiKey;

/// Settings storage for the single account credential.
pub trait CredentialStore: Send + Sync {
    fn load_credential(&self) -> Result<Option<ApiKey>, Error>;
    fn persist_credential(&self, key: &ApiKey) -> Result<(), Error>;
    fn clear_credential(&self) -> Result<(), Error>;
}
