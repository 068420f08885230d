// src/credential.rs
//
// Credential stores: the OS keyring for real use, memory for tests and
// `--memory-credentials`.

use std::sync::Mutex;

use tracing::debug;

use tornwatch_common::models::ApiKey;
use tornwatch_common::traits::CredentialStore;

use crate::Error;

const KEYRING_SERVICE: &str = "tornwatch";
const KEYRING_USER: &str = "api_key";

pub struct KeyringCredentialStore {
    service: String,
    user: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_names(KEYRING_SERVICE, KEYRING_USER)
    }

    pub fn with_names(service: &str, user: &str) -> Self {
        Self {
            service: service.to_string(),
            user: user.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, Error> {
        Ok(keyring::Entry::new(&self.service, &self.user)?)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load_credential(&self) -> Result<Option<ApiKey>, Error> {
        match self.entry()?.get_password() {
            Ok(raw) => match ApiKey::parse(&raw) {
                Ok(key) => Ok(Some(key)),
                Err(e) => {
                    debug!("Ignoring malformed stored credential: {}", e);
                    Ok(None)
                }
            },
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn persist_credential(&self, key: &ApiKey) -> Result<(), Error> {
        self.entry()?.set_password(key.as_str())?;
        Ok(())
    }

    fn clear_credential(&self) -> Result<(), Error> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    key: Mutex<Option<ApiKey>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: ApiKey) -> Self {
        Self {
            key: Mutex::new(Some(key)),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<ApiKey>>, Error> {
        self.key
            .lock()
            .map_err(|_| Error::Keyring("memory store poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_credential(&self) -> Result<Option<ApiKey>, Error> {
        Ok(self.slot()?.clone())
    }

    fn persist_credential(&self, key: &ApiKey) -> Result<(), Error> {
        *self.slot()? = Some(key.clone());
        Ok(())
    }

    fn clear_credential(&self) -> Result<(), Error> {
        *self.slot()? = None;
        Ok(())
    }
}
