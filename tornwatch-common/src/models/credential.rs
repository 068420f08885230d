use std::fmt;

use crate::error::Error;

const API_KEY_LEN: usize = 16;

/// Opaque account credential. Only constructed through [`ApiKey::parse`].
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.len() != API_KEY_LEN || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidCredentialFormat(format!(
                "expected {} alphanumeric characters, got {}",
                API_KEY_LEN,
                trimmed.chars().count()
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = &self.0[self.0.len().saturating_sub(4)..];
        write!(f, "ApiKey(****{})", tail)
    }
}
