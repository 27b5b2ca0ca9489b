use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

#[derive(Debug, Serialize, Deserialize)]
struct DownloadClaims {
    /// Storage key the token grants read access to.
    key: String,
    exp: usize,
}

/// Issues and checks time-limited download tokens for blobs that are served
/// by this process rather than by an object store.
#[derive(Clone)]
pub struct DownloadSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    /// Base URL tokens are appended to, e.g. `http://host/api/v1/files`.
    download_base: String,
}

impl std::fmt::Debug for DownloadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadSigner")
            .field("download_base", &self.download_base)
            .finish_non_exhaustive()
    }
}

impl DownloadSigner {
    pub fn new(secret: &[u8], download_base: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            download_base: download_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn sign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let exp = Utc::now().timestamp() + i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2);
        let claims = DownloadClaims {
            key: key.to_string(),
            exp: usize::try_from(exp).unwrap_or_default(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| StorageError::Backend(format!("failed to sign download token: {e}")))
    }

    /// Full download URL for `key`.
    pub fn url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!("{}/{}", self.download_base, self.sign(key, ttl)?))
    }

    /// Returns the storage key a token grants access to.
    pub fn verify(&self, token: &str) -> Result<String, StorageError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<DownloadClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims.key)
            .map_err(|_| StorageError::InvalidToken)
    }
}
