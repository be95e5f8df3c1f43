use crate::config::RelevanceMode;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";
const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,
    #[error("signature does not match request body")]
    Mismatch,
    #[error("webhook secret cannot be used as an HMAC key")]
    InvalidKey,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct PushCommit {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl PushCommit {
    pub fn touched_paths(&self) -> impl Iterator<Item = &str> {
        self.added
            .iter()
            .chain(&self.modified)
            .chain(&self.removed)
            .map(String::as_str)
    }
}

/// The subset of a GitHub push event this service reads.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct PushPayload {
    #[serde(default)]
    pub commits: Vec<PushCommit>,
    pub action: Option<String>,
}

/// `sha256=` followed by the lowercase hex HMAC-SHA256 of `body`, as GitHub sends it.
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes())))
}

/// Checks a webhook signature header against the raw body.
///
/// Without a header the check is skipped unless `require_header` is set. A present
/// header must equal the computed signature exactly.
pub fn verify_signature(
    secret: &str,
    header: Option<&str>,
    body: &[u8],
    require_header: bool,
) -> Result<(), SignatureError> {
    let Some(header) = header else {
        return if require_header {
            Err(SignatureError::Missing)
        } else {
            Ok(())
        };
    };

    if compute_signature(secret, body)? == header {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

pub fn touches_folder(payload: &PushPayload, folder: &str) -> bool {
    payload
        .commits
        .iter()
        .any(|commit| commit.touched_paths().any(|path| path.starts_with(folder)))
}

pub fn is_relevant(payload: &PushPayload, folder: &str, mode: RelevanceMode) -> bool {
    match mode {
        RelevanceMode::Always => true,
        RelevanceMode::ContentChanges => touches_folder(payload, folder),
    }
}
