//! Upload-identity memoization.
//!
//! Repeated interface actions against the same uploaded file must not
//! re-parse it, so extraction results are memoized per upload fingerprint.
//! The cache is a plain owned value: the hosting layer keeps one per
//! session, which keeps sessions isolated from each other.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::Digest;
use tracing::debug;

use crate::error::Result;
use crate::extract::{SurveyData, extract};

/// Content fingerprint identifying one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadFingerprint(String);

impl UploadFingerprint {
    /// Fingerprint the uploaded bytes (SHA-256, hex encoded).
    pub fn of(bytes: &[u8]) -> Self {
        let digest = sha2::Sha256::digest(bytes);
        Self(hex::encode(digest))
    }

    /// Hex form, usable as a display handle for the upload.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Memoized extraction results for one interactive session.
///
/// Parse failures are returned to the caller and never cached; a malformed
/// upload stays malformed on retry.
#[derive(Debug, Default)]
pub struct UploadCache {
    entries: HashMap<UploadFingerprint, Arc<SurveyData>>,
}

impl UploadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the uploaded bytes, reusing the memoized result when the
    /// same file content was already parsed in this session.
    pub fn fetch(&mut self, bytes: &[u8]) -> Result<Arc<SurveyData>> {
        let fingerprint = UploadFingerprint::of(bytes);
        if let Some(data) = self.entries.get(&fingerprint) {
            debug!(upload = fingerprint.as_hex(), "upload cache hit");
            return Ok(Arc::clone(data));
        }
        let data = Arc::new(extract(bytes)?);
        debug!(upload = fingerprint.as_hex(), "upload cache miss");
        self.entries.insert(fingerprint, Arc::clone(&data));
        Ok(data)
    }

    /// Number of distinct uploads parsed so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all memoized results.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
