//! Types for the publisher module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::session::{ArtifactKind, SessionId};

/// One artifact copied into the public tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    /// URL the file is served under.
    pub url: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// SHA-256 of the published file, hex encoded.
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedSession {
    pub session_id: SessionId,
    pub artifacts: BTreeMap<ArtifactKind, PublishedArtifact>,
}

impl PublishedSession {
    pub fn url(&self, kind: ArtifactKind) -> Option<&str> {
        self.artifacts.get(&kind).map(|a| a.url.as_str())
    }
}
