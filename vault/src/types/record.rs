//! Types for registered patents.
//!
//! A [`PatentRecord`] connects:
//!
//! - a registry-assigned identifier (`PatentId`),
//! - the content address of the stored document,
//! - the content hash that gated originality,
//! - and the commitment / originality proof issued at registration,
//!
//! together with the wall-clock time of registration.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ContentHash;
use crate::proofs::OriginalityProof;

/// Registry identifier: a strictly increasing decimal number rendered as a
/// string (millisecond-resolution wall clock, bumped on collision).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatentId(pub String);

impl PatentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for PatentId {
    fn from(n: u64) -> Self {
        PatentId(n.to_string())
    }
}

/// Lifecycle status of a patent.
///
/// The registry only ever creates records in [`PatentStatus::Filed`]; the
/// other states exist for presentation layers that track examination on
/// top of the registry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatentStatus {
    #[default]
    Filed,
    UnderExamination,
    Granted,
    Rejected,
    Transferred,
    Expired,
}

/// A registered patent, as returned by `GET /api/patent/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatentRecord {
    pub id: PatentId,
    pub title: String,
    pub description: String,
    pub inventor: Option<String>,

    /// Content address of the uploaded document (an IPFS CID for the IPFS
    /// backend).
    pub ipfs_hash: String,

    /// Hash of the serialized registration payload. Uniqueness of this
    /// value across the registry is what "originality" means.
    pub patent_hash: ContentHash,

    /// Hiding commitment to the registration payload.
    pub commitment: ContentHash,

    pub originality_proof: OriginalityProof,

    /// Milliseconds since Unix epoch at registration.
    pub timestamp: u64,

    pub status: PatentStatus,
}
