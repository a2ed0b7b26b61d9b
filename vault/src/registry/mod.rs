//! In-process patent registry.
//!
//! [`PatentRegistry`] owns the table of registered patents and the
//! insertion-ordered set of known patent hashes. All state sits behind one
//! async mutex, so the originality check and the insertion of a new hash
//! cannot interleave between concurrent registrations.
//!
//! Nothing here is persisted; a restart starts from an empty registry.

pub mod ids;

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::crypto::hash_json;
use crate::proofs::{
    OriginalityProof, ProofError, generate_commitment, prove_originality, verify_originality_proof,
};
use crate::types::{ContentHash, PatentId, PatentRecord, PatentStatus, unix_millis};

pub use ids::IdGenerator;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0}")]
    Validation(String),
    #[error("patent is not original")]
    NotOriginal,
    #[error("patent not found: {0}")]
    NotFound(String),
}

/// Input to [`PatentRegistry::register`].
#[derive(Clone, Debug, Default)]
pub struct RegisterPatent {
    pub title: String,
    pub description: String,
    pub inventor: Option<String>,
    /// Content address of the already uploaded document.
    pub content_address: String,
    /// Payload to hash and commit to. Defaults to
    /// `{title, description, inventor}` in that key order, with `inventor`
    /// left out when absent.
    pub payload: Option<Value>,
}

impl RegisterPatent {
    fn validate(&self) -> Result<(), RegistryError> {
        if self.title.is_empty() || self.description.is_empty() || self.content_address.is_empty() {
            return Err(RegistryError::Validation(
                "Title, description, and IPFS hash are required".to_string(),
            ));
        }
        Ok(())
    }

    fn hash_payload(&self) -> Value {
        if let Some(payload) = &self.payload {
            return payload.clone();
        }
        let mut m = Map::new();
        m.insert("title".to_string(), Value::from(self.title.as_str()));
        m.insert("description".to_string(), Value::from(self.description.as_str()));
        if let Some(inventor) = &self.inventor {
            m.insert("inventor".to_string(), Value::from(inventor.as_str()));
        }
        Value::Object(m)
    }
}

#[derive(Default)]
struct RegistryState {
    records: Vec<PatentRecord>,
    by_id: HashMap<PatentId, usize>,
    known: Vec<ContentHash>,
    known_set: HashSet<ContentHash>,
}

impl RegistryState {
    fn remember(&mut self, hash: ContentHash) {
        if self.known_set.insert(hash.clone()) {
            self.known.push(hash);
        }
    }
}

#[derive(Default)]
pub struct PatentRegistry {
    state: Mutex<RegistryState>,
    ids: IdGenerator,
}

impl PatentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks originality, commits to the payload and stores a new record
    /// in [`PatentStatus::Filed`].
    pub async fn register(&self, req: RegisterPatent) -> Result<PatentRecord, RegistryError> {
        req.validate()?;

        let payload = req.hash_payload();
        let patent_hash = hash_json(&payload);

        let mut state = self.state.lock().await;

        let originality_proof = match prove_originality(&patent_hash, &state.known) {
            Ok(p) => p,
            Err(ProofError::NotOriginal) => {
                tracing::info!(patent_hash = %patent_hash, "rejected duplicate registration");
                return Err(RegistryError::NotOriginal);
            }
            Err(e) => return Err(RegistryError::Validation(e.to_string())),
        };
        let commitment = generate_commitment(&payload);

        let record = PatentRecord {
            id: self.ids.next_id(),
            title: req.title,
            description: req.description,
            inventor: req.inventor,
            ipfs_hash: req.content_address,
            patent_hash: patent_hash.clone(),
            commitment: commitment.commitment,
            originality_proof,
            timestamp: unix_millis(),
            status: PatentStatus::Filed,
        };

        let idx = state.records.len();
        state.by_id.insert(record.id.clone(), idx);
        state.records.push(record.clone());
        state.remember(patent_hash);

        tracing::info!(id = %record.id, patent_hash = %record.patent_hash, "registered patent");
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<PatentRecord, RegistryError> {
        let state = self.state.lock().await;
        state
            .by_id
            .get(&PatentId(id.to_string()))
            .map(|&idx| state.records[idx].clone())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// All records in registration order.
    pub async fn list(&self) -> Vec<PatentRecord> {
        self.state.lock().await.records.clone()
    }

    /// Proves `hash` original against the current set and, on success,
    /// adds it to the set in the same critical section.
    pub async fn claim_originality(&self, hash: ContentHash) -> Result<OriginalityProof, RegistryError> {
        let mut state = self.state.lock().await;
        let proof = prove_originality(&hash, &state.known).map_err(|e| match e {
            ProofError::NotOriginal => RegistryError::NotOriginal,
            other => RegistryError::Validation(other.to_string()),
        })?;
        state.remember(hash);
        Ok(proof)
    }

    /// Verifies `proof` against the known set as it is now.
    pub async fn verify_originality(&self, proof: &OriginalityProof) -> bool {
        let state = self.state.lock().await;
        verify_originality_proof(proof, &state.known)
    }

    /// Snapshot of known hashes in insertion order.
    pub async fn known_hashes(&self) -> Vec<ContentHash> {
        self.state.lock().await.known.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
