//! Integrity and originality proofs.
//!
//! None of these are zero-knowledge proofs in the cryptographic sense.
//! They are hash commitments and transcripts built from SHA-256 over hex
//! strings, kept bit-for-bit compatible with the transcripts the registry
//! has always produced:
//!
//! - [`merkle`]: Merkle trees over structured fields, inclusion proofs.
//! - [`commitment`]: hiding commitments to JSON payloads, nullifiers.
//! - [`originality`]: membership check against the known-hash set.
//! - [`range`]: range and knowledge transcripts.
//! - [`batch`]: structural batch checks over transcripts.

pub mod batch;
pub mod commitment;
pub mod merkle;
pub mod originality;
pub mod range;

use thiserror::Error;

pub use batch::{BatchItem, BatchReport, ProofTranscript, batch_verify_proofs};
pub use commitment::{Commitment, generate_commitment, generate_nullifier, verify_commitment};
pub use merkle::{MerkleTree, ProofStep, Side, verify_merkle_proof};
pub use originality::{OriginalityProof, prove_originality, verify_originality_proof};
pub use range::{
    KnowledgeProof, RangeProof, generate_range_proof, prove_knowledge, verify_knowledge_proof,
    verify_range_proof,
};

/// Errors raised while producing proofs.
///
/// Verification never errors; it answers `true` or `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("cannot build a Merkle tree without leaves")]
    EmptyTree,
    #[error("leaf index {index} out of range for {leaves} leaves")]
    LeafIndexOutOfRange { index: usize, leaves: usize },
    #[error("patent matches existing patent")]
    NotOriginal,
    #[error("value {value} out of range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },
}
