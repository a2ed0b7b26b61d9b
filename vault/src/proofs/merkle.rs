//! Merkle trees over structured fields.
//!
//! Leaves are `hash(serialize(field))`. An inner node is the hash of the
//! concatenated *hex strings* of its children, not of their raw digests.
//! When a level has an odd number of nodes the last one is paired with
//! itself:
//!
//! ```text
//!            root = H(n01 || n22)
//!           /                    \
//!    n01 = H(a || b)        n22 = H(c || c)
//!     /        \              /        \
//!    a          b            c        (c)
//! ```
//!
//! A consequence of self-pairing is that `[a, b, c]` and `[a, b, c, c]`
//! have the same root. Callers that care must commit to the leaf count
//! separately.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProofError;
use crate::crypto::{hash_json, hash_str};
use crate::types::ContentHash;

/// Which side of the running hash a sibling sits on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One level of an inclusion proof.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProofStep {
    pub hash: ContentHash,
    pub position: Side,
}

/// A fully materialized Merkle tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleTree {
    /// Leaf hashes, in field order.
    pub leaves: Vec<ContentHash>,
    /// Every level from the leaves (`levels[0]`) up to the root level.
    pub levels: Vec<Vec<ContentHash>>,
    pub root: ContentHash,
}

fn node(left: &ContentHash, right: &ContentHash) -> ContentHash {
    let mut joined = String::with_capacity(left.as_str().len() + right.as_str().len());
    joined.push_str(left.as_str());
    joined.push_str(right.as_str());
    hash_str(&joined)
}

impl MerkleTree {
    /// Builds the tree over `fields`.
    pub fn build(fields: &[Value]) -> Result<Self, ProofError> {
        if fields.is_empty() {
            return Err(ProofError::EmptyTree);
        }

        let leaves: Vec<ContentHash> = fields.iter().map(hash_json).collect();
        let mut levels = vec![leaves.clone()];

        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => node(left, right),
                    [only] => node(only, only),
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            levels.push(next);
        }

        let root = levels
            .last()
            .and_then(|top| top.first())
            .cloned()
            .ok_or(ProofError::EmptyTree)?;

        tracing::debug!(leaves = leaves.len(), depth = levels.len(), root = %root, "built merkle tree");

        Ok(Self {
            leaves,
            levels,
            root,
        })
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Inclusion proof for the leaf at `index`: one step per level below
    /// the root.
    ///
    /// The trailing node of an odd level is its own sibling, so its step
    /// carries its own hash on the right.
    pub fn proof(&self, index: usize) -> Result<Vec<ProofStep>, ProofError> {
        if index >= self.leaves.len() {
            return Err(ProofError::LeafIndexOutOfRange {
                index,
                leaves: self.leaves.len(),
            });
        }

        let depth = self.levels.len().saturating_sub(1);
        let mut steps = Vec::with_capacity(depth);
        let mut i = index;

        for level in &self.levels[..depth] {
            let step = if i % 2 == 1 {
                ProofStep {
                    hash: level[i - 1].clone(),
                    position: Side::Left,
                }
            } else {
                let sibling = level.get(i + 1).unwrap_or(&level[i]);
                ProofStep {
                    hash: sibling.clone(),
                    position: Side::Right,
                }
            };
            steps.push(step);
            i /= 2;
        }

        Ok(steps)
    }
}

/// Folds `proof` over `leaf` and compares the result with `root`.
pub fn verify_merkle_proof(leaf: &ContentHash, proof: &[ProofStep], root: &ContentHash) -> bool {
    let computed = proof.iter().fold(leaf.clone(), |acc, step| match step.position {
        Side::Left => node(&step.hash, &acc),
        Side::Right => node(&acc, &step.hash),
    });
    computed == *root
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| json!(s)).collect()
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let tree = MerkleTree::build(&fields(&["only"])).expect("build");
        assert_eq!(tree.root, hash_json(&json!("only")));
        assert_eq!(tree.levels.len(), 1);
        assert!(tree.proof(0).expect("proof").is_empty());
        assert!(verify_merkle_proof(&tree.leaves[0], &[], &tree.root));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(MerkleTree::build(&[]).unwrap_err(), ProofError::EmptyTree);
    }

    #[test]
    fn three_leaves_pair_the_last_with_itself() {
        let tree = MerkleTree::build(&fields(&["a", "b", "c"])).expect("build");
        let [la, lb, lc] = [&tree.leaves[0], &tree.leaves[1], &tree.leaves[2]];

        let n01 = hash_str(&format!("{la}{lb}"));
        let n22 = hash_str(&format!("{lc}{lc}"));
        let root = hash_str(&format!("{n01}{n22}"));
        assert_eq!(tree.root, root);
        assert_eq!(tree.levels.len(), 3);

        let proof = tree.proof(2).expect("proof for c");
        assert_eq!(
            proof,
            vec![
                ProofStep {
                    hash: lc.clone(),
                    position: Side::Right
                },
                ProofStep {
                    hash: n01,
                    position: Side::Left
                },
            ]
        );
        assert!(verify_merkle_proof(lc, &proof, &tree.root));
    }

    #[test]
    fn every_leaf_proof_verifies() {
        for n in 1..=9 {
            let items: Vec<Value> = (0..n).map(|i| json!({ "field": i })).collect();
            let tree = MerkleTree::build(&items).expect("build");
            for (i, leaf) in tree.leaves.iter().enumerate() {
                let proof = tree.proof(i).expect("proof");
                assert_eq!(proof.len(), tree.levels.len() - 1);
                assert!(verify_merkle_proof(leaf, &proof, &tree.root), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn tampered_proofs_fail() {
        let tree = MerkleTree::build(&fields(&["a", "b", "c", "d"])).expect("build");
        let mut proof = tree.proof(1).expect("proof");
        assert!(verify_merkle_proof(&tree.leaves[1], &proof, &tree.root));

        // Wrong leaf.
        assert!(!verify_merkle_proof(&tree.leaves[0], &proof, &tree.root));

        // Flipped side.
        proof[0].position = Side::Right;
        assert!(!verify_merkle_proof(&tree.leaves[1], &proof, &tree.root));
    }

    #[test]
    fn duplicated_trailing_leaf_shares_root() {
        let three = MerkleTree::build(&fields(&["a", "b", "c"])).expect("build");
        let four = MerkleTree::build(&fields(&["a", "b", "c", "c"])).expect("build");
        assert_eq!(three.root, four.root);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let tree = MerkleTree::build(&fields(&["a", "b"])).expect("build");
        assert_eq!(
            tree.proof(2).unwrap_err(),
            ProofError::LeafIndexOutOfRange {
                index: 2,
                leaves: 2
            }
        );
    }

    #[test]
    fn positions_serialize_lowercase() {
        let step = ProofStep {
            hash: ContentHash::from_hex("00"),
            position: Side::Left,
        };
        let v = serde_json::to_value(&step).expect("serialize");
        assert_eq!(v, json!({ "hash": "00", "position": "left" }));
    }
}
