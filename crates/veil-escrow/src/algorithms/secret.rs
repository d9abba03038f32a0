//! # Secret Generation and Commitment
//!
//! SHA-256 commitments gate every claim; secrets come from the OS RNG.

use crate::domain::{Hash, Secret, SecretBytes};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure random secret.
pub fn generate_secret() -> SecretBytes {
    let mut secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    SecretBytes::new(secret)
}

/// Commit to a secret: SHA-256 of the preimage.
pub fn commit(secret: &Secret) -> Hash {
    Sha256::digest(secret).into()
}

/// Verify that a secret is the preimage of a commitment.
pub fn verify_preimage(secret: &Secret, commitment: &Hash) -> bool {
    commit(secret) == *commitment
}
