//! PKCE (Proof Key for Code Exchange) verifier and challenge generation
//!
//! Implements the S256 method from RFC 7636 for the OAuth 2.0 authorization
//! code flow.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, Result};

/// Number of random octets drawn for the code verifier.
const VERIFIER_BYTES: usize = 32;

/// PKCE verifier/challenge pair for a single authorization attempt.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier/challenge pair
    ///
    /// The verifier is 32 bytes from the OS random source, base64url-encoded
    /// without padding. The challenge is BASE64URL(SHA256(verifier)), hashing
    /// the verifier exactly as it will later be sent in the token exchange.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; VERIFIER_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::RandomSource(e.to_string()))?;

        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

        Ok(PkcePair {
            verifier,
            challenge,
        })
    }
}
