//! PKCE verifier/challenge pair (RFC 7636, S256)

use crate::error::{HeliosError, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

/// Random bytes behind each verifier
pub const VERIFIER_BYTES: usize = 40;

#[derive(Clone)]
pub struct PkcePair {
    verifier: String,
    challenge: String,
}

impl PkcePair {
    /// Fresh pair from the system CSPRNG
    pub fn generate() -> Result<Self> {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; VERIFIER_BYTES];
        rng.fill(&mut bytes)
            .map_err(|_| HeliosError::auth("Failed to generate PKCE verifier"))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Deterministic pair, for callers supplying their own randomness
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

/// `base64url_nopad(SHA256(verifier))`
pub fn challenge_for(verifier: &str) -> String {
    let hash = digest::digest(&digest::SHA256, verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash.as_ref())
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("challenge", &self.challenge)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc7636_appendix_b_vector() {
        assert_eq!(
            challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn generated_pair_is_consistent() {
        for _ in 0..16 {
            let pair = PkcePair::generate().unwrap();
            // 40 bytes -> 54 base64 characters without padding
            assert_eq!(pair.verifier().len(), 54);
            assert!(!pair.verifier().contains('='));
            assert!(!pair.verifier().contains('+'));
            assert!(!pair.verifier().contains('/'));
            assert_eq!(pair.challenge(), challenge_for(pair.verifier()));
        }
    }

    #[test]
    fn verifiers_differ() {
        let a = PkcePair::generate().unwrap();
        let b = PkcePair::generate().unwrap();
        assert_ne!(a.verifier(), b.verifier());
    }
}
