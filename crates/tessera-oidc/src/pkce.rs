//! PKCE (RFC 7636, `S256`) and state token generation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Raw bytes of randomness behind each code verifier (86 chars once encoded).
const VERIFIER_BYTES: usize = 64;

/// Raw bytes of randomness behind each state token (43 chars once encoded).
const STATE_BYTES: usize = 32;

/// The only challenge method this client emits.
pub const CHALLENGE_METHOD: &str = "S256";

/// PKCE code verifier and challenge pair.
#[derive(Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new PKCE challenge pair.
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = derive_challenge(&verifier);

        Self {
            verifier,
            challenge,
        }
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("verifier", &"***REDACTED***")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Generate a URL-safe code verifier from the thread-local CSPRNG.
///
/// Panics only if the OS entropy source is unavailable, which leaves the
/// process unable to run any flow safely.
pub fn generate_verifier() -> String {
    random_token(VERIFIER_BYTES)
}

/// Compute the `S256` challenge: base64url (no padding) of SHA-256 over the
/// verifier's exact bytes.
pub fn derive_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Generate a random state string for CSRF protection and flow correlation.
pub fn generate_state() -> String {
    random_token(STATE_BYTES)
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
