//! Credential hashing
//!
//! Passwords are stored as Argon2id PHC strings
//! (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`), so the parameters travel
//! with each record and verification never needs the config that produced it.

use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Memory cost in KiB; kept small so a login fits the Workers CPU budget
const MEMORY_KIB: u32 = 4_096;
const ITERATIONS: u32 = 2;
const LANES: u32 = 1;

const ALGORITHM: &str = "argon2id";

/// Argon2id hash of a password, as a PHC string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash {
    phc: String,
}

impl PasswordHash {
    /// Hash a password under a fresh random salt
    pub fn new(password: &str) -> Result<Self> {
        let params = Params::new(MEMORY_KIB, ITERATIONS, LANES, None)
            .map_err(|e| DashboardError::Credential(format!("argon2 params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
            .map_err(|e| DashboardError::Credential(format!("argon2 salt: {e}")))?;
        let phc = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DashboardError::Credential(format!("argon2 hash: {e}")))?
            .to_string();

        Ok(Self { phc })
    }

    /// Check a claimed password against this hash
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PhcHash::new(&self.phc) else {
            return false;
        };
        if parsed.algorithm.as_str() != ALGORITHM {
            return false;
        }
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(password: &str) -> PasswordHash {
        PasswordHash::new(password).expect("hashing should succeed")
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash("password1");
        assert!(hash.verify("password1"));
        assert!(!hash.verify("password2"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash("same");
        let b = hash("same");
        assert_ne!(a, b);
        assert!(a.verify("same") && b.verify("same"));
    }

    #[test]
    fn test_record_is_stretched_argon2id() {
        let hash = hash("password1");
        let prefix = format!("$argon2id$v=19$m={MEMORY_KIB},t={ITERATIONS},p={LANES}$");
        assert!(hash.phc.starts_with(&prefix), "unexpected record: {}", hash.phc);

        let parsed = PhcHash::new(&hash.phc).expect("record should parse");
        assert!(parsed.salt.is_some());
        assert!(parsed.hash.is_some());
    }

    #[test]
    fn test_serializes_as_bare_phc_string() {
        let hash = hash("hunter2");
        let json = serde_json::to_string(&hash).expect("hash serialization should succeed");
        assert!(json.starts_with("\"$argon2id$"));
        assert!(!json.contains("hunter2"));

        let restored: PasswordHash = serde_json::from_str(&json).expect("hash should deserialize");
        assert!(restored.verify("hunter2"));
    }

    #[test]
    fn test_corrupt_or_foreign_record_never_verifies() {
        let garbage = PasswordHash {
            phc: "not a phc string".to_string(),
        };
        assert!(!garbage.verify("anything"));

        let foreign = PasswordHash {
            phc: hash("pw").phc.replacen("argon2id", "argon2i", 1),
        };
        assert!(!foreign.verify("pw"));
    }
}
