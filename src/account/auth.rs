//! Public keys used for standard signature verification

use serde::{Deserialize, Serialize};

use crate::crypto::{address_from_pubkey, verify_ed25519};

/// Authentication mode of an account, as seen by the standard verifier
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum PubKey {
    /// Ed25519 public key (32 bytes)
    Ed25519(Vec<u8>),

    /// Carried by abstract accounts. Never verifies any signature, so a
    /// pipeline that falls back to standard verification for such an
    /// account still rejects the transaction.
    Nil,
}

impl PubKey {
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Ed25519(pk) => verify_ed25519(pk, message, signature),
            Self::Nil => false,
        }
    }

    /// Address controlled by this key, if any
    pub fn address(&self) -> Option<String> {
        match self {
            Self::Ed25519(pk) => Some(address_from_pubkey(pk)),
            Self::Nil => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_ed25519_key() {
        let kp = KeyPair::from_seed([3u8; 32]);
        let key = PubKey::Ed25519(kp.public_key_bytes());
        let sig = kp.sign(b"payload");

        assert!(key.verify(b"payload", &sig));
        assert!(!key.verify(b"tampered", &sig));
        assert_eq!(key.address(), Some(kp.address()));
    }

    #[test]
    fn test_nil_key_never_verifies() {
        let kp = KeyPair::from_seed([3u8; 32]);
        let sig = kp.sign(b"payload");

        assert!(!PubKey::Nil.verify(b"payload", &sig));
        assert!(!PubKey::Nil.verify(b"", b""));
        assert_eq!(PubKey::Nil.address(), None);
    }
}
