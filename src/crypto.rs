use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Deterministic keypair from a 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        KeyPair {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    /// Address owned by this keypair
    pub fn address(&self) -> String {
        address_from_pubkey(&self.public_key_bytes())
    }
}

/// Accounts controlled by a key live at the first 20 bytes of sha256(pubkey)
pub fn address_from_pubkey(pubkey: &[u8]) -> String {
    let digest = Sha256::digest(pubkey);
    hex::encode(&digest[..20])
}

/// Verify an Ed25519 signature given raw public key bytes
pub fn verify_ed25519(pubkey: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(pk_bytes) = <[u8; 32]>::try_from(pubkey) else {
        return false;
    };
    let (Ok(pubkey), Ok(signature)) = (
        VerifyingKey::from_bytes(&pk_bytes),
        Signature::from_slice(signature),
    ) else {
        return false;
    };
    pubkey.verify(message, &signature).is_ok()
}
