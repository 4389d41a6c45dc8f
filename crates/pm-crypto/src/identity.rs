//! Long-term identity key management.
//!
//! Each participant owns exactly one Ed25519 signing keypair for the
//! lifetime of the process. The private half is persisted unencrypted in
//! PKCS#8 PEM and is never transmitted; the public half travels in-band
//! inside every handshake flight.

use std::fs;
use std::path::Path;

use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

/// A raw 32-byte Ed25519 public key, as transmitted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityPublicKey(pub [u8; 32]);

impl IdentityPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey(format!("identity key must be 32 bytes, got {}", bytes.len())))?;
        // Reject keys that don't even decompress to a valid curve point — this
        // is the cheapest place to catch a corrupt or forged identity key.
        VerifyingKey::from_bytes(&arr).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Human-legible fingerprint for out-of-band verification: BLAKE3 of the
    /// public key, truncated to 20 bytes, hex-encoded in groups of 4.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.0);
        let hex = hex::encode(&hash.as_bytes()[..20]);
        hex.as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The long-term Ed25519 signing keypair. Zeroizes its secret bytes on drop.
#[derive(ZeroizeOnDrop)]
pub struct Identity {
    #[zeroize(skip)]
    public: IdentityPublicKey,
    secret_bytes: [u8; 32],
}

impl Identity {
    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public = IdentityPublicKey(signing_key.verifying_key().to_bytes());
        Self {
            public,
            secret_bytes: signing_key.to_bytes(),
        }
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.secret_bytes)
    }

    pub fn public(&self) -> IdentityPublicKey {
        self.public
    }

    /// Sign arbitrary bytes, returning a raw 64-byte Ed25519 signature.
    pub fn sign(&self, msg: &[u8]) -> [u8; 64] {
        self.signing_key().sign(msg).to_bytes()
    }

    /// Verify a signature made by the identity key identified by `public`.
    pub fn verify(public: &IdentityPublicKey, msg: &[u8], sig_bytes: &[u8]) -> Result<(), CryptoError> {
        let vk = VerifyingKey::from_bytes(&public.0).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let sig_arr: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey(format!("signature must be 64 bytes, got {}", sig_bytes.len())))?;
        let sig = Signature::from_bytes(&sig_arr);
        vk.verify(msg, &sig).map_err(|_| CryptoError::SignatureVerification)
    }

    /// Load the identity from `path`, creating and persisting a fresh one if
    /// the file does not yet exist. Subsequent calls with the same path MUST
    /// return byte-identical public keys.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let path = path.as_ref();
        if path.exists() {
            let pem = fs::read_to_string(path)?;
            let signing_key = SigningKey::from_pkcs8_pem(&pem)
                .map_err(|e| CryptoError::IdentityFormat(e.to_string()))?;
            return Ok(Self::from_signing_key(signing_key));
        }

        let signing_key = SigningKey::generate(&mut OsRng);
        let pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::IdentityFormat(e.to_string()))?;
        fs::write(path, pem.as_bytes())?;
        set_owner_only_permissions(path)?;
        Ok(Self::from_signing_key(signing_key))
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), CryptoError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), CryptoError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generates_and_persists_on_first_use() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("identity_key.pem");
        assert!(!path.exists());
        let id = Identity::load_or_create(&path).unwrap();
        assert!(path.exists());
        let _ = id.public();
    }

    #[test]
    fn reloading_yields_identical_public_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("identity_key.pem");
        let first_id = Identity::load_or_create(&path).unwrap();
        let first = first_id.public();
        drop(first_id);
        let second = Identity::load_or_create(&path).unwrap().public();
        assert_eq!(first, second);
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let dir = tempdir().unwrap();
        let id = Identity::load_or_create(dir.path().join("id.pem")).unwrap();
        let msg = b"ephemeral-public-key-bytes";
        let sig = id.sign(msg);
        Identity::verify(&id.public(), msg, &sig).unwrap();
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let dir = tempdir().unwrap();
        let id = Identity::load_or_create(dir.path().join("id.pem")).unwrap();
        let sig = id.sign(b"original");
        let err = Identity::verify(&id.public(), b"tampered", &sig).unwrap_err();
        assert!(matches!(err, CryptoError::SignatureVerification));
    }
}
