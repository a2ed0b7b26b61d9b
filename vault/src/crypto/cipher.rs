//! Password-based authenticated encryption.
//!
//! Documents are sealed with AES-256-GCM under a key derived from a
//! password with scrypt. Every call draws a fresh salt and IV, so sealing
//! the same plaintext twice never yields the same blob. The wire layout is
//!
//! ```text
//! salt (16) || iv (16) || auth tag (16) || ciphertext (n)
//! ```
//!
//! GCM runs with a 16-byte nonce (hashed into the initial counter block by
//! GHASH), which keeps blobs readable by any AES-256-GCM implementation
//! that accepts 128-bit IVs.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;

use super::CryptoError;

/// Size of the random scrypt salt.
pub const SALT_LEN: usize = 16;
/// Size of the random GCM IV.
pub const IV_LEN: usize = 16;
/// Size of the GCM authentication tag.
pub const TAG_LEN: usize = 16;
/// Size of the derived AES-256 key.
pub const KEY_LEN: usize = 32;
/// Bytes preceding the ciphertext in a serialized blob.
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN + TAG_LEN;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// scrypt cost parameters.
///
/// The default matches the common interactive setting `N = 2^14, r = 8,
/// p = 1`. Blobs can only be opened with the parameters they were sealed
/// with; the parameters are not stored in the blob.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KdfParams {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: 14,
            r: 8,
            p: 1,
        }
    }
}

/// Derives a 256-bit key from `password` and `salt` with scrypt.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: &KdfParams,
) -> Result<[u8; KEY_LEN], CryptoError> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|e| CryptoError::Kdf(format!("invalid scrypt parameters: {e}")))?;

    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(password.as_bytes(), salt, &scrypt_params, &mut key)
        .map_err(|e| CryptoError::Kdf(format!("scrypt failed: {e}")))?;
    Ok(key)
}

/// Decoded form of a sealed document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedBlob {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub auth_tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Serializes to `salt || iv || tag || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.auth_tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Splits a serialized blob back into its fields.
    ///
    /// Anything shorter than the fixed header is rejected before any key
    /// derivation or decryption is attempted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < HEADER_LEN {
            return Err(CryptoError::Malformed(format!(
                "blob is {} bytes, need at least {HEADER_LEN}",
                bytes.len()
            )));
        }

        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (iv, rest) = rest.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut blob = EncryptedBlob {
            salt: [0u8; SALT_LEN],
            iv: [0u8; IV_LEN],
            auth_tag: [0u8; TAG_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        blob.salt.copy_from_slice(salt);
        blob.iv.copy_from_slice(iv);
        blob.auth_tag.copy_from_slice(tag);
        Ok(blob)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::Malformed(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Result of [`Cipher::encrypt`].
///
/// `encryption_key` is the password the blob was sealed with: either the
/// caller's own or a freshly generated one. The vault keeps no copy.
#[derive(Clone, Debug)]
pub struct Sealed {
    pub blob: EncryptedBlob,
    pub encryption_key: String,
}

/// Password-based AES-256-GCM sealing with a fixed KDF cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cipher {
    kdf: KdfParams,
}

impl Cipher {
    pub fn new(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Seals `plaintext` under `password`, generating a random 256-bit
    /// password (hex) when none is given.
    pub fn encrypt(&self, plaintext: &[u8], password: Option<&str>) -> Result<Sealed, CryptoError> {
        let encryption_key = match password {
            Some(p) => p.to_string(),
            None => random_hex(KEY_LEN),
        };

        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let key = derive_key(&encryption_key, &salt, &self.kdf)?;
        let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key));

        let mut ciphertext = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut ciphertext)
            .map_err(|_| CryptoError::Integrity("AES-GCM encryption failed".to_string()))?;

        let mut auth_tag = [0u8; TAG_LEN];
        auth_tag.copy_from_slice(&tag);

        Ok(Sealed {
            blob: EncryptedBlob {
                salt,
                iv,
                auth_tag,
                ciphertext,
            },
            encryption_key,
        })
    }

    /// Opens a serialized blob. Never returns unauthenticated plaintext: a
    /// wrong password, a flipped bit anywhere, or a truncated blob all fail.
    pub fn decrypt(&self, blob_bytes: &[u8], password: &str) -> Result<Vec<u8>, CryptoError> {
        let blob = EncryptedBlob::from_bytes(blob_bytes)?;
        self.decrypt_blob(&blob, password)
    }

    pub fn decrypt_blob(&self, blob: &EncryptedBlob, password: &str) -> Result<Vec<u8>, CryptoError> {
        let key = derive_key(password, &blob.salt, &self.kdf)?;
        let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key));

        let mut plaintext = blob.ciphertext.clone();
        cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(&blob.iv),
                b"",
                &mut plaintext,
                GenericArray::from_slice(&blob.auth_tag),
            )
            .map_err(|_| {
                CryptoError::Integrity(
                    "authentication tag mismatch (wrong password or corrupted data)".to_string(),
                )
            })?;
        Ok(plaintext)
    }
}

/// `len` random bytes, hex-encoded.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Cipher {
        Cipher::new(KdfParams {
            log_n: 4,
            r: 8,
            p: 1,
        })
    }

    #[test]
    fn roundtrip_with_password() {
        let c = cheap();
        let sealed = c.encrypt(b"prior art", Some("hunter2")).expect("encrypt");
        assert_eq!(sealed.encryption_key, "hunter2");

        let opened = c.decrypt(&sealed.blob.to_bytes(), "hunter2").expect("decrypt");
        assert_eq!(opened, b"prior art");
    }

    #[test]
    fn generated_key_is_256_bit_hex_and_opens_the_blob() {
        let c = cheap();
        let sealed = c.encrypt(b"claims", None).expect("encrypt");

        assert_eq!(sealed.encryption_key.len(), 64);
        assert!(sealed.encryption_key.chars().all(|ch| ch.is_ascii_hexdigit()));

        let opened = c
            .decrypt(&sealed.blob.to_bytes(), &sealed.encryption_key)
            .expect("decrypt");
        assert_eq!(opened, b"claims");
    }

    #[test]
    fn same_plaintext_and_password_give_distinct_blobs() {
        let c = cheap();
        let a = c.encrypt(b"same", Some("pw")).expect("encrypt a");
        let b = c.encrypt(b"same", Some("pw")).expect("encrypt b");

        assert_ne!(a.blob.to_bytes(), b.blob.to_bytes());
        assert_ne!(a.blob.salt, b.blob.salt);
        assert_eq!(c.decrypt(&a.blob.to_bytes(), "pw").unwrap(), b"same");
        assert_eq!(c.decrypt(&b.blob.to_bytes(), "pw").unwrap(), b"same");
    }

    #[test]
    fn wrong_password_is_an_integrity_error() {
        let c = cheap();
        let sealed = c.encrypt(b"0123456789", Some("right")).expect("encrypt");
        let err = c.decrypt(&sealed.blob.to_bytes(), "wrong").unwrap_err();
        assert!(matches!(err, CryptoError::Integrity(_)), "got {err:?}");
    }

    #[test]
    fn any_flipped_byte_in_tag_or_ciphertext_fails_closed() {
        let c = cheap();
        let sealed = c.encrypt(b"tamper-evident", Some("pw")).expect("encrypt");
        let bytes = sealed.blob.to_bytes();

        for i in (SALT_LEN + IV_LEN)..bytes.len() {
            let mut tampered = bytes.clone();
            tampered[i] ^= 0x01;
            let err = c.decrypt(&tampered, "pw").unwrap_err();
            assert!(
                matches!(err, CryptoError::Integrity(_)),
                "byte {i} flip returned {err:?}"
            );
        }
    }

    #[test]
    fn short_blob_is_rejected_before_decryption() {
        let c = cheap();
        let err = c.decrypt(&[0u8; HEADER_LEN - 1], "pw").unwrap_err();
        assert!(matches!(err, CryptoError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let c = cheap();
        let sealed = c.encrypt(b"a longer document body", Some("pw")).expect("encrypt");
        let mut bytes = sealed.blob.to_bytes();
        bytes.truncate(bytes.len() - 3);
        assert!(c.decrypt(&bytes, "pw").is_err());
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let c = cheap();
        let sealed = c.encrypt(b"", Some("pw")).expect("encrypt");
        let bytes = sealed.blob.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(c.decrypt(&bytes, "pw").expect("decrypt"), b"");
    }

    #[test]
    fn base64_form_matches_byte_layout() {
        let c = cheap();
        let sealed = c.encrypt(b"doc", Some("pw")).expect("encrypt");
        let decoded = EncryptedBlob::from_base64(&sealed.blob.to_base64()).expect("decode");
        assert_eq!(decoded, sealed.blob);
        assert!(EncryptedBlob::from_base64("not base64 !!").is_err());
    }

    #[test]
    fn derive_key_depends_on_salt() {
        let params = cheap().kdf;
        let k1 = derive_key("pw", &[1u8; SALT_LEN], &params).unwrap();
        let k2 = derive_key("pw", &[1u8; SALT_LEN], &params).unwrap();
        let k3 = derive_key("pw", &[2u8; SALT_LEN], &params).unwrap();
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[test]
    fn invalid_kdf_parameters_are_reported() {
        let params = KdfParams {
            log_n: 0,
            r: 0,
            p: 0,
        };
        let err = derive_key("pw", &[0u8; SALT_LEN], &params).unwrap_err();
        assert!(matches!(err, CryptoError::Kdf(_)));
    }
}
