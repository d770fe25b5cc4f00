//! Security answer encryption and local password hashing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use openssl::hash::MessageDigest;
use openssl::pkcs5::pbkdf2_hmac;
use openssl::rand::rand_bytes;
use openssl::symm::{decrypt_aead, encrypt_aead, Cipher};
use thiserror::Error;

use crate::kernel::BaseEncryptor;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const PBKDF2_ITERATIONS: usize = 100_000;
const PASSWORD_SCHEME: &str = "pbkdf2_sha256";

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption key must be 32 bytes of hex")]
    InvalidKey,

    #[error("Malformed ciphertext or password hash")]
    Malformed,

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),
}

/// AES-256-GCM encryptor. Output is `base64(nonce || ciphertext || tag)`.
pub struct AesGcmEncryptor {
    key: [u8; 32],
}

impl AesGcmEncryptor {
    pub fn from_hex(key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(key.trim()).map_err(|_| CryptoError::InvalidKey)?;
        let key: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { key })
    }

    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand_bytes(&mut nonce)?;

        let mut tag = [0u8; TAG_LEN];
        let ciphertext = encrypt_aead(
            Cipher::aes_256_gcm(),
            &self.key,
            Some(&nonce[..]),
            &[],
            plaintext.as_bytes(),
            &mut tag,
        )?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len() + TAG_LEN);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        out.extend_from_slice(&tag);
        Ok(STANDARD.encode(out))
    }

    pub fn open(&self, sealed: &str) -> Result<String, CryptoError> {
        let raw = STANDARD.decode(sealed).map_err(|_| CryptoError::Malformed)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Malformed);
        }

        let (nonce, rest) = raw.split_at(NONCE_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);
        let plaintext = decrypt_aead(
            Cipher::aes_256_gcm(),
            &self.key,
            Some(nonce),
            &[],
            ciphertext,
            tag,
        )?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Malformed)
    }
}

impl BaseEncryptor for AesGcmEncryptor {
    fn encrypt(&self, plaintext: &str) -> anyhow::Result<String> {
        Ok(self.seal(plaintext)?)
    }

    fn decrypt(&self, tag: &str) -> anyhow::Result<String> {
        Ok(self.open(tag)?)
    }
}

/// Hash a password as `pbkdf2_sha256$<iterations>$<salt>$<hash>`.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rand_bytes(&mut salt)?;

    let hash = derive(password, &salt, PBKDF2_ITERATIONS)?;
    Ok(format!(
        "{}${}${}${}",
        PASSWORD_SCHEME,
        PBKDF2_ITERATIONS,
        STANDARD.encode(salt),
        STANDARD.encode(hash)
    ))
}

pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let mut parts = stored.split('$');
    let (Some(PASSWORD_SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::Malformed);
    };

    let iterations: usize = iterations.parse().map_err(|_| CryptoError::Malformed)?;
    let salt = STANDARD.decode(salt).map_err(|_| CryptoError::Malformed)?;
    let expected = STANDARD.decode(expected).map_err(|_| CryptoError::Malformed)?;
    if expected.len() != HASH_LEN {
        return Err(CryptoError::Malformed);
    }

    let actual = derive(password, &salt, iterations)?;
    Ok(openssl::memcmp::eq(&actual, &expected))
}

fn derive(password: &str, salt: &[u8], iterations: usize) -> Result<[u8; HASH_LEN], CryptoError> {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac(
        password.as_bytes(),
        salt,
        iterations,
        MessageDigest::sha256(),
        &mut out,
    )?;
    Ok(out)
}
