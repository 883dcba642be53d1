//! Deterministic AES-256-CBC codec for single string fields.
//!
//! Every call shares one key and one fixed initialization vector, so equal
//! plaintexts always produce equal ciphertexts. Stored values can be joined
//! on ciphertext, at the cost of revealing which rows repeat a value.
//! Ciphertext is PKCS#7 padded and rendered as standard base64.

use std::fmt;

use aes::Aes256;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256};

use crate::config::IV_LEN;
use crate::error::PipelineError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Symmetric codec bound to a fixed key and IV.
#[derive(Clone)]
pub struct FieldCodec {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl FieldCodec {
    /// Creates a codec from raw key and IV bytes.
    #[must_use]
    pub const fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Creates a codec whose key is the SHA-256 digest of `passphrase`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if `iv` is not exactly 16 bytes.
    pub fn from_passphrase(passphrase: &str, iv: &[u8]) -> Result<Self, PipelineError> {
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| {
            PipelineError::Config(format!(
                "initialization vector must be {IV_LEN} bytes, got {}",
                iv.len()
            ))
        })?;
        let key: [u8; KEY_LEN] = Sha256::digest(passphrase.as_bytes()).into();
        Ok(Self::new(key, iv))
    }

    /// Encrypts a UTF-8 field value.
    #[must_use]
    pub fn encrypt(&self, plaintext: &str) -> String {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Encrypts raw bytes and returns base64 ciphertext.
    #[must_use]
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> String {
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        STANDARD.encode(ciphertext)
    }

    /// Decrypts base64 ciphertext back to a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Codec`] if the text is not base64, the
    /// ciphertext is not a whole number of blocks, the padding is wrong,
    /// or the plaintext is not UTF-8.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, PipelineError> {
        let bytes = self.decrypt_bytes(ciphertext)?;
        String::from_utf8(bytes)
            .map_err(|e| PipelineError::Codec(format!("plaintext is not UTF-8: {e}")))
    }

    /// Decrypts base64 ciphertext back to raw bytes.
    ///
    /// # Errors
    ///
    /// Same as [`FieldCodec::decrypt`], minus the UTF-8 check.
    pub fn decrypt_bytes(&self, ciphertext: &str) -> Result<Vec<u8>, PipelineError> {
        let raw = STANDARD
            .decode(ciphertext)
            .map_err(|e| PipelineError::Codec(format!("invalid base64: {e}")))?;
        Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&raw)
            .map_err(|_| PipelineError::Codec("bad padding or ciphertext length".to_string()))
    }
}

impl fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCodec").finish_non_exhaustive()
    }
}
