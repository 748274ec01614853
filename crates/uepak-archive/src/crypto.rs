//! Pak decryption using AES-256-ECB.
//!
//! Encrypted spans in a pak archive are padded to the AES block size and
//! decrypted block by block with no chaining.

use aes::Aes256Dec;
use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, KeyInit};

use crate::{Error, Result};

/// AES block size in bytes.
pub const AES_BLOCK: usize = 16;

/// A 256-bit archive key.
#[derive(Clone)]
pub struct AesKey {
    cipher: Aes256Dec,
}

impl AesKey {
    /// Create a key from 32 raw bytes.
    pub fn from_bytes(key: &[u8]) -> Result<Self> {
        let cipher = Aes256Dec::new_from_slice(key).map_err(|_| {
            Error::DecryptionFailed(format!("key must be 32 bytes, got {}", key.len()))
        })?;
        Ok(Self { cipher })
    }

    /// Parse a key written as 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(key: &str) -> Result<Self> {
        let trimmed = key.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| Error::DecryptionFailed(format!("invalid hex key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Decrypt data in place.
    ///
    /// The data length must be a multiple of the AES block size (16 bytes).
    pub fn decrypt_in_place(&self, data: &mut [u8]) -> Result<()> {
        if data.len() % AES_BLOCK != 0 {
            return Err(Error::DecryptionFailed(format!(
                "data length {} is not a multiple of {}",
                data.len(),
                AES_BLOCK
            )));
        }

        for block in data.chunks_exact_mut(AES_BLOCK) {
            self.cipher.decrypt_block(GenericArray::from_mut_slice(block));
        }

        Ok(())
    }

    /// Decrypt data to a new buffer.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut buffer = data.to_vec();
        self.decrypt_in_place(&mut buffer)?;
        Ok(buffer)
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(..)")
    }
}
