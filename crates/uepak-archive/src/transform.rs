//! The decompression/decryption capability used by entry reads.
//!
//! The archive reader only slices stored bytes out of the file. Turning them
//! into plain bytes is delegated to an [`EntryTransform`], so hosts can plug
//! in codecs this crate does not ship (Oodle, game-specific ciphers).

use crate::crypto::AesKey;
use crate::decompress;
use crate::entry::CompressionMethod;
use crate::{Error, Result};

/// Turns stored bytes into plain bytes.
///
/// `raw` is one stored unit: a compression block, a whole uncompressed entry
/// or an encrypted index. Encrypted input is padded to 16 bytes; for
/// uncompressed data the caller truncates the padding afterwards.
pub trait EntryTransform: Send + Sync {
    fn transform(&self, method: &CompressionMethod, encrypted: bool, raw: &[u8]) -> Result<Vec<u8>>;
}

impl<T: EntryTransform + ?Sized> EntryTransform for &T {
    fn transform(&self, method: &CompressionMethod, encrypted: bool, raw: &[u8]) -> Result<Vec<u8>> {
        (**self).transform(method, encrypted, raw)
    }
}

impl<T: EntryTransform + ?Sized> EntryTransform for Box<T> {
    fn transform(&self, method: &CompressionMethod, encrypted: bool, raw: &[u8]) -> Result<Vec<u8>> {
        (**self).transform(method, encrypted, raw)
    }
}

/// Default capability: AES-256 (when a key is configured), zlib, gzip and
/// Zstandard.
#[derive(Debug, Clone, Default)]
pub struct StandardTransform {
    key: Option<AesKey>,
}

impl StandardTransform {
    /// A transform without an encryption key.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transform that decrypts with the given 32-byte key.
    pub fn with_key(key: &[u8]) -> Result<Self> {
        Ok(Self {
            key: Some(AesKey::from_bytes(key)?),
        })
    }

    /// A transform that decrypts with a key written in hex (`0x` optional).
    pub fn with_hex_key(key: &str) -> Result<Self> {
        Ok(Self {
            key: Some(AesKey::from_hex(key)?),
        })
    }

    /// Whether an encryption key is configured.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }
}

impl EntryTransform for StandardTransform {
    fn transform(&self, method: &CompressionMethod, encrypted: bool, raw: &[u8]) -> Result<Vec<u8>> {
        let decrypted;
        let input = if encrypted {
            let key = self.key.as_ref().ok_or_else(|| {
                Error::DecryptionFailed("data is encrypted and no AES key was supplied".into())
            })?;
            decrypted = key.decrypt(raw)?;
            decrypted.as_slice()
        } else {
            raw
        };

        let mut output = Vec::new();
        match method {
            CompressionMethod::None => output.extend_from_slice(input),
            CompressionMethod::Zlib => decompress::decompress_zlib(input, &mut output)?,
            CompressionMethod::Gzip => decompress::decompress_gzip(input, &mut output)?,
            CompressionMethod::Zstd => decompress::decompress_zstd(input, &mut output)?,
            other => return Err(Error::UnsupportedCompression(other.name().to_string())),
        }
        Ok(output)
    }
}
