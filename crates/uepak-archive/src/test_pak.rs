//! In-memory pak writer for tests.

use std::collections::BTreeMap;
use std::io::Write;

use aes::Aes256Enc;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, KeyInit};

use crate::footer::PAK_MAGIC;

pub(crate) const TEST_KEY: [u8; 32] = [0x42; 32];

pub(crate) struct TestEntry {
    name: String,
    data: Vec<u8>,
    compress: bool,
    encrypt: bool,
    full_record: bool,
}

impl TestEntry {
    pub(crate) fn new(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            data: data.to_vec(),
            compress: false,
            encrypt: false,
            full_record: false,
        }
    }

    pub(crate) fn zlib(mut self) -> Self {
        self.compress = true;
        self
    }

    pub(crate) fn encrypted(mut self) -> Self {
        self.encrypt = true;
        self
    }

    /// Store as a full record in a v10+ primary index instead of an encoded one.
    pub(crate) fn full_record(mut self) -> Self {
        self.full_record = true;
        self
    }
}

pub(crate) struct TestPak {
    version: u32,
    mount_point: String,
    entries: Vec<TestEntry>,
    encrypt_index: bool,
}

struct Written {
    name: String,
    offset: u64,
    compressed: u64,
    uncompressed: u64,
    compress: bool,
    encrypt: bool,
    full_record: bool,
    block: Option<(u64, u64)>,
}

pub(crate) fn write_fstring(out: &mut Vec<u8>, s: &str) {
    if s.is_empty() {
        out.extend_from_slice(&0i32.to_le_bytes());
        return;
    }
    out.extend_from_slice(&(s.len() as i32 + 1).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

pub(crate) fn encrypt(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    padded.resize((data.len() + 15) & !15, 0);
    let cipher = Aes256Enc::new_from_slice(&TEST_KEY).unwrap();
    for block in padded.chunks_exact_mut(16) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    padded
}

impl TestPak {
    pub(crate) fn new(version: u32) -> Self {
        Self {
            version,
            mount_point: "../../../".to_string(),
            entries: Vec::new(),
            encrypt_index: false,
        }
    }

    pub(crate) fn entry(mut self, entry: TestEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub(crate) fn encrypt_index(mut self) -> Self {
        self.encrypt_index = true;
        self
    }

    fn header_size(&self, compressed: bool) -> u64 {
        let mut size = 8 + 8 + 8 + 4 + 20;
        if self.version == 1 {
            size += 8;
        }
        if self.version >= 3 {
            if compressed {
                size += 4 + 16;
            }
            size += 1 + 4;
        }
        size
    }

    fn method_field(&self, compressed: bool) -> u32 {
        // zlib is flag 0x01 before v8 and name slot 1 afterwards
        u32::from(compressed)
    }

    fn full_entry(&self, entry: &Written, relative_base: u64) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&entry.offset.to_le_bytes());
        out.extend_from_slice(&entry.compressed.to_le_bytes());
        out.extend_from_slice(&entry.uncompressed.to_le_bytes());
        out.extend_from_slice(&self.method_field(entry.compress).to_le_bytes());
        if self.version == 1 {
            out.extend_from_slice(&0u64.to_le_bytes());
        }
        out.extend_from_slice(&[0u8; 20]);
        if self.version >= 3 {
            if let Some((start, end)) = entry.block {
                out.extend_from_slice(&1u32.to_le_bytes());
                out.extend_from_slice(&(start - relative_base).to_le_bytes());
                out.extend_from_slice(&(end - relative_base).to_le_bytes());
            }
            out.push(u8::from(entry.encrypt));
            out.extend_from_slice(&0x10000u32.to_le_bytes());
        }
        out
    }

    fn encoded_entry(&self, entry: &Written) -> Vec<u8> {
        let block_count = u32::from(entry.block.is_some());
        let mut bits: u32 = (1 << 31) | (1 << 30) | (1 << 29) | 32;
        bits |= block_count << 6;
        if entry.encrypt {
            bits |= 1 << 22;
        }
        if entry.compress {
            bits |= 1 << 23;
        }

        let mut out = bits.to_le_bytes().to_vec();
        out.extend_from_slice(&(entry.offset as u32).to_le_bytes());
        out.extend_from_slice(&(entry.uncompressed as u32).to_le_bytes());
        if entry.compress {
            out.extend_from_slice(&(entry.compressed as u32).to_le_bytes());
        }
        if let Some((start, end)) = entry.block {
            if entry.encrypt {
                out.extend_from_slice(&((end - start) as u32).to_le_bytes());
            }
        }
        out
    }

    fn seal_index(&self, index: Vec<u8>) -> Vec<u8> {
        if self.encrypt_index {
            encrypt(&index)
        } else {
            index
        }
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut written = Vec::new();

        for entry in &self.entries {
            let offset = out.len() as u64;
            let stored = if entry.compress {
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&entry.data).unwrap();
                encoder.finish().unwrap()
            } else {
                entry.data.clone()
            };

            let header_size = self.header_size(entry.compress);
            let data_start = offset + header_size;
            let record = Written {
                name: entry.name.clone(),
                offset,
                compressed: stored.len() as u64,
                uncompressed: entry.data.len() as u64,
                compress: entry.compress,
                encrypt: entry.encrypt,
                full_record: entry.full_record,
                block: entry
                    .compress
                    .then_some((data_start, data_start + stored.len() as u64)),
            };

            let relative_base = if self.version >= 5 { offset } else { 0 };
            let header = self.full_entry(&record, relative_base);
            assert_eq!(header.len() as u64, header_size);
            out.extend_from_slice(&header);

            if entry.encrypt {
                out.extend_from_slice(&encrypt(&stored));
            } else {
                out.extend_from_slice(&stored);
            }
            written.push(record);
        }

        let (index_offset, index_size) = if self.version >= 10 {
            self.write_path_hash_index(&mut out, &written)
        } else {
            let mut index = Vec::new();
            write_fstring(&mut index, &self.mount_point);
            index.extend_from_slice(&(written.len() as u32).to_le_bytes());
            for record in &written {
                write_fstring(&mut index, &record.name);
                let relative_base = if self.version >= 5 { record.offset } else { 0 };
                index.extend_from_slice(&self.full_entry(record, relative_base));
            }
            let size = index.len() as u64;
            let index = self.seal_index(index);
            let offset = out.len() as u64;
            out.extend_from_slice(&index);
            (offset, size)
        };

        self.write_footer(&mut out, index_offset, index_size);
        out
    }

    fn write_path_hash_index(&self, out: &mut Vec<u8>, written: &[Written]) -> (u64, u64) {
        let mut encoded = Vec::new();
        let mut files = Vec::new();
        let mut dirs: BTreeMap<String, Vec<(String, i32)>> = BTreeMap::new();

        for record in written {
            let location = if record.full_record {
                files.push(self.full_entry(record, record.offset));
                -(files.len() as i32)
            } else {
                let loc = encoded.len() as i32;
                encoded.extend_from_slice(&self.encoded_entry(record));
                loc
            };

            let (dir, file) = match record.name.rfind('/') {
                Some(slash) => (
                    format!("/{}/", &record.name[..slash]),
                    record.name[slash + 1..].to_string(),
                ),
                None => ("/".to_string(), record.name.clone()),
            };
            dirs.entry(dir).or_default().push((file, location));
        }

        let mut directory = Vec::new();
        directory.extend_from_slice(&(dirs.len() as u32).to_le_bytes());
        for (dir, files) in &dirs {
            write_fstring(&mut directory, dir);
            directory.extend_from_slice(&(files.len() as u32).to_le_bytes());
            for (file, location) in files {
                write_fstring(&mut directory, file);
                directory.extend_from_slice(&location.to_le_bytes());
            }
        }
        let directory_size = directory.len() as u64;
        let directory = self.seal_index(directory);
        let directory_offset = out.len() as u64;
        out.extend_from_slice(&directory);

        let mut index = Vec::new();
        write_fstring(&mut index, &self.mount_point);
        index.extend_from_slice(&(written.len() as u32).to_le_bytes());
        index.extend_from_slice(&0u64.to_le_bytes());
        index.extend_from_slice(&0u32.to_le_bytes()); // no path hash index
        index.extend_from_slice(&1u32.to_le_bytes());
        index.extend_from_slice(&directory_offset.to_le_bytes());
        index.extend_from_slice(&directory_size.to_le_bytes());
        index.extend_from_slice(&[0u8; 20]);
        index.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        index.extend_from_slice(&encoded);
        index.extend_from_slice(&(files.len() as u32).to_le_bytes());
        for file in &files {
            index.extend_from_slice(file);
        }

        let size = index.len() as u64;
        let index = self.seal_index(index);
        let offset = out.len() as u64;
        out.extend_from_slice(&index);
        (offset, size)
    }

    fn write_footer(&self, out: &mut Vec<u8>, index_offset: u64, index_size: u64) {
        if self.version >= 7 {
            out.extend_from_slice(&[0u8; 16]);
        }
        if self.version >= 4 {
            out.push(u8::from(self.encrypt_index));
        }
        out.extend_from_slice(&PAK_MAGIC.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&index_offset.to_le_bytes());
        out.extend_from_slice(&index_size.to_le_bytes());
        out.extend_from_slice(&[0u8; 20]);
        if self.version == 9 {
            out.push(0);
        }
        if self.version >= 8 {
            for i in 0..5 {
                let mut slot = [0u8; 32];
                if i == 0 {
                    slot[..4].copy_from_slice(b"Zlib");
                }
                out.extend_from_slice(&slot);
            }
        }
    }
}
