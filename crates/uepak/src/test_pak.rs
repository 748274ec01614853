//! In-memory archives holding minimal packages, for tests.

use uepak_archive::{PakArchive, PAK_MAGIC};
use uepak_asset::PACKAGE_FILE_TAG;

const MOUNT_POINT: &str = "../../../";

/// Name table of every test package: "None", the property, its type, then
/// the export name.
const FIXED_NAMES: [&str; 3] = ["None", "BoolProperty", "bEnabled"];

trait Put {
    fn put_u16(&mut self, v: u16);
    fn put_i32(&mut self, v: i32);
    fn put_u32(&mut self, v: u32);
    fn put_i64(&mut self, v: i64);
    fn put_u64(&mut self, v: u64);
    fn put_fstring(&mut self, s: &str);
    fn put_name(&mut self, index: i32);
}

impl Put for Vec<u8> {
    fn put_u16(&mut self, v: u16) {
        self.extend_from_slice(&v.to_le_bytes());
    }
    fn put_i32(&mut self, v: i32) {
        self.extend_from_slice(&v.to_le_bytes());
    }
    fn put_u32(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes());
    }
    fn put_i64(&mut self, v: i64) {
        self.extend_from_slice(&v.to_le_bytes());
    }
    fn put_u64(&mut self, v: u64) {
        self.extend_from_slice(&v.to_le_bytes());
    }
    fn put_fstring(&mut self, s: &str) {
        if s.is_empty() {
            self.put_i32(0);
            return;
        }
        self.put_i32(s.len() as i32 + 1);
        self.extend_from_slice(s.as_bytes());
        self.push(0);
    }
    fn put_name(&mut self, index: i32) {
        self.put_i32(index);
        self.put_i32(0);
    }
}

/// Property stream: `bEnabled = enabled`, then the `None` terminator.
fn property_stream(enabled: bool) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_name(2);
    out.put_name(1);
    out.put_i32(0);
    out.put_i32(0);
    out.push(u8::from(enabled));
    out.push(0);
    out.put_name(0);
    out
}

/// Package summary for one export and no imports.
fn summary(name_count: i32, names_offset: i32, exports_offset: i32, total_header_size: i32) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_u32(PACKAGE_FILE_TAG);
    out.put_i32(-7);
    out.put_i32(864);
    out.put_i32(522);
    out.put_i32(0);
    out.put_i32(0);

    out.put_i32(total_header_size);
    out.put_fstring("None");
    out.put_u32(0x8000_0000);
    out.put_i32(name_count);
    out.put_i32(names_offset);
    out.put_i32(0);
    out.put_i32(0);
    out.put_i32(1);
    out.put_i32(exports_offset);
    out.put_i32(0);
    out.put_i32(exports_offset);
    out.put_i32(total_header_size);
    for _ in 0..4 {
        out.put_i32(0);
    }
    out.extend_from_slice(&[0x5A; 16]);

    out.put_i32(1);
    out.put_i32(1);
    out.put_i32(name_count);
    for _ in 0..2 {
        out.put_u16(4);
        out.put_u16(27);
        out.put_u16(2);
        out.put_u32(0);
        out.put_fstring("++UE4+Release-4.27");
    }

    for _ in 0..5 {
        out.put_i32(0);
    }
    out.put_i64(i64::from(total_header_size));
    for _ in 0..4 {
        out.put_i32(0);
    }
    out
}

/// Summary, names and export table, with the export's data at `data_start`.
fn header(export: &str, data_len: usize, data_start: usize) -> Vec<u8> {
    let mut names = Vec::new();
    for name in FIXED_NAMES.iter().chain(std::iter::once(&export)) {
        names.put_fstring(name);
        names.put_u16(0);
        names.put_u16(0);
    }
    let name_count = FIXED_NAMES.len() as i32 + 1;

    let mut exports = Vec::new();
    for _ in 0..4 {
        exports.put_i32(0);
    }
    exports.put_name(FIXED_NAMES.len() as i32);
    exports.put_u32(0);
    exports.put_i64(data_len as i64);
    exports.put_i64(data_start as i64);
    for _ in 0..3 {
        exports.put_u32(0);
    }
    exports.extend_from_slice(&[0u8; 16]);
    exports.put_u32(0);
    exports.put_u32(0);
    exports.put_u32(1);
    for dependency in [-1i32, 0, 0, 0, 0] {
        exports.put_i32(dependency);
    }

    let summary_len = summary(0, 0, 0, 0).len();
    let names_offset = summary_len;
    let exports_offset = names_offset + names.len();
    let total = exports_offset + exports.len();

    let mut out = summary(name_count, names_offset as i32, exports_offset as i32, total as i32);
    out.extend(names);
    out.extend(exports);
    out
}

/// A package with one export holding `bEnabled = enabled`.
pub(crate) fn package(export: &str, enabled: bool) -> Vec<u8> {
    let data = property_stream(enabled);
    let header_len = header(export, data.len(), 0).len();
    let mut out = header(export, data.len(), header_len);
    out.extend(data);
    out
}

/// The same package cooked split into `.uasset` and `.uexp`.
pub(crate) fn split_package(export: &str, enabled: bool) -> (Vec<u8>, Vec<u8>) {
    let data = property_stream(enabled);
    let header_len = header(export, data.len(), 0).len();
    let uasset = header(export, data.len(), header_len);
    let mut uexp = data;
    uexp.put_u32(PACKAGE_FILE_TAG);
    (uasset, uexp)
}

/// Entry record as written in both the data area and the index (version 2).
fn record(offset: u64, size: u64) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_u64(offset);
    out.put_u64(size);
    out.put_u64(size);
    out.put_u32(0);
    out.extend_from_slice(&[0u8; 20]);
    out
}

/// A version 2 archive of uncompressed entries.
pub(crate) fn pak_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut index = Vec::new();
    index.put_fstring(MOUNT_POINT);
    index.put_u32(entries.len() as u32);

    for (name, data) in entries {
        let header = record(out.len() as u64, data.len() as u64);
        out.extend_from_slice(&header);
        out.extend_from_slice(data);
        index.put_fstring(name);
        index.extend(header);
    }

    let index_offset = out.len() as u64;
    out.extend_from_slice(&index);
    out.put_u32(PAK_MAGIC);
    out.put_u32(2);
    out.put_u64(index_offset);
    out.put_u64(index.len() as u64);
    out.extend_from_slice(&[0u8; 20]);
    out
}

pub(crate) fn archive(entries: &[(&str, &[u8])]) -> PakArchive {
    PakArchive::from_bytes("Test-WindowsNoEditor.pak", pak_bytes(entries)).unwrap()
}
