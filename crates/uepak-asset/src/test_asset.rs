//! In-memory package writer for tests.

use uepak_common::{BinaryReader, Guid};

use crate::names::NONE;
use crate::package_index::PackageIndex;
use crate::summary::{AssetSummary, PACKAGE_FILE_TAG};
use crate::tables::{ObjectExport, ObjectImport};
use crate::versions as ver;

pub(crate) const TEST_GUID: Guid = Guid::new(0x11111111, 0x22222222, 0x33333333, 0x44444444);

trait Put {
    fn put_u8(&mut self, v: u8);
    fn put_u16(&mut self, v: u16);
    fn put_i32(&mut self, v: i32);
    fn put_u32(&mut self, v: u32);
    fn put_i64(&mut self, v: i64);
    fn put_f32(&mut self, v: f32);
    fn put_fstring(&mut self, s: &str);
    fn put_guid(&mut self, guid: Guid);
}

impl Put for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }
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
    fn put_f32(&mut self, v: f32) {
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
    fn put_guid(&mut self, guid: Guid) {
        for word in guid.words() {
            self.put_u32(word);
        }
    }
}

fn intern(names: &mut Vec<String>, name: &str) -> i32 {
    match names.iter().position(|n| n == name) {
        Some(index) => index as i32,
        None => {
            names.push(name.to_string());
            names.len() as i32 - 1
        }
    }
}

/// Header metadata of a written tag.
enum Extra<'s> {
    None,
    Bool(bool),
    Enum(&'s str),
    Struct(&'s str),
    Inner(&'s str),
    Map(&'s str, &'s str),
}

/// Writes a tagged property stream, interning names into a shared table.
pub(crate) struct StreamWriter<'n> {
    names: &'n mut Vec<String>,
    out: Vec<u8>,
}

impl<'n> StreamWriter<'n> {
    pub(crate) fn new(names: &'n mut Vec<String>) -> Self {
        Self { names, out: Vec::new() }
    }

    /// Append the `None` sentinel and return the stream.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        let none = self.fname(NONE);
        self.out.extend_from_slice(&none);
        self.out
    }

    fn fname(&mut self, name: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(8);
        out.put_i32(intern(self.names, name));
        out.put_i32(0);
        out
    }

    fn header(&mut self, name: &str, type_name: &str, size: usize, extra: Extra) -> Vec<u8> {
        let mut out = self.fname(name);
        out.extend(self.fname(type_name));
        out.put_i32(size as i32);
        out.put_i32(0);
        match extra {
            Extra::None => {}
            Extra::Bool(value) => out.put_u8(value as u8),
            Extra::Enum(enum_name) | Extra::Inner(enum_name) => out.extend(self.fname(enum_name)),
            Extra::Struct(struct_name) => {
                out.extend(self.fname(struct_name));
                out.put_guid(Guid::EMPTY);
            }
            Extra::Map(key, value) => {
                out.extend(self.fname(key));
                out.extend(self.fname(value));
            }
        }
        // No property GUID
        out.put_u8(0);
        out
    }

    fn tag(&mut self, name: &str, type_name: &str, extra: Extra, payload: &[u8]) {
        let header = self.header(name, type_name, payload.len(), extra);
        self.out.extend(header);
        self.out.extend_from_slice(payload);
    }

    pub(crate) fn bool(&mut self, name: &str, value: bool) {
        self.tag(name, "BoolProperty", Extra::Bool(value), &[]);
    }

    pub(crate) fn int(&mut self, name: &str, value: i32) {
        self.tag(name, "IntProperty", Extra::None, &value.to_le_bytes());
    }

    pub(crate) fn float(&mut self, name: &str, value: f32) {
        self.tag(name, "FloatProperty", Extra::None, &value.to_le_bytes());
    }

    pub(crate) fn str(&mut self, name: &str, value: &str) {
        let mut payload = Vec::new();
        payload.put_fstring(value);
        self.tag(name, "StrProperty", Extra::None, &payload);
    }

    pub(crate) fn name(&mut self, name: &str, value: &str) {
        let payload = self.fname(value);
        self.tag(name, "NameProperty", Extra::None, &payload);
    }

    pub(crate) fn byte(&mut self, name: &str, value: u8) {
        self.tag(name, "ByteProperty", Extra::Enum(NONE), &[value]);
    }

    pub(crate) fn enum_value(&mut self, name: &str, enum_type: &str, value: &str) {
        let payload = self.fname(value);
        self.tag(name, "EnumProperty", Extra::Enum(enum_type), &payload);
    }

    pub(crate) fn object(&mut self, name: &str, index: PackageIndex) {
        self.tag(name, "ObjectProperty", Extra::None, &index.0.to_le_bytes());
    }

    pub(crate) fn text(&mut self, name: &str, namespace: &str, key: &str, source: &str) {
        let mut payload = Vec::new();
        payload.put_u32(0);
        payload.put_u8(0);
        payload.put_fstring(namespace);
        payload.put_fstring(key);
        payload.put_fstring(source);
        self.tag(name, "TextProperty", Extra::None, &payload);
    }

    pub(crate) fn vector(&mut self, name: &str, value: [f32; 3]) {
        let mut payload = Vec::new();
        for f in value {
            payload.put_f32(f);
        }
        self.tag(name, "StructProperty", Extra::Struct("Vector"), &payload);
    }

    /// A struct serialized as a nested property list.
    pub(crate) fn struct_value(&mut self, name: &str, struct_type: &str, f: impl FnOnce(&mut StreamWriter)) {
        let mut nested = StreamWriter::new(&mut *self.names);
        f(&mut nested);
        let payload = nested.finish();
        self.tag(name, "StructProperty", Extra::Struct(struct_type), &payload);
    }

    pub(crate) fn int_array(&mut self, name: &str, values: &[i32]) {
        let mut payload = Vec::new();
        payload.put_i32(values.len() as i32);
        for v in values {
            payload.put_i32(*v);
        }
        self.tag(name, "ArrayProperty", Extra::Inner("IntProperty"), &payload);
    }

    pub(crate) fn byte_array(&mut self, name: &str, values: &[u8]) {
        let mut payload = Vec::new();
        payload.put_i32(values.len() as i32);
        payload.extend_from_slice(values);
        self.tag(name, "ArrayProperty", Extra::Inner("ByteProperty"), &payload);
    }

    pub(crate) fn vector_array(&mut self, name: &str, values: &[[f32; 3]]) {
        let mut elements = Vec::new();
        for value in values {
            for f in value {
                elements.put_f32(*f);
            }
        }
        self.struct_array_payload(name, "Vector", values.len(), elements);
    }

    /// An array of property-list structs sharing one inner tag.
    pub(crate) fn struct_array(
        &mut self,
        name: &str,
        struct_type: &str,
        count: usize,
        mut f: impl FnMut(&mut StreamWriter, usize),
    ) {
        let mut elements = Vec::new();
        for i in 0..count {
            let mut nested = StreamWriter::new(&mut *self.names);
            f(&mut nested, i);
            elements.extend(nested.finish());
        }
        self.struct_array_payload(name, struct_type, count, elements);
    }

    fn struct_array_payload(&mut self, name: &str, struct_type: &str, count: usize, elements: Vec<u8>) {
        let mut payload = Vec::new();
        payload.put_i32(count as i32);
        payload.extend(self.header(name, "StructProperty", elements.len(), Extra::Struct(struct_type)));
        payload.extend(elements);
        self.tag(name, "ArrayProperty", Extra::Inner("StructProperty"), &payload);
    }

    /// An array property with a hand-built payload.
    pub(crate) fn array_raw(&mut self, name: &str, inner_type: &str, payload: &[u8]) {
        self.tag(name, "ArrayProperty", Extra::Inner(inner_type), payload);
    }

    pub(crate) fn int_str_map(&mut self, name: &str, entries: &[(i32, &str)]) {
        let mut payload = Vec::new();
        payload.put_i32(0);
        payload.put_i32(entries.len() as i32);
        for (key, value) in entries {
            payload.put_i32(*key);
            payload.put_fstring(value);
        }
        self.tag(name, "MapProperty", Extra::Map("IntProperty", "StrProperty"), &payload);
    }

    /// A map from names to vectors, the way a cooked `TMap<FName, FVector>`
    /// is stored.
    pub(crate) fn name_vector_map(&mut self, name: &str, entries: &[(&str, [f32; 3])]) {
        let mut payload = Vec::new();
        payload.put_i32(0);
        payload.put_i32(entries.len() as i32);
        for (key, value) in entries {
            let fname = self.fname(key);
            payload.extend(fname);
            for f in value {
                payload.put_f32(*f);
            }
        }
        self.tag(name, "MapProperty", Extra::Map("NameProperty", "StructProperty"), &payload);
    }

    pub(crate) fn name_set(&mut self, name: &str, values: &[&str]) {
        let mut payload = Vec::new();
        payload.put_i32(0);
        payload.put_i32(values.len() as i32);
        for value in values {
            let fname = self.fname(value);
            payload.extend(fname);
        }
        self.tag(name, "SetProperty", Extra::Inner("NameProperty"), &payload);
    }

    /// A tag with no type metadata and an arbitrary payload.
    pub(crate) fn raw(&mut self, name: &str, type_name: &str, payload: &[u8]) {
        self.tag(name, type_name, Extra::None, payload);
    }
}

struct ImportRow {
    class_package: i32,
    class_name: i32,
    outer: PackageIndex,
    object_name: i32,
}

/// One export to write.
pub(crate) struct ExportSpec {
    name: String,
    class: PackageIndex,
    super_index: PackageIndex,
    template: PackageIndex,
    outer: PackageIndex,
    data: Option<Vec<u8>>,
}

impl ExportSpec {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            class: PackageIndex::NULL,
            super_index: PackageIndex::NULL,
            template: PackageIndex::NULL,
            outer: PackageIndex::NULL,
            data: None,
        }
    }

    pub(crate) fn class(mut self, index: PackageIndex) -> Self {
        self.class = index;
        self
    }

    pub(crate) fn template(mut self, index: PackageIndex) -> Self {
        self.template = index;
        self
    }

    pub(crate) fn outer(mut self, index: PackageIndex) -> Self {
        self.outer = index;
        self
    }

    /// Serialized export data. Defaults to an empty property list.
    pub(crate) fn data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Default)]
struct Layout {
    total_header_size: usize,
    names_offset: usize,
    imports_offset: usize,
    exports_offset: usize,
}

/// Writes a cooked UE 4.27 package (legacy version -7, editor-only data
/// filtered).
pub(crate) struct PackageBuilder {
    names: Vec<String>,
    imports: Vec<ImportRow>,
    exports: Vec<(i32, ExportSpec)>,
}

impl PackageBuilder {
    pub(crate) fn new() -> Self {
        Self {
            names: vec![NONE.to_string()],
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub(crate) fn import(
        &mut self,
        class_package: &str,
        class_name: &str,
        object_name: &str,
        outer: PackageIndex,
    ) -> PackageIndex {
        let row = ImportRow {
            class_package: intern(&mut self.names, class_package),
            class_name: intern(&mut self.names, class_name),
            outer,
            object_name: intern(&mut self.names, object_name),
        };
        self.imports.push(row);
        PackageIndex::from_import(self.imports.len() - 1)
    }

    pub(crate) fn export(&mut self, spec: ExportSpec) -> PackageIndex {
        let name = intern(&mut self.names, &spec.name);
        self.exports.push((name, spec));
        PackageIndex::from_export(self.exports.len() - 1)
    }

    /// Write a property stream using this package's name table.
    pub(crate) fn stream(&mut self, f: impl FnOnce(&mut StreamWriter)) -> Vec<u8> {
        let mut writer = StreamWriter::new(&mut self.names);
        f(&mut writer);
        writer.finish()
    }

    /// Single-file package with export data after the header.
    pub(crate) fn build(&self) -> Vec<u8> {
        let header_len = self.header(0).len();
        let mut out = self.header(header_len);
        for data in self.export_data() {
            out.extend(data);
        }
        out
    }

    /// Split package: `.uasset` header and `.uexp` export data.
    pub(crate) fn build_split(&self) -> (Vec<u8>, Vec<u8>) {
        let header_len = self.header(0).len();
        let header = self.header(header_len);
        let mut uexp = Vec::new();
        for data in self.export_data() {
            uexp.extend(data);
        }
        uexp.put_u32(PACKAGE_FILE_TAG);
        (header, uexp)
    }

    fn export_data(&self) -> Vec<Vec<u8>> {
        self.exports
            .iter()
            .map(|(_, spec)| spec.data.clone().unwrap_or_else(|| vec![0u8; 8]))
            .collect()
    }

    fn header(&self, data_start: usize) -> Vec<u8> {
        let mut names = Vec::new();
        for name in &self.names {
            names.put_fstring(name);
            names.put_u16(0);
            names.put_u16(0);
        }

        let mut imports = Vec::new();
        for row in &self.imports {
            for index in [row.class_package, row.class_name] {
                imports.put_i32(index);
                imports.put_i32(0);
            }
            imports.put_i32(row.outer.0);
            imports.put_i32(row.object_name);
            imports.put_i32(0);
        }

        let mut exports = Vec::new();
        let mut serial_offset = data_start as i64;
        for ((name, spec), data) in self.exports.iter().zip(self.export_data()) {
            for index in [spec.class, spec.super_index, spec.template, spec.outer] {
                exports.put_i32(index.0);
            }
            exports.put_i32(*name);
            exports.put_i32(0);
            exports.put_u32(0);
            exports.put_i64(data.len() as i64);
            exports.put_i64(serial_offset);
            serial_offset += data.len() as i64;
            for flag in [0u32, 0, 0] {
                exports.put_u32(flag);
            }
            exports.put_guid(Guid::EMPTY);
            exports.put_u32(0);
            exports.put_u32(0);
            exports.put_u32(1);
            for dependency in [-1i32, 0, 0, 0, 0] {
                exports.put_i32(dependency);
            }
        }

        let summary_len = self.summary(&Layout::default()).len();
        let layout = Layout {
            names_offset: summary_len,
            imports_offset: summary_len + names.len(),
            exports_offset: summary_len + names.len() + imports.len(),
            total_header_size: summary_len + names.len() + imports.len() + exports.len(),
        };

        let mut out = self.summary(&layout);
        out.extend(names);
        out.extend(imports);
        out.extend(exports);
        out
    }

    fn summary(&self, layout: &Layout) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u32(PACKAGE_FILE_TAG);
        out.put_i32(-7);
        out.put_i32(864);
        out.put_i32(ver::LATEST);
        out.put_i32(0);
        out.put_i32(0);

        out.put_i32(layout.total_header_size as i32);
        out.put_fstring(NONE);
        out.put_u32(ver::PKG_FILTER_EDITOR_ONLY);
        out.put_i32(self.names.len() as i32);
        out.put_i32(layout.names_offset as i32);
        // Gatherable text data
        out.put_i32(0);
        out.put_i32(0);
        out.put_i32(self.exports.len() as i32);
        out.put_i32(layout.exports_offset as i32);
        out.put_i32(self.imports.len() as i32);
        out.put_i32(layout.imports_offset as i32);
        out.put_i32(layout.total_header_size as i32);
        // Soft package references, searchable names, thumbnails
        out.put_i32(0);
        out.put_i32(0);
        out.put_i32(0);
        out.put_i32(0);
        out.put_guid(TEST_GUID);

        out.put_i32(1);
        out.put_i32(self.exports.len() as i32);
        out.put_i32(self.names.len() as i32);

        for _ in 0..2 {
            out.put_u16(4);
            out.put_u16(27);
            out.put_u16(2);
            out.put_u32(0);
            out.put_fstring("++UE4+Release-4.27");
        }

        // Compression flags, compressed chunks, package source, additional
        // packages, asset registry
        for _ in 0..5 {
            out.put_i32(0);
        }
        out.put_i64(layout.total_header_size as i64);
        // World tile info, chunk ids, preload dependencies
        for _ in 0..4 {
            out.put_i32(0);
        }
        out
    }
}

/// Summary of an empty package from [`PackageBuilder`].
pub(crate) fn summary_for_tests() -> AssetSummary {
    let bytes = PackageBuilder::new().build();
    AssetSummary::decode(&mut BinaryReader::new(&bytes)).unwrap()
}

pub(crate) fn import_named(class_package: &str, class_name: &str, object_name: &str) -> ObjectImport {
    ObjectImport {
        class_package: class_package.to_string(),
        class_name: class_name.to_string(),
        outer_index: PackageIndex::NULL,
        object_name: object_name.to_string(),
        package_name: None,
    }
}

pub(crate) fn export_named(name: &str) -> ObjectExport {
    ObjectExport {
        class_index: PackageIndex::NULL,
        super_index: PackageIndex::NULL,
        template_index: PackageIndex::NULL,
        outer_index: PackageIndex::NULL,
        object_name: name.to_string(),
        object_flags: 0,
        serial_size: 0,
        serial_offset: 0,
        forced_export: false,
        not_for_client: false,
        not_for_server: false,
        package_guid: Guid::EMPTY,
        package_flags: 0,
        not_always_loaded_for_editor_game: false,
        is_asset: false,
        first_export_dependency: -1,
        serialization_before_serialization_dependencies: 0,
        create_before_serialization_dependencies: 0,
        serialization_before_create_dependencies: 0,
        create_before_create_dependencies: 0,
    }
}
