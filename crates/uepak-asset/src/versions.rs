//! UE4 object (file) versions that change the package layout.
//!
//! Only versions that gate a field this decoder reads are listed.

pub const OLDEST_LOADABLE_PACKAGE: i32 = 214;
pub const WORLD_LEVEL_INFO: i32 = 224;
pub const ADDED_CHUNKID_TO_ASSETDATA_AND_UPACKAGE: i32 = 278;
pub const ARRAY_PROPERTY_INNER_TAGS: i32 = 282;
pub const CHANGED_CHUNKID_TO_BE_AN_ARRAY_OF_CHUNKIDS: i32 = 326;
pub const ENGINE_VERSION_OBJECT: i32 = 336;
pub const LOAD_FOR_EDITOR_GAME: i32 = 365;
pub const ADD_STRING_ASSET_REFERENCES_MAP: i32 = 384;
pub const STRUCT_GUID_IN_PROPERTY_TAG: i32 = 441;
pub const PACKAGE_SUMMARY_HAS_COMPATIBLE_ENGINE_VERSION: i32 = 444;
pub const SERIALIZE_TEXT_IN_PACKAGES: i32 = 459;
pub const COOKED_ASSETS_IN_EDITOR_SUPPORT: i32 = 485;
pub const PROPERTY_GUID_IN_PROPERTY_TAG: i32 = 503;
pub const NAME_HASHES_SERIALIZED: i32 = 504;
pub const PROPERTY_TAG_SET_MAP_SUPPORT: i32 = 505;
pub const PRELOAD_DEPENDENCIES_IN_COOKED_EXPORTS: i32 = 507;
pub const TEMPLATE_INDEX_IN_COOKED_EXPORTS: i32 = 508;
pub const ADDED_SEARCHABLE_NAMES: i32 = 510;
pub const EXPORTMAP_64BIT_SERIAL_SIZES: i32 = 511;
pub const ADDED_PACKAGE_SUMMARY_LOCALIZATION_ID: i32 = 516;
pub const ADDED_PACKAGE_OWNER: i32 = 518;
pub const NON_OUTER_PACKAGE_IMPORT: i32 = 520;

/// Newest UE4 object version (4.26/4.27).
pub const LATEST: i32 = 522;

/// `PackageFlags` bit set on cooked packages with editor-only data stripped.
pub const PKG_FILTER_EDITOR_ONLY: u32 = 0x8000_0000;
