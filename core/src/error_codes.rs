//! Stable machine-readable error codes.
//!
//! These strings are part of the public surface: the CLI prints them and callers may
//! match on them, so existing values must not change.

pub const LOAD_IO: &str = "FU_LOAD_IO";
pub const LOAD_NOT_ARCHIVE: &str = "FU_LOAD_NOT_ARCHIVE";
pub const LOAD_DEFINITION_NOT_FOUND: &str = "FU_LOAD_DEFINITION_NOT_FOUND";
pub const LOAD_DECODE_FAILED: &str = "FU_LOAD_DECODE_FAILED";
pub const LOAD_PARSE_FAILED: &str = "FU_LOAD_PARSE_FAILED";
pub const LOAD_TOO_MANY_ENTRIES: &str = "FU_LOAD_TOO_MANY_ENTRIES";
pub const LOAD_PART_TOO_LARGE: &str = "FU_LOAD_PART_TOO_LARGE";
pub const LOAD_TOTAL_TOO_LARGE: &str = "FU_LOAD_TOTAL_TOO_LARGE";

pub const EXPORT_CSV: &str = "FU_EXPORT_CSV";
pub const EXPORT_JSON: &str = "FU_EXPORT_JSON";
pub const EXPORT_IO: &str = "FU_EXPORT_IO";
