//! ID prefix constants and generation.
//!
//! Every entity ID has the shape `<prefix>-<8 lowercase hex>`, e.g. `grp-a3f8b2c1`.
//! IDs are generated in-process so that a multi-record batch can reference
//! records it has not committed yet.

use crate::errors::CoreError;

pub const PREFIX_STUDENT: &str = "stu";
pub const PREFIX_TEACHER: &str = "tch";
pub const PREFIX_CREATION_REQUEST: &str = "gcr";
pub const PREFIX_GROUP: &str = "grp";
pub const PREFIX_INVITATION: &str = "inv";
pub const PREFIX_PROPOSAL: &str = "prp";
pub const PREFIX_SUPERVISION: &str = "svr";
pub const PREFIX_AUDIT: &str = "aud";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_STUDENT,
    PREFIX_TEACHER,
    PREFIX_CREATION_REQUEST,
    PREFIX_GROUP,
    PREFIX_INVITATION,
    PREFIX_PROPOSAL,
    PREFIX_SUPERVISION,
    PREFIX_AUDIT,
];

/// Generate a prefixed ID. Returns e.g. `"inv-0c9e41d7"`.
///
/// # Errors
///
/// Returns `CoreError::IdGeneration` if the OS random source is unavailable.
pub fn generate_id(prefix: &str) -> Result<String, CoreError> {
    let mut buf = [0u8; 4];
    getrandom::fill(&mut buf).map_err(|e| CoreError::IdGeneration(e.to_string()))?;
    let hex: String = buf.iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("{prefix}-{hex}"))
}

/// Check whether `id` is a well-formed ID with the given prefix.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
