// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sha2::{Digest, Sha256};

use ot_core::LOCAL_ID_PREFIX;

/// Prefix of pending operation ids.
pub const OP_ID_PREFIX: &str = "op";

/// Generate an ID from prefix, seed text, and millisecond timestamp.
/// Format: {prefix}-{hash} where hash is first 8 hex chars of SHA256(seed + timestamp)
pub fn generate_id(prefix: &str, seed: &str, stamp_ms: i64) -> String {
    let input = format!("{seed}{stamp_ms}");
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]); // First 8 hex chars (4 bytes)
    format!("{prefix}-{short_hash}")
}

/// Generate a unique ID, handling collisions by appending incrementing suffix.
pub fn generate_unique_id<F>(prefix: &str, seed: &str, stamp_ms: i64, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_id(prefix, seed, stamp_ms);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{base_id}-{suffix}");
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

/// Id for a record created while offline: `LOCAL-xxxxxxxx`.
pub fn local_id<F>(seed: &str, stamp_ms: i64, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    generate_unique_id(LOCAL_ID_PREFIX.trim_end_matches('-'), seed, stamp_ms, exists)
}

/// Placeholder display key for a local id: `LOCAL-XXXXXXXX`.
pub fn local_key(local_id: &str) -> String {
    match local_id.strip_prefix(LOCAL_ID_PREFIX) {
        Some(rest) => format!("{LOCAL_ID_PREFIX}{}", rest.to_uppercase()),
        None => local_id.to_uppercase(),
    }
}

/// Id for a pending operation: `op-xxxxxxxx`.
pub fn operation_id<F>(entity_id: &str, stamp_ms: i64, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    generate_unique_id(OP_ID_PREFIX, entity_id, stamp_ms, exists)
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
