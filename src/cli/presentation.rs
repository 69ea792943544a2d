//! CLI presentation: text and json formatters for pool and branch listings.

use crate::error::{LakeError, StorageError};
use crate::registry::{Branch, PoolConfig};
use comfy_table::Table;
use serde::Serialize;

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, LakeError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LakeError::Storage(StorageError::Serialization(e.to_string())))
}

pub fn format_pools(pools: &[PoolConfig], format: &str) -> Result<String, LakeError> {
    if format == "json" {
        return to_json(pools);
    }
    if pools.is_empty() {
        return Ok("No pools.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Name", "ID", "Created"]);
    for pool in pools {
        table.add_row(vec![
            pool.name.clone(),
            pool.id.to_string(),
            pool.created_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ]);
    }
    Ok(table.to_string())
}

/// Branch listing; `current` marks the HEAD branch.
pub fn format_branches(
    branches: &[Branch],
    current: Option<&str>,
    format: &str,
) -> Result<String, LakeError> {
    if format == "json" {
        return to_json(branches);
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["", "Branch", "Commit"]);
    for branch in branches {
        let marker = if Some(branch.name.as_str()) == current {
            "*"
        } else {
            ""
        };
        table.add_row(vec![
            marker.to_string(),
            branch.name.clone(),
            branch.commit.to_string(),
        ]);
    }
    Ok(table.to_string())
}
