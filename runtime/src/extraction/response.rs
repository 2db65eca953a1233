//! Lenient parsing of the classification service's JSON answer.

use crate::types::TenantRecord;
use serde_json::Value;
use tracing::debug;

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Parse a model answer into tenant records.
///
/// An empty answer is an empty list, and so is valid JSON that is not an
/// array. Elements without a usable `name` (longer than one character after
/// trimming) or a non-empty `category` are dropped. `isAnchorTenant` is only
/// true for a JSON `true`.
pub fn parse_tenant_records(raw: &str) -> Result<Vec<TenantRecord>, serde_json::Error> {
    let cleaned = strip_code_blocks(raw);
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(cleaned)?;
    let Value::Array(items) = value else {
        debug!("classification answer is not an array");
        return Ok(Vec::new());
    };

    Ok(items.iter().filter_map(record_from_value).collect())
}

fn record_from_value(item: &Value) -> Option<TenantRecord> {
    let name = item.get("name")?.as_str()?.trim();
    if name.chars().count() <= 1 {
        return None;
    }
    let category = item.get("category")?.as_str()?.trim();
    if category.is_empty() {
        return None;
    }
    let subcategory = item
        .get("subcategory")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(TenantRecord {
        name: name.to_string(),
        category: category.to_string(),
        subcategory,
        is_anchor_tenant: matches!(item.get("isAnchorTenant"), Some(Value::Bool(true))),
    })
}
