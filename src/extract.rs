//! Extraction of response values into variables
//!
//! Paths are dotted field names with optional array indexes, e.g.
//! `data.token` or `data.list[0].id`. Keys containing dots are not supported.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::ExtractRule;

/// Follow `path` through `root`.
pub fn extract_value(root: &Value, path: &str) -> Option<String> {
    let mut current = root;
    for segment in path.split('.') {
        match segment.split_once('[') {
            Some((name, rest)) => {
                let index: usize = rest.trim_end_matches(']').parse().unwrap_or(0);
                if !name.is_empty() {
                    current = current.get(name)?;
                }
                current = current.as_array()?.get(index)?;
            }
            None => current = current.get(segment)?,
        }
    }

    Some(match current {
        Value::String(s) => s.clone(),
        // containers as compact JSON
        other => other.to_string(),
    })
}

/// Apply every complete rule to a JSON body, returning variable → value.
///
/// A body that is not JSON yields an empty map.
pub fn apply_rules(body: &str, rules: &[ExtractRule]) -> HashMap<String, String> {
    let mut extracted = HashMap::new();
    if rules.is_empty() || body.trim().is_empty() {
        return extracted;
    }
    let root: Value = match serde_json::from_str(body) {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!(error = %e, "Response is not JSON, skipping extraction");
            return extracted;
        }
    };

    for rule in rules {
        if rule.variable.trim().is_empty() || rule.path.trim().is_empty() {
            continue;
        }
        if let Some(value) = extract_value(&root, rule.path.trim()) {
            extracted.insert(rule.variable.clone(), value);
        }
    }
    tracing::debug!(count = extracted.len(), "Extracted variables");
    extracted
}
