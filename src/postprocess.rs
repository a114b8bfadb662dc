//! Response post-processing for display: JSON pretty-printing and variable
//! extraction

use std::collections::HashMap;

use crate::extract::apply_rules;
use crate::models::{ExtractRule, ResponseResult};

/// Pretty-print a JSON object or array body; anything else is returned as-is.
pub fn prettify(body: &str) -> String {
    let trimmed = body.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return body.to_string();
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

/// Extract variables from a 2xx response and pretty-print its text body.
///
/// Extraction runs on the body as received, before formatting.
pub fn finish(
    mut response: ResponseResult,
    rules: &[ExtractRule],
) -> (ResponseResult, HashMap<String, String>) {
    let extracted = if response.is_success() {
        apply_rules(&response.text_body, rules)
    } else {
        HashMap::new()
    };
    response.text_body = prettify(&response.text_body);
    (response, extracted)
}
