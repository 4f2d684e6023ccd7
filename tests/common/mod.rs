#![allow(dead_code)]

use std::path::Path;

use ci_orchestrator::report::local_report_path;
use serde_json::Value;

/// Report JSON persisted by a global context teardown.
pub fn read_report(root: &Path, branch: &str, revision: &str) -> Value {
    let path = local_report_path(root, branch, revision);
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("report {} not readable: {e}", path.display()));
    serde_json::from_str(&contents).expect("report is valid JSON")
}

pub fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("JSON array")
        .iter()
        .map(|v| v.as_str().expect("JSON string").to_string())
        .collect()
}
