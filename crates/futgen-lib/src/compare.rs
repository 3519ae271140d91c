//! Comparison of generated configuration against a recorded baseline.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::assembler::TestConfigs;
use crate::error::{FutgenError, Result};
use crate::generator::ParamSet;

/// Differences for one test case present on both sides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseDelta {
    pub name: String,
    pub generated_rows: usize,
    pub baseline_rows: usize,
    /// Keys used by baseline rows but by no generated row.
    pub missing_keys: Vec<String>,
    /// Keys used by generated rows but by no baseline row.
    pub extra_keys: Vec<String>,
    /// Row positions whose parameter sets differ, including unmatched tail rows.
    pub differing_rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    /// Test cases only in the baseline.
    pub missing: Vec<String>,
    /// Test cases only in the generated output.
    pub extra: Vec<String>,
    pub cases: Vec<CaseDelta>,
}

impl Comparison {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.cases.is_empty()
    }
}

/// Load a recorded configuration (test-case name to list of parameter objects).
pub fn load_baseline(path: &Path) -> Result<TestConfigs> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| FutgenError::Json(format!("{}: {e}", path.display())))
}

pub fn compare(generated: &TestConfigs, baseline: &TestConfigs) -> Comparison {
    let mut result = Comparison {
        missing: baseline
            .keys()
            .filter(|k| !generated.contains_key(*k))
            .cloned()
            .collect(),
        extra: generated
            .keys()
            .filter(|k| !baseline.contains_key(*k))
            .cloned()
            .collect(),
        cases: Vec::new(),
    };
    for (name, gen_rows) in generated {
        let Some(base_rows) = baseline.get(name) else {
            continue;
        };
        let (gen_keys, base_keys) = (key_set(gen_rows), key_set(base_rows));
        let delta = CaseDelta {
            name: name.clone(),
            generated_rows: gen_rows.len(),
            baseline_rows: base_rows.len(),
            missing_keys: base_keys.difference(&gen_keys).cloned().collect(),
            extra_keys: gen_keys.difference(&base_keys).cloned().collect(),
            differing_rows: (0..gen_rows.len().max(base_rows.len()))
                .filter(|&i| gen_rows.get(i) != base_rows.get(i))
                .collect(),
        };
        if !delta.differing_rows.is_empty() || !delta.missing_keys.is_empty() || !delta.extra_keys.is_empty() {
            result.cases.push(delta);
        }
    }
    result
}

fn key_set(rows: &[ParamSet]) -> BTreeSet<String> {
    rows.iter().flat_map(|r| r.keys().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn configs(v: Value) -> TestConfigs {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn identical_is_clean() {
        let c = configs(json!({"a": [{"x": 1}], "b": []}));
        assert!(compare(&c, &c).is_clean());
    }

    #[test]
    fn reports_missing_and_extra_cases() {
        let generated = configs(json!({"a": [], "new": []}));
        let baseline = configs(json!({"a": [], "old": []}));
        let cmp = compare(&generated, &baseline);
        assert_eq!(cmp.missing, vec!["old"]);
        assert_eq!(cmp.extra, vec!["new"]);
        assert!(cmp.cases.is_empty());
    }

    #[test]
    fn reports_key_and_row_deltas() {
        let generated = configs(json!({"a": [{"x": 1, "enc": "WPA2"}, {"x": 2, "enc": "WPA2"}]}));
        let baseline = configs(json!({"a": [{"x": 1, "psk": "p"}, {"x": 2, "psk": "p"}, {"x": 3, "psk": "p"}]}));
        let cmp = compare(&generated, &baseline);
        assert_eq!(
            cmp.cases,
            vec![CaseDelta {
                name: "a".into(),
                generated_rows: 2,
                baseline_rows: 3,
                missing_keys: vec!["psk".into()],
                extra_keys: vec!["enc".into()],
                differing_rows: vec![0, 1, 2],
            }]
        );
    }

    #[test]
    fn load_baseline_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PP203X_def.json");
        std::fs::write(&path, r#"{"a": [{"x": 1}]}"#).unwrap();
        let baseline = load_baseline(&path).unwrap();
        assert_eq!(baseline["a"][0]["x"], json!(1));

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(load_baseline(&path), Err(FutgenError::Json(_))));
    }
}
