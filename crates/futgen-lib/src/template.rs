//! Test templates: loading, layering and parsing.
//!
//! Template documents are JSON files named `<MODULE>_inputs.json`, each an
//! object mapping test-case names to template records:
//!
//! ```json
//! { "wm2_set_bcn_int": {
//!     "args_mapping": ["channel", "ht_mode", "radio_band", "bcn_int"],
//!     "inputs": [[6, "HT40", "24g", [100, 200]]],
//!     "expand_permutations": true,
//!     "default": {"if_type": "vif"},
//!     "xfail": {"inputs": [[6, "HT40", "24g", 200]], "msg": "flaky"} } }
//! ```
//!
//! Documents are read from `generic/`, `platform/<vendor>/` and
//! `model/<MODEL>/` under the template root. Within one layer, files merge
//! shallowly (last file wins per test case). Across layers a later layer's
//! `inputs` replace, `additional_inputs` append, `default` merges key-wise
//! and every other key is overwritten.
//!
//! [`TestTemplate::parse`] turns one merged record into closed variants
//! (scalar, tuple, token, mixed dict) once, at load time.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FutgenError, Result};
use crate::roles::{RoleToken, Scope, TOKEN_PREFIX};

/// File suffix of template documents.
pub const INPUTS_SUFFIX: &str = "_inputs.json";

// ── Parsed template ──

/// One cell of a tuple-shaped input row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    /// End-inclusive integer range, written `{"range": [a, b]}`.
    Range(i64, i64),
    Token(RoleToken),
}

/// One entry of a template's `inputs` list.
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    /// A bare scalar, treated as a one-column row.
    Scalar(Value),
    /// A row positionally aligned to `args_mapping`.
    Tuple(Vec<Cell>),
    /// A bare role token, expanded to one keyed row per interface.
    Token(RoleToken),
    /// A keyed row, optionally carrying one scoped role token.
    Mixed {
        values: Map<String, Value>,
        token: Option<RoleToken>,
    },
}

/// Pytest-style row marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Skip,
    Xfail,
}

impl Flag {
    pub fn key(self) -> &'static str {
        match self {
            Flag::Skip => "skip",
            Flag::Xfail => "xfail",
        }
    }

    pub fn default_msg(self) -> String {
        let upper = self.key().to_uppercase();
        format!("{upper}: Uncommented {upper}")
    }
}

/// A `skip`/`xfail`/`ignore` entry. Without `inputs` it applies to every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlagRule {
    pub inputs: Option<Vec<Value>>,
    pub msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestTemplate {
    pub name: String,
    pub default: Map<String, Value>,
    pub args_mapping: Vec<String>,
    pub inputs: Vec<InputItem>,
    pub additional_inputs: Vec<InputItem>,
    pub ignore: Vec<FlagRule>,
    pub marks: Vec<(Flag, FlagRule)>,
    pub expand_permutations: bool,
    pub do_not_sort: bool,
}

#[derive(Debug, Deserialize)]
struct RawTemplate {
    #[serde(default)]
    default: Map<String, Value>,
    #[serde(default)]
    args_mapping: Vec<String>,
    inputs: Option<Vec<Value>>,
    #[serde(default)]
    additional_inputs: Vec<Value>,
    ignore: Option<Value>,
    skip: Option<Value>,
    xfail: Option<Value>,
    #[serde(default)]
    expand_permutations: bool,
    #[serde(default)]
    do_not_sort: bool,
}

impl TestTemplate {
    /// Parse a merged template record.
    ///
    /// Missing `inputs` means a single empty keyed row. Inputs are sorted
    /// canonically unless `do_not_sort` is set. `ignore` entries that name
    /// role tokens are matched here, against the unresolved inputs.
    pub fn parse(name: &str, record: &Value) -> Result<TestTemplate> {
        let raw: RawTemplate = serde_json::from_value(record.clone())
            .map_err(|e| FutgenError::Template(format!("{name}: {e}")))?;

        let mut inputs = raw.inputs.unwrap_or_else(|| vec![Value::Object(Map::new())]);
        if !raw.do_not_sort {
            inputs.sort_by(canonical_cmp);
        }

        let (token_ignores, ignore): (Vec<FlagRule>, Vec<FlagRule>) = parse_rules(raw.ignore)?
            .into_iter()
            .partition(|r| r.inputs.as_ref().is_some_and(|i| i.iter().any(contains_token)));
        for rule in &token_ignores {
            let before = inputs.len();
            inputs.retain(|item| !rule.matches_value(item));
            log::debug!(
                "{name}: ignore removed {} token input(s)",
                before - inputs.len()
            );
        }

        let mut marks = Vec::new();
        for (flag, value) in [(Flag::Skip, raw.skip), (Flag::Xfail, raw.xfail)] {
            marks.extend(parse_rules(value)?.into_iter().map(|r| (flag, r)));
        }

        Ok(TestTemplate {
            name: name.to_string(),
            default: raw.default,
            args_mapping: raw.args_mapping,
            inputs: inputs.iter().map(parse_item).collect::<Result<_>>()?,
            additional_inputs: raw
                .additional_inputs
                .iter()
                .map(parse_item)
                .collect::<Result<_>>()?,
            ignore,
            marks,
            expand_permutations: raw.expand_permutations,
            do_not_sort: raw.do_not_sort,
        })
    }

    /// Message of an `ignore` entry without `inputs`, which disables the
    /// whole test case.
    pub fn whole_case_ignore(&self) -> Option<String> {
        self.ignore
            .iter()
            .find(|r| r.inputs.is_none())
            .map(|r| r.msg.clone().unwrap_or_else(|| "IGNORE: Uncommented IGNORE".into()))
    }
}

impl FlagRule {
    /// Exact match against a raw template value; scalars compare as one-column rows.
    pub fn matches_value(&self, value: &Value) -> bool {
        self.inputs
            .as_ref()
            .is_some_and(|inputs| {
                inputs.iter().any(|i| {
                    i == value || matches!(i, Value::Array(one) if one.len() == 1 && &one[0] == value)
                })
            })
    }
}

fn parse_rules(value: Option<Value>) -> Result<Vec<FlagRule>> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(entry @ Value::Object(_)) => vec![entry],
        Some(other) => {
            return Err(FutgenError::Template(format!(
                "flag entry must be an object or a list of objects, got {other}"
            )));
        }
    };
    entries
        .into_iter()
        .map(|entry| {
            let mut entry = match entry {
                Value::Object(entry) => entry,
                other => {
                    return Err(FutgenError::Template(format!(
                        "flag entry must be an object, got {other}"
                    )));
                }
            };
            let inputs = match (entry.remove("inputs"), entry.remove("input")) {
                (Some(Value::Array(items)), _) => Some(items),
                (Some(other), _) => {
                    return Err(FutgenError::Template(format!(
                        "flag inputs must be a list, got {other}"
                    )));
                }
                (None, Some(single)) => Some(vec![single]),
                (None, None) => None,
            };
            let msg = entry.remove("msg").and_then(|m| m.as_str().map(str::to_string));
            Ok(FlagRule { inputs, msg })
        })
        .collect()
}

fn contains_token(value: &Value) -> bool {
    match value {
        Value::String(s) => s.starts_with(TOKEN_PREFIX),
        Value::Array(items) => items.iter().any(contains_token),
        Value::Object(map) => map.keys().any(|k| k.starts_with(TOKEN_PREFIX)),
        _ => false,
    }
}

fn parse_item(value: &Value) -> Result<InputItem> {
    match value {
        Value::String(s) => Ok(match RoleToken::parse(s)? {
            Some(token) => InputItem::Token(token),
            None => InputItem::Scalar(value.clone()),
        }),
        Value::Array(cells) => Ok(InputItem::Tuple(
            cells.iter().map(parse_cell).collect::<Result<_>>()?,
        )),
        Value::Object(map) => {
            let mut values = Map::new();
            let mut token = None;
            for (key, v) in map {
                let Some(parsed) = RoleToken::parse(key)? else {
                    values.insert(key.clone(), v.clone());
                    continue;
                };
                if token.is_some() {
                    return Err(FutgenError::Template(format!(
                        "more than one role token in input {value}"
                    )));
                }
                token = Some(match v.as_str() {
                    Some(scope) => parsed.with_scope(Scope::parse(scope)?),
                    None => parsed,
                });
            }
            Ok(InputItem::Mixed { values, token })
        }
        scalar => Ok(InputItem::Scalar(scalar.clone())),
    }
}

fn parse_cell(value: &Value) -> Result<Cell> {
    if let Value::String(s) = value
        && let Some(token) = RoleToken::parse(s)?
    {
        return Ok(Cell::Token(token));
    }
    if let Some(bounds) = value.as_object().and_then(|o| o.get("range")) {
        let pair = bounds
            .as_array()
            .filter(|b| b.len() == 2)
            .and_then(|b| Some((b[0].as_i64()?, b[1].as_i64()?)));
        return match pair {
            Some((lo, hi)) if lo <= hi => Ok(Cell::Range(lo, hi)),
            _ => Err(FutgenError::Template(format!(
                "range must be [low, high] integers, got {bounds}"
            ))),
        };
    }
    Ok(Cell::Value(value.clone()))
}

// ── Ordering ──

/// Total order over JSON values: null < bool < number < string < array < object.
pub fn canonical_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(p, q)| canonical_cmp(p, q))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .zip(y)
            .map(|((kp, vp), (kq, vq))| kp.cmp(kq).then_with(|| canonical_cmp(vp, vq)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ── Documents and layers ──

/// Merged template records for every test case, keyed by test-case name.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    cases: BTreeMap<String, Value>,
}

impl TemplateSet {
    pub fn from_cases(cases: BTreeMap<String, Value>) -> Self {
        TemplateSet { cases }
    }

    /// Load `generic/`, `platform/<vendor>/` and `model/<MODEL>/` under `root`.
    ///
    /// Missing layer directories are skipped. `modules` restricts each layer
    /// to `<MODULE>_inputs.json` files.
    pub fn load(
        root: &Path,
        vendor: Option<&str>,
        model: &str,
        modules: Option<&[String]>,
    ) -> Result<Self> {
        let mut layers = vec![root.join("generic")];
        if let Some(vendor) = vendor {
            layers.push(root.join("platform").join(vendor));
        }
        layers.push(root.join("model").join(model_dir_name(model)));

        let mut merged = Map::new();
        for dir in &layers {
            let layer = load_layer(dir, modules)?;
            if !layer.is_empty() {
                log::debug!("loaded {} test case(s) from {}", layer.len(), dir.display());
            }
            merge_layers(&mut merged, layer);
        }
        Ok(TemplateSet {
            cases: merged.into_iter().collect(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cases.get(name)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Model directory name: uppercase, `-` replaced by `_`.
pub fn model_dir_name(model: &str) -> String {
    model.to_uppercase().replace('-', "_")
}

/// Load and shallow-merge all template documents in one directory.
pub fn load_layer(dir: &Path, modules: Option<&[String]>) -> Result<Map<String, Value>> {
    let mut merged = Map::new();
    if !dir.is_dir() {
        return Ok(merged);
    }
    let files = match modules {
        Some(modules) => modules
            .iter()
            .map(|m| dir.join(format!("{m}{INPUTS_SUFFIX}")))
            .filter(|p| p.is_file())
            .collect(),
        None => {
            let mut files: Vec<_> = std::fs::read_dir(dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(INPUTS_SUFFIX))
                })
                .collect();
            files.sort();
            files
        }
    };
    for path in files {
        let contents = std::fs::read_to_string(&path)?;
        let doc: Value = serde_json::from_str(&contents)
            .map_err(|e| FutgenError::Json(format!("{}: {e}", path.display())))?;
        let Value::Object(cases) = doc else {
            return Err(FutgenError::Json(format!(
                "{}: template document must be an object",
                path.display()
            )));
        };
        merged.extend(cases);
    }
    Ok(merged)
}

/// Apply a later layer on top of `base`.
///
/// Test cases are merged field by field. `additional_inputs` rows are
/// appended and `default` keys are overlaid, while every other field,
/// `inputs` and flag lists included, is replaced wholesale by the later
/// layer. This is not a deep additive merge: a model layer that sets
/// `inputs` drops the generic rows instead of adding to them, and two
/// `skip` lists do not combine.
pub fn merge_layers(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (name, record) in overlay {
        match (base.get_mut(&name), record) {
            (Some(Value::Object(existing)), Value::Object(record)) => {
                for (key, value) in record {
                    let replace = match (key.as_str(), existing.get_mut(&key), value) {
                        ("additional_inputs", Some(Value::Array(acc)), Value::Array(more)) => {
                            acc.extend(more);
                            None
                        }
                        ("default", Some(Value::Object(acc)), Value::Object(more)) => {
                            acc.extend(more);
                            None
                        }
                        (_, _, value) => Some(value),
                    };
                    if let Some(value) = replace {
                        existing.insert(key, value);
                    }
                }
            }
            (_, record) => {
                base.insert(name, record);
            }
        }
    }
}
