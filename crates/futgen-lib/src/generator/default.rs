//! The default generation pipeline.
//!
//! Stages, in order:
//!
//! 1. template inputs become [`Draft`] rows (a module pass may resolve
//!    role tokens at this point),
//! 2. [`Batch::prepare`] concretizes cells, resolves `if_role` columns and
//!    expands permutations into [`Row`]s,
//! 3. [`finish`] inserts implicit encryption, drops rows the devices or the
//!    rule table cannot realize, applies `ignore`, zips rows with
//!    `args_mapping`, sets `skip`/`xfail` marks, lays `default` underneath
//!    and appends `additional_inputs`.

use serde_json::{Map, Value};

use super::{Device, GenContext, ParamSet};
use crate::error::{FutgenError, Result};
use crate::expand::{expand, list_positions};
use crate::regulatory::RegulatoryError;
use crate::roles::{InterfaceRole, RoleError, RoleToken};
use crate::template::{Cell, InputItem, TestTemplate};
use crate::wifi::{
    ENCRYPTION_KEY, Encryption, HT_MODE_KEY, HtMode, RADIO_BAND_KEYWORDS, RadioBand,
    channel_column, is_reference_column,
};

/// Generate a test case with no module-specific pass.
pub fn default_gen(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    run(ctx, template, Batch::from_template(template))
}

/// Prepare and finish a batch with the template's own expansion setting.
pub(crate) fn run(ctx: &GenContext<'_>, template: &TestTemplate, batch: Batch) -> Result<Vec<ParamSet>> {
    let prepared = batch.prepare(ctx, template.expand_permutations)?;
    finish(ctx, template, prepared)
}

// ── Drafts ──

/// A row that may still hold role tokens.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Draft {
    Cells(Vec<Cell>),
    Keyed {
        values: Map<String, Value>,
        token: Option<RoleToken>,
    },
    Token(RoleToken),
}

impl Draft {
    pub(crate) fn keyed(values: Map<String, Value>) -> Draft {
        Draft::Keyed {
            values,
            token: None,
        }
    }

    fn from_item(item: &InputItem) -> Draft {
        match item {
            InputItem::Scalar(v) => Draft::Cells(vec![Cell::Value(v.clone())]),
            InputItem::Tuple(cells) => Draft::Cells(cells.clone()),
            InputItem::Token(t) => Draft::Token(*t),
            InputItem::Mixed { values, token } => Draft::Keyed {
                values: values.clone(),
                token: *token,
            },
        }
    }
}

/// Draft rows of one test case.
#[derive(Debug, Clone)]
pub(crate) struct Batch {
    pub name: String,
    pub args_mapping: Vec<String>,
    pub inputs: Vec<Draft>,
    pub additional: Vec<Draft>,
}

impl Batch {
    pub(crate) fn from_template(template: &TestTemplate) -> Batch {
        Batch {
            name: template.name.clone(),
            args_mapping: template.args_mapping.clone(),
            inputs: template.inputs.iter().map(Draft::from_item).collect(),
            additional: template
                .additional_inputs
                .iter()
                .map(Draft::from_item)
                .collect(),
        }
    }

    /// Concretize drafts into rows. Fails on any token left unresolved.
    pub(crate) fn prepare(self, ctx: &GenContext<'_>, expand_permutations: bool) -> Result<Prepared> {
        let Batch {
            name,
            mut args_mapping,
            inputs,
            additional,
        } = self;
        let mut rows = concretize(&name, inputs, expand_permutations)?;
        let mut extra = concretize(&name, additional, false)?;

        if args_mapping.iter().any(|k| k == "if_role") {
            rows = resolve_if_roles(ctx, &name, &args_mapping, rows)?;
            extra = resolve_if_roles(ctx, &name, &args_mapping, extra)?;
            if !args_mapping.iter().any(|k| k == "if_name" || k == "if_type") {
                args_mapping.extend(["if_name".to_string(), "if_type".to_string()]);
            }
        }

        if expand_permutations {
            rows = rows
                .into_iter()
                .flat_map(|row| match row {
                    Row::Positional(cells) => expand(&cells, &list_positions(&cells))
                        .map(Row::Positional)
                        .collect::<Vec<_>>(),
                    keyed => vec![keyed],
                })
                .collect();
        }

        Ok(Prepared {
            name,
            args_mapping,
            rows,
            additional: extra,
            implicit_from: None,
        })
    }
}

fn unresolved(name: &str, token: &RoleToken) -> FutgenError {
    FutgenError::Template(format!(
        "{name}: role token {token} is not handled by this test case's generator"
    ))
}

fn concretize(name: &str, drafts: Vec<Draft>, expanding: bool) -> Result<Vec<Row>> {
    drafts
        .into_iter()
        .map(|draft| match draft {
            Draft::Cells(cells) => cells
                .into_iter()
                .map(|cell| match cell {
                    Cell::Value(v) => Ok(v),
                    Cell::Range(lo, hi) if expanding => Ok(Value::Array((lo..=hi).map(Value::from).collect())),
                    Cell::Range(lo, hi) => Ok(Value::Array(vec![lo.into(), hi.into()])),
                    Cell::Token(t) => Err(unresolved(name, &t)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Row::Positional),
            Draft::Keyed {
                values,
                token: None,
            } => Ok(Row::Keyed(values)),
            Draft::Keyed { token: Some(t), .. } | Draft::Token(t) => Err(unresolved(name, &t)),
        })
        .collect()
}

/// Replace each row's `if_role` with one row per resolved interface,
/// appending the interface name and type.
fn resolve_if_roles(
    ctx: &GenContext<'_>,
    name: &str,
    args_mapping: &[String],
    rows: Vec<Row>,
) -> Result<Vec<Row>> {
    let role_idx = args_mapping.iter().position(|k| k == "if_role");
    let band_idx = args_mapping.iter().position(|k| k == "radio_band");
    let resolver = ctx.roles();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Row::Positional(cells) = row else {
            out.push(row);
            continue;
        };
        let role = match role_idx.and_then(|i| cells.get(i)) {
            Some(Value::String(s)) => InterfaceRole::parse(s)?,
            other => {
                return Err(FutgenError::Template(format!(
                    "{name}: if_role must be a string, got {}",
                    other.map_or_else(|| "nothing".to_string(), Value::to_string)
                )));
            }
        };
        let band = match band_idx.and_then(|i| cells.get(i)) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => {
                Some(RadioBand::parse(s).ok_or_else(|| RoleError::UnsupportedBand(s.clone()))?)
            }
            Some(other) => return Err(RoleError::UnsupportedBand(other.to_string()).into()),
        };
        let Some(interfaces) = resolver.resolve_role(role, band) else {
            log::debug!("{name}: role {} absent on DUT, dropping row", role.as_str());
            continue;
        };
        for iface in interfaces {
            let mut resolved = cells.clone();
            resolved.push(Value::String(iface.name));
            resolved.push(Value::String(iface.if_type.as_str().to_string()));
            out.push(Row::Positional(resolved));
        }
    }
    Ok(out)
}

// ── Rows ──

/// A concrete row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Row {
    /// Values aligned with `args_mapping`.
    Positional(Vec<Value>),
    /// Values already keyed by parameter name.
    Keyed(Map<String, Value>),
}

/// Column lookup shared by positional and keyed rows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Columns<'m>(&'m [String]);

impl Columns<'_> {
    /// Value of a column. JSON `null` counts as absent.
    pub(crate) fn get<'r>(&self, row: &'r Row, key: &str) -> Option<&'r Value> {
        let value = match row {
            Row::Positional(cells) => cells.get(self.0.iter().position(|k| k == key)?)?,
            Row::Keyed(map) => map.get(key)?,
        };
        (!value.is_null()).then_some(value)
    }

    pub(crate) fn has(&self, row: &Row, key: &str) -> bool {
        match row {
            Row::Positional(_) => self.0.iter().any(|k| k == key),
            Row::Keyed(map) => map.contains_key(key),
        }
    }
}

/// Concrete rows of one test case.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub name: String,
    pub args_mapping: Vec<String>,
    pub rows: Vec<Row>,
    pub additional: Vec<Row>,
    /// Mapping width before implicit columns were appended.
    implicit_from: Option<usize>,
}

impl Prepared {
    pub(crate) fn columns(&self) -> Columns<'_> {
        Columns(&self.args_mapping)
    }

    /// Keep the rows for which `keep` returns true. Errors abort.
    pub(crate) fn try_retain<F>(&mut self, mut keep: F) -> Result<()>
    where
        F: FnMut(Columns<'_>, &Row) -> Result<bool>,
    {
        let columns = Columns(&self.args_mapping);
        let rows = std::mem::take(&mut self.rows);
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if keep(columns, &row)? {
                kept.push(row);
            }
        }
        self.rows = kept;
        Ok(())
    }

    fn insert_implicit_encryption(&mut self) {
        let has = |key: &str| self.args_mapping.iter().any(|k| k == key);
        if has("radio_band") && !has(ENCRYPTION_KEY) {
            let band_idx = self.args_mapping.iter().position(|k| k == "radio_band");
            let width = self.args_mapping.len();
            self.args_mapping.push(ENCRYPTION_KEY.to_string());
            self.implicit_from = Some(width);
            for row in self.rows.iter_mut().chain(self.additional.iter_mut()) {
                if let Row::Positional(cells) = row
                    && cells.len() == width
                {
                    let enc = implied_encryption(band_idx.and_then(|i| cells.get(i)));
                    cells.push(enc);
                }
            }
        }
        for row in self.rows.iter_mut().chain(self.additional.iter_mut()) {
            if let Row::Keyed(map) = row
                && map.contains_key("radio_band")
                && !map.contains_key(ENCRYPTION_KEY)
            {
                let enc = implied_encryption(map.get("radio_band"));
                map.insert(ENCRYPTION_KEY.to_string(), enc);
            }
        }
    }

    fn check_widths(&self) -> Result<()> {
        for row in self.rows.iter().chain(&self.additional) {
            let Row::Positional(cells) = row else {
                continue;
            };
            if self.args_mapping.is_empty() {
                return Err(FutgenError::Template(format!(
                    "{}: positional input {} needs args_mapping",
                    self.name,
                    Value::Array(cells.clone())
                )));
            }
            if cells.len() != self.args_mapping.len() {
                return Err(FutgenError::Template(format!(
                    "{}: input {} has {} values, args_mapping has {}",
                    self.name,
                    Value::Array(cells.clone()),
                    cells.len(),
                    self.args_mapping.len()
                )));
            }
        }
        Ok(())
    }

    fn to_params(&self, default: &Map<String, Value>, row: &Row) -> ParamSet {
        let mut params: ParamSet = default.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        match row {
            Row::Positional(cells) => {
                for (key, value) in self.args_mapping.iter().zip(cells) {
                    params.insert(key.clone(), value.clone());
                }
            }
            Row::Keyed(map) => {
                for (key, value) in map {
                    params.insert(key.clone(), value.clone());
                }
            }
        }
        params
    }
}

fn implied_encryption(band: Option<&Value>) -> Value {
    let enc = band
        .and_then(Value::as_str)
        .and_then(RadioBand::parse)
        .map_or(Encryption::Wpa2, RadioBand::default_encryption);
    Value::String(enc.as_str().to_string())
}

/// Whether a flag pattern selects a row.
///
/// Positional rows match a list pattern exactly, or on the columns that
/// precede implicitly appended ones. Keyed rows match an object pattern
/// when every pattern key has the same value in the row.
fn row_matches(row: &Row, pattern: &Value, implicit_from: Option<usize>) -> bool {
    let cells_match = |cells: &[Value], want: &[Value]| {
        cells == want || implicit_from.is_some_and(|n| want.len() == n && cells.get(..n) == Some(want))
    };
    match (row, pattern) {
        (Row::Keyed(map), Value::Object(sub)) => sub.iter().all(|(k, v)| map.get(k) == Some(v)),
        (Row::Keyed(_), _) | (Row::Positional(_), Value::Object(_)) => false,
        (Row::Positional(cells), Value::Array(want)) => cells_match(cells.as_slice(), want.as_slice()),
        (Row::Positional(cells), scalar) => cells_match(cells.as_slice(), std::slice::from_ref(scalar)),
    }
}

// ── Filters ──

const UNII_4_CHANNELS: [u32; 4] = [169, 173, 177, 181];
const UNII_4_HT160_CHANNELS: [u32; 4] = [149, 153, 157, 161];

fn is_unii_4_combination(band: RadioBand, channel: u32, ht_mode: HtMode) -> bool {
    matches!(band, RadioBand::Band5g | RadioBand::Band5gu)
        && (UNII_4_CHANNELS.contains(&channel)
            || (channel == 165 && ht_mode != HtMode::Ht20)
            || (UNII_4_HT160_CHANNELS.contains(&channel) && ht_mode == HtMode::Ht160))
}

/// Band, bandwidth, regulatory and UNII-4 checks for every band column of a row.
fn row_supported(ctx: &GenContext<'_>, name: &str, columns: Columns<'_>, row: &Row) -> Result<bool> {
    for key in RADIO_BAND_KEYWORDS {
        let Some(value) = columns.get(row, key) else {
            continue;
        };
        let Some(band) = value.as_str().and_then(RadioBand::parse) else {
            log::debug!("{name}: unknown radio band {value}, dropping row");
            return Ok(false);
        };
        let device = if is_reference_column(key) {
            Device::Leaf
        } else {
            Device::Gw
        };
        if !ctx.check_band_compatible(band, device) {
            return Ok(false);
        }

        let ht_mode = match columns.get(row, HT_MODE_KEY) {
            None => HtMode::Ht20,
            Some(v) => v.as_str().and_then(HtMode::parse).ok_or_else(|| {
                RegulatoryError::InvalidArgument(format!("{name}: bandwidth mode {v}"))
            })?,
        };
        if !ctx.check_ht_mode_band_support(band, ht_mode, device) {
            return Ok(false);
        }

        let Some(channel) = columns.get(row, &channel_column(key)) else {
            continue;
        };
        let Some(channel) = channel.as_u64().and_then(|c| u32::try_from(c).ok()) else {
            log::debug!("{name}: non-integer channel {channel}, dropping row");
            return Ok(false);
        };
        if !ctx.check_band_channel_compatible(band, channel, device, ht_mode)? {
            return Ok(false);
        }
        if !ctx.unii_4_capable() && is_unii_4_combination(band, channel, ht_mode) {
            log::debug!("{name}: UNII-4 combination {channel}/{ht_mode} on {band}, dropping row");
            return Ok(false);
        }
    }
    Ok(true)
}

// ── Finish ──

/// Filter, map and decorate prepared rows into parameter sets.
pub(crate) fn finish(ctx: &GenContext<'_>, template: &TestTemplate, mut prepared: Prepared) -> Result<Vec<ParamSet>> {
    prepared.insert_implicit_encryption();
    prepared.check_widths()?;

    let name = prepared.name.clone();
    let before = prepared.rows.len();
    prepared.try_retain(|columns, row| row_supported(ctx, &name, columns, row))?;
    if prepared.rows.len() != before {
        log::debug!(
            "{name}: pruned {} of {before} row(s) unsupported by the testbed",
            before - prepared.rows.len()
        );
    }

    let implicit_from = prepared.implicit_from;
    for rule in &template.ignore {
        let Some(patterns) = &rule.inputs else {
            continue;
        };
        let before = prepared.rows.len();
        prepared
            .rows
            .retain(|row| !patterns.iter().any(|p| row_matches(row, p, implicit_from)));
        if let Some(msg) = &rule.msg {
            log::debug!(
                "{name}: ignoring {} row(s): {msg}",
                before - prepared.rows.len()
            );
        }
    }

    let mut configs = Vec::with_capacity(prepared.rows.len() + prepared.additional.len());
    for row in &prepared.rows {
        let mut params = prepared.to_params(&template.default, row);
        for (flag, rule) in &template.marks {
            let hit = rule.inputs.as_ref().is_none_or(|patterns| {
                patterns.iter().any(|p| row_matches(row, p, implicit_from))
            });
            if hit {
                params.insert(flag.key().to_string(), Value::Bool(true));
                params.insert(
                    format!("{}_msg", flag.key()),
                    Value::String(rule.msg.clone().unwrap_or_else(|| flag.default_msg())),
                );
            }
        }
        configs.push(params);
    }
    for row in &prepared.additional {
        configs.push(prepared.to_params(&template.default, row));
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::generator::GenType;
    use crate::generator::testutil::{dut, leaf, validator};

    fn gen_with(template: Value) -> Result<Vec<ParamSet>> {
        let (v, gw, leaf) = (validator(), dut(), leaf());
        let ctx = GenContext::new(&gw, &leaf, &v, GenType::Optimized)?;
        let t = TestTemplate::parse("case", &template)?;
        default_gen(&ctx, &t)
    }

    fn gen_rows(template: Value) -> Vec<ParamSet> {
        gen_with(template).unwrap()
    }

    fn params(v: Value) -> ParamSet {
        serde_json::from_value(v).unwrap()
    }

    // ── Expansion and mapping ──

    #[test]
    fn expands_list_cell_and_inserts_encryption() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band", "bcn_int"],
            "inputs": [[6, "HT40", "24g", [100, 200, 400]]],
            "expand_permutations": true
        }));
        let intervals: Vec<_> = out.iter().map(|p| p["bcn_int"].clone()).collect();
        assert_eq!(intervals, vec![json!(100), json!(200), json!(400)]);
        assert!(out.iter().all(|p| p["encryption"] == json!("WPA2")));
    }

    #[test]
    fn lists_stay_lists_without_expansion() {
        let out = gen_rows(json!({
            "args_mapping": ["ssids"],
            "inputs": [[["a", "b"]]]
        }));
        assert_eq!(out, vec![params(json!({"ssids": ["a", "b"]}))]);
    }

    #[test]
    fn range_cells_expand_end_inclusive() {
        let out = gen_rows(json!({
            "args_mapping": ["tx_power"],
            "inputs": [[{"range": [1, 3]}]],
            "expand_permutations": true
        }));
        assert_eq!(out.len(), 3);
        assert_eq!(out[2]["tx_power"], json!(3));
    }

    #[test]
    fn defaults_are_an_underlay() {
        let out = gen_rows(json!({
            "args_mapping": ["mtu"],
            "inputs": [1500],
            "default": {"mtu": 1000, "if_type": "eth"}
        }));
        assert_eq!(out, vec![params(json!({"mtu": 1500, "if_type": "eth"}))]);
    }

    #[test]
    fn missing_inputs_yield_defaults_row() {
        let out = gen_rows(json!({"default": {"timeout": 30}}));
        assert_eq!(out, vec![params(json!({"timeout": 30}))]);
    }

    #[test]
    fn row_width_mismatch_is_template_error() {
        let err = gen_with(json!({
            "args_mapping": ["a", "b"],
            "inputs": [[1, 2, 3]]
        }))
        .unwrap_err();
        assert!(matches!(err, FutgenError::Template(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn positional_row_without_mapping_is_template_error() {
        let err = gen_with(json!({"inputs": [[1, 2]]})).unwrap_err();
        assert!(matches!(err, FutgenError::Template(_)));
    }

    #[test]
    fn every_row_matches_mapping_width() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [[[1, 6, 11], ["HT20", "HT40"], "24g"]],
            "expand_permutations": true
        }));
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|p| p.len() == 4));
    }

    // ── Filters ──

    #[test]
    fn prunes_unsupported_band_channel_and_width() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [
                [6, "HT40", "24g"],
                [13, "HT20", "24g"],
                [6, "HT80", "24g"],
                [165, "HT40", "5gu"],
                [37, "HT20", "6g"],
                [6, "HT20", "60g"]
            ]
        }));
        assert_eq!(
            out,
            vec![params(json!({"channel": 6, "ht_mode": "HT40", "radio_band": "24g", "encryption": "WPA2"}))]
        );
    }

    #[test]
    fn surviving_rows_are_regulatory_sound() {
        let v = validator();
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [[[1, 6, 11, 36, 44, 60, 157, 165], ["HT20", "HT40", "HT80", "HT160"], ["24g", "5gl", "5gu"]]],
            "expand_permutations": true
        }));
        assert!(!out.is_empty());
        for p in &out {
            let ch = p["channel"].as_u64().unwrap() as u32;
            let ht = p["ht_mode"].as_str().unwrap();
            let band = p["radio_band"].as_str().unwrap();
            assert_eq!(v.validate(ch, ht, band, "US"), Ok(true), "{p:?}");
        }
    }

    #[test]
    fn unii_4_pruned_for_incapable_dut() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [[165, "HT20", "5gu"], [157, "HT160", "5gu"], [157, "HT80", "5gu"]]
        }));
        let kept: Vec<_> = out.iter().map(|p| (p["channel"].clone(), p["ht_mode"].clone())).collect();
        assert_eq!(
            kept,
            vec![(json!(157), json!("HT80")), (json!(165), json!("HT20"))]
        );
    }

    #[test]
    fn leaf_band_column_checks_reference_device() {
        let out = gen_rows(json!({
            "args_mapping": ["gw_radio_band", "leaf_radio_band"],
            "inputs": [["24g", "6g"], ["6g", "24g"]]
        }));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["leaf_radio_band"], json!("6g"));
    }

    #[test]
    fn null_band_skips_checks() {
        let out = gen_rows(json!({
            "args_mapping": ["radio_band", "x"],
            "inputs": [[null, 1]]
        }));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["encryption"], json!("WPA2"));
    }

    #[test]
    fn invalid_bandwidth_mode_is_case_local_error() {
        let err = gen_with(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [[6, "HT42", "24g"]]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            FutgenError::Regulatory(RegulatoryError::InvalidArgument(_))
        ));
        assert!(!err.is_fatal());
    }

    // ── if_role ──

    #[test]
    fn if_role_multiplies_and_appends_interface_columns() {
        let out = gen_rows(json!({
            "args_mapping": ["if_role", "radio_band"],
            "inputs": [["home_ap", "24g"], ["lan_interfaces", null], ["onboard_ap", "24g"]]
        }));
        assert_eq!(out.len(), 3);
        assert!(out.contains(&params(json!({
            "if_role": "home_ap", "radio_band": "24g", "if_name": "home-ap-24",
            "if_type": "vif", "encryption": "WPA2"
        }))));
        let eth: Vec<_> = out
            .iter()
            .filter(|p| p["if_type"] == json!("eth"))
            .map(|p| p["if_name"].clone())
            .collect();
        assert_eq!(eth, vec![json!("eth0"), json!("eth1")]);
    }

    #[test]
    fn unknown_if_role_is_role_error() {
        let err = gen_with(json!({
            "args_mapping": ["if_role"],
            "inputs": ["guest_ap"]
        }))
        .unwrap_err();
        assert!(matches!(err, FutgenError::Role(RoleError::UnsupportedToken(_))));
    }

    #[test]
    fn unresolved_token_in_default_pipeline_is_template_error() {
        let err = gen_with(json!({"inputs": ["FutGen|eth-interfaces"]})).unwrap_err();
        assert!(matches!(err, FutgenError::Template(_)));
    }

    // ── Flags ──

    #[test]
    fn ignore_removes_exactly_the_matching_row() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [[1, "HT20", "24g"], [6, "HT20", "24g"], [11, "HT20", "24g"]],
            "ignore": {"inputs": [[6, "HT20", "24g"]], "msg": "DFS wait"}
        }));
        let channels: Vec<_> = out.iter().map(|p| p["channel"].clone()).collect();
        assert_eq!(channels, vec![json!(1), json!(11)]);
    }

    #[test]
    fn ignore_also_matches_with_implicit_column() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [[1, "HT20", "24g"], [6, "HT20", "24g"]],
            "ignore": {"inputs": [[6, "HT20", "24g", "WPA2"]]}
        }));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn ignore_matches_keyed_sub_document() {
        let out = gen_rows(json!({
            "inputs": [{"a": 1, "b": 2}, {"a": 1, "b": 3}],
            "ignore": {"inputs": [{"b": 3}]}
        }));
        assert_eq!(out, vec![params(json!({"a": 1, "b": 2}))]);
    }

    #[test]
    fn xfail_marks_matching_rows_only() {
        let out = gen_rows(json!({
            "args_mapping": ["mtu"],
            "inputs": [1500, 9000],
            "xfail": {"inputs": [9000], "msg": "jumbo frames unsupported"}
        }));
        assert_eq!(out[0].get("xfail"), None);
        assert_eq!(out[1]["xfail"], json!(true));
        assert_eq!(out[1]["xfail_msg"], json!("jumbo frames unsupported"));
    }

    #[test]
    fn skip_without_inputs_marks_every_row() {
        let out = gen_rows(json!({
            "args_mapping": ["mtu"],
            "inputs": [1500, 9000],
            "skip": {}
        }));
        assert!(out.iter().all(|p| p["skip_msg"] == json!("SKIP: Uncommented SKIP")));
    }

    // ── additional_inputs ──

    #[test]
    fn additional_inputs_bypass_filters() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "ht_mode", "radio_band"],
            "inputs": [[13, "HT20", "24g"]],
            "additional_inputs": [[13, "HT20", "24g"]],
            "skip": {"msg": "not applied to curated rows"}
        }));
        assert_eq!(
            out,
            vec![params(json!({"channel": 13, "ht_mode": "HT20", "radio_band": "24g", "encryption": "WPA2"}))]
        );
    }

    #[test]
    fn additional_inputs_resolve_if_role() {
        let out = gen_rows(json!({
            "args_mapping": ["if_role"],
            "inputs": [],
            "additional_inputs": ["lan_bridge"]
        }));
        assert_eq!(
            out,
            vec![params(json!({"if_role": "lan_bridge", "if_name": "br-home", "if_type": "bridge"}))]
        );
    }

    #[test]
    fn row_matches_scalar_pattern() {
        let row = Row::Positional(vec![json!(9000)]);
        assert!(row_matches(&row, &json!(9000), None));
        assert!(row_matches(&row, &json!([9000]), None));
        assert!(!row_matches(&row, &json!({"mtu": 9000}), None));
    }

    #[test]
    fn unii_4_combinations() {
        assert!(is_unii_4_combination(RadioBand::Band5gu, 173, HtMode::Ht20));
        assert!(is_unii_4_combination(RadioBand::Band5g, 165, HtMode::Ht40));
        assert!(!is_unii_4_combination(RadioBand::Band5g, 165, HtMode::Ht20));
        assert!(is_unii_4_combination(RadioBand::Band5g, 153, HtMode::Ht160));
        assert!(!is_unii_4_combination(RadioBand::Band5gl, 173, HtMode::Ht20));
    }
}
