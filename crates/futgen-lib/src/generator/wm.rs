//! Wireless manager test cases.
//!
//! Two kinds of generators live here. Channel sweeps (`wm2_set_bcn_int`,
//! `wm2_set_channel`, `wm2_set_ht_mode`, `wm2_ht_mode_and_channel_iteration`)
//! ignore template inputs and synthesize rows from the DUT's radios. The
//! rest take template rows, optionally expand them, and prune rows whose
//! bands or channels the testbed cannot realize.

use serde_json::{Map, Value};

use super::default::{Batch, Columns, Draft, Prepared, Row, finish, run};
use super::{Device, GenContext, GenType, ParamSet, skip_marker};
use crate::error::{FutgenError, Result};
use crate::template::{Cell, TestTemplate};
use crate::wifi::{HtMode, RadioBand};

// ── Channel maps ──

const SUGGESTED_6G: [u32; 14] = [5, 21, 37, 53, 69, 85, 101, 117, 133, 149, 165, 181, 197, 213];

const BEACON_INTERVALS: [u32; 3] = [100, 200, 400];

/// Spot-check channels per band.
pub fn minimal_channels(band: RadioBand) -> &'static [u32] {
    match band {
        RadioBand::Band24g => &[6],
        RadioBand::Band5g => &[44, 157],
        RadioBand::Band5gl => &[44],
        RadioBand::Band5gu => &[157],
        RadioBand::Band6g => &[5, 149],
    }
}

/// Broader channel subset per band.
pub fn suggested_channels(band: RadioBand) -> &'static [u32] {
    match band {
        RadioBand::Band24g => &[1, 6, 11],
        RadioBand::Band5g => &[44, 157],
        RadioBand::Band5gl => &[44, 60],
        RadioBand::Band5gu => &[108, 124, 140, 157],
        RadioBand::Band6g => &SUGGESTED_6G,
    }
}

fn channel_map(gen_type: GenType, band: RadioBand) -> &'static [u32] {
    match gen_type {
        GenType::Optimized => minimal_channels(band),
        GenType::Extended => suggested_channels(band),
    }
}

/// Candidates the DUT lists for the band and the rule table allows at `ht_mode`.
fn filter_supported_channels(
    ctx: &GenContext<'_>,
    band: RadioBand,
    candidates: &[u32],
    ht_mode: HtMode,
) -> Result<Vec<u32>> {
    let mut channels = Vec::with_capacity(candidates.len());
    for &channel in candidates {
        if ctx.check_band_channel_compatible(band, channel, Device::Gw, ht_mode)? {
            channels.push(channel);
        }
    }
    Ok(channels)
}

fn wifi_row(channel: u32, ht_mode: HtMode, band: RadioBand) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("channel".into(), channel.into());
    row.insert("ht_mode".into(), ht_mode.as_str().into());
    row.insert("radio_band".into(), band.as_str().into());
    row.insert("encryption".into(), band.default_encryption().as_str().into());
    row
}

/// Run synthesized rows through the default pipeline in place of template inputs.
fn synthesized(ctx: &GenContext<'_>, template: &TestTemplate, rows: Vec<Map<String, Value>>) -> Result<Vec<ParamSet>> {
    log::debug!("{}: synthesized {} row(s)", template.name, rows.len());
    let mut batch = Batch::from_template(template);
    batch.inputs = rows.into_iter().map(Draft::keyed).collect();
    run(ctx, template, batch)
}

// ── Synthesized sweeps ──

pub fn gen_set_bcn_int(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let ht_mode = HtMode::Ht40;
    let mut rows = Vec::new();
    for band in ctx.gw.supported_bands() {
        for channel in filter_supported_channels(ctx, band, channel_map(ctx.gen_type, band), ht_mode)? {
            for interval in BEACON_INTERVALS {
                let mut row = wifi_row(channel, ht_mode, band);
                row.insert("bcn_int".into(), interval.into());
                rows.push(row);
            }
        }
    }
    synthesized(ctx, template, rows)
}

pub fn gen_set_channel(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let ht_mode = HtMode::Ht40;
    let mut rows = Vec::new();
    for band in ctx.gw.supported_bands() {
        for channel in filter_supported_channels(ctx, band, channel_map(ctx.gen_type, band), ht_mode)? {
            rows.push(wifi_row(channel, ht_mode, band));
        }
    }
    synthesized(ctx, template, rows)
}

pub fn gen_set_ht_mode(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut rows = Vec::new();
    for band in ctx.gw.supported_bands() {
        let Some(max_width) = ctx.gw.max_channel_width(band) else {
            log::debug!("{}: no max channel width for {band}", template.name);
            continue;
        };
        for ht_mode in HtMode::up_to(max_width) {
            for channel in filter_supported_channels(ctx, band, channel_map(ctx.gen_type, band), ht_mode)? {
                rows.push(wifi_row(channel, ht_mode, band));
            }
        }
    }
    synthesized(ctx, template, rows)
}

/// Every supported channel at every bandwidth up to the band's maximum.
/// 6 GHz sweeps the suggested channel set instead of the full list.
pub fn gen_ht_mode_and_channel_iteration(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut rows = Vec::new();
    for band in ctx.gw.supported_bands() {
        let channels = match band {
            RadioBand::Band6g => SUGGESTED_6G.to_vec(),
            _ => ctx.gw.radio_channels(band).unwrap_or_default(),
        };
        let Some(max_width) = ctx.gw.max_channel_width(band) else {
            log::debug!("{}: no max channel width for {band}", template.name);
            continue;
        };
        for channel in channels {
            for ht_mode in HtMode::up_to(max_width) {
                if ctx.regulatory.validate_typed(channel, ht_mode, band, &ctx.domain)? {
                    rows.push(wifi_row(channel, ht_mode, band));
                }
            }
        }
    }
    synthesized(ctx, template, rows)
}

// ── Template-driven ──

/// Drop rows whose gw/leaf bands lack a radio, or whose gw/leaf channels
/// are not usable at HT20 on the row's band.
fn prune_incompatible(ctx: &GenContext<'_>, prepared: &mut Prepared) -> Result<()> {
    let before = prepared.rows.len();
    prepared.try_retain(|columns, row| compatible(ctx, columns, row))?;
    if prepared.rows.len() != before {
        log::debug!(
            "{}: pruned {} incompatible row(s)",
            prepared.name,
            before - prepared.rows.len()
        );
    }
    Ok(())
}

fn compatible(ctx: &GenContext<'_>, columns: Columns<'_>, row: &Row) -> Result<bool> {
    let band_of = |v: &Value| v.as_str().and_then(RadioBand::parse);
    for (key, device) in [("gw_radio_band", Device::Gw), ("leaf_radio_band", Device::Leaf)] {
        if let Some(value) = columns.get(row, key) {
            match band_of(value) {
                Some(band) if ctx.check_band_compatible(band, device) => {}
                _ => return Ok(false),
            }
        }
    }
    for (channel_key, band_key, device) in [
        ("gw_channel", "gw_radio_band", Device::Gw),
        ("leaf_channel", "leaf_radio_band", Device::Leaf),
    ] {
        let Some(channel) = columns.get(row, channel_key) else {
            continue;
        };
        let band = if columns.has(row, band_key) {
            columns.get(row, band_key)
        } else {
            columns.get(row, "radio_band")
        };
        let Some(band) = band else {
            continue;
        };
        let channel = channel.as_u64().and_then(|c| u32::try_from(c).ok());
        let (Some(band), Some(channel)) = (band_of(band), channel) else {
            return Ok(false);
        };
        if !ctx.check_band_channel_compatible(band, channel, device, HtMode::Ht20)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Prune, then finish. Expansion follows the template.
pub fn gen_pruned(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut prepared = Batch::from_template(template).prepare(ctx, template.expand_permutations)?;
    prune_incompatible(ctx, &mut prepared)?;
    finish(ctx, template, prepared)
}

/// WPA3 cases collapse to a skip marker on DUTs without an 11ax radio.
pub fn gen_wpa3(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    if !ctx.gw.supports_11ax() {
        log::warn!(
            "{}: {} does not support WPA3, skipping",
            template.name,
            ctx.gw.model()
        );
        return Ok(vec![skip_marker("NO-SUPPORT: Device does not support WPA3")]);
    }
    gen_pruned(ctx, template)
}

/// Always expand permutations, then prune.
pub fn gen_permuted(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    permuted(ctx, template, Batch::from_template(template))
}

fn permuted(ctx: &GenContext<'_>, template: &TestTemplate, batch: Batch) -> Result<Vec<ParamSet>> {
    let mut prepared = batch.prepare(ctx, true)?;
    prune_incompatible(ctx, &mut prepared)?;
    finish(ctx, template, prepared)
}

/// Negative bandwidth cases only run on bands narrower than 160 MHz.
pub fn gen_set_ht_mode_neg(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut prepared = Batch::from_template(template).prepare(ctx, template.expand_permutations)?;
    prepared.try_retain(|columns, row| {
        let max_width = columns
            .get(row, "radio_band")
            .and_then(Value::as_str)
            .and_then(RadioBand::parse)
            .and_then(|band| ctx.gw.max_channel_width(band));
        Ok(max_width.is_some_and(|w| w < 160))
    })?;
    prune_incompatible(ctx, &mut prepared)?;
    finish(ctx, template, prepared)
}

/// `tx_power` cells hold `[low, high]` pairs that sweep end-inclusive.
pub fn gen_set_radio_tx_power(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut batch = Batch::from_template(template);
    if let Some(idx) = batch.args_mapping.iter().position(|k| k == "tx_power") {
        for draft in &mut batch.inputs {
            let Draft::Cells(cells) = draft else {
                continue;
            };
            if let Some(cell) = cells.get_mut(idx)
                && let Cell::Value(Value::Array(pair)) = cell
            {
                let bounds = match pair.as_slice() {
                    [lo, hi] => lo.as_i64().zip(hi.as_i64()),
                    _ => None,
                };
                match bounds {
                    Some((lo, hi)) if lo <= hi => *cell = Cell::Range(lo, hi),
                    _ => {
                        return Err(FutgenError::Template(format!(
                            "{}: tx_power must be [low, high], got {}",
                            template.name,
                            Value::Array(pair.clone())
                        )));
                    }
                }
            }
        }
    }
    permuted(ctx, template, batch)
}
