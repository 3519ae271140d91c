//! Network manager test cases.
//!
//! NM templates name interfaces through role tokens. The token pass turns
//! every token into concrete rows before the default pipeline runs:
//!
//! - a bare token becomes one keyed row per interface,
//! - a keyed row carrying a token is copied once per interface,
//! - a per-band token inside a positional row is replaced by the interface
//!   on the row's band, followed by its type.
//!
//! Rows whose role the DUT does not have are dropped.

use serde_json::{Map, Value};

use super::default::{Batch, Draft, run};
use super::{GenContext, ParamSet};
use crate::error::{FutgenError, Result};
use crate::roles::{Interface, Projection, RoleResolver, RoleToken};
use crate::template::{Cell, TestTemplate};
use crate::wifi::RadioBand;

pub fn gen_nm(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut batch = Batch::from_template(template);
    resolve_tokens(&ctx.roles(), &mut batch)?;
    run(ctx, template, batch)
}

/// Resolve role tokens in both `inputs` and `additional_inputs`.
pub(crate) fn resolve_tokens(resolver: &RoleResolver<'_>, batch: &mut Batch) -> Result<()> {
    let band_idx = batch.args_mapping.iter().position(|k| k == "radio_band");
    let inputs = std::mem::take(&mut batch.inputs);
    batch.inputs = resolve_drafts(resolver, &batch.name, band_idx, inputs)?;
    let additional = std::mem::take(&mut batch.additional);
    batch.additional = resolve_drafts(resolver, &batch.name, band_idx, additional)?;
    Ok(())
}

fn resolve_drafts(
    resolver: &RoleResolver<'_>,
    name: &str,
    band_idx: Option<usize>,
    drafts: Vec<Draft>,
) -> Result<Vec<Draft>> {
    let mut out = Vec::with_capacity(drafts.len());
    for draft in drafts {
        match draft {
            Draft::Token(token) => {
                out.extend(expand_keyed(resolver, name, &token, &Map::new()));
            }
            Draft::Keyed {
                values,
                token: Some(token),
            } => {
                out.extend(expand_keyed(resolver, name, &token, &values));
            }
            Draft::Cells(cells) => {
                if let Some(resolved) = resolve_cells(resolver, name, band_idx, cells)? {
                    out.push(resolved);
                }
            }
            keyed => out.push(keyed),
        }
    }
    Ok(out)
}

/// One keyed row per interface the token resolves to. Row values win over
/// the interface keys.
fn expand_keyed(
    resolver: &RoleResolver<'_>,
    name: &str,
    token: &RoleToken,
    values: &Map<String, Value>,
) -> Vec<Draft> {
    let Some(interfaces) = resolver.resolve(token, None) else {
        log::debug!("{name}: {token} absent on DUT, dropping input");
        return Vec::new();
    };
    interfaces
        .iter()
        .map(|iface| {
            let mut row = interface_keys(iface, token.projection);
            row.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            Draft::keyed(row)
        })
        .collect()
}

fn interface_keys(iface: &Interface, projection: Projection) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("if_name".into(), Value::String(iface.name.clone()));
    if projection == Projection::NameType {
        row.insert("if_type".into(), Value::String(iface.if_type.as_str().into()));
    }
    row
}

/// Replace a per-band token with the interface name and insert `vif` after it.
///
/// `band_idx` indexes `args_mapping`, which already counts the inserted
/// type column.
fn resolve_cells(
    resolver: &RoleResolver<'_>,
    name: &str,
    band_idx: Option<usize>,
    mut cells: Vec<Cell>,
) -> Result<Option<Draft>> {
    let Some((pos, token)) = cells.iter().enumerate().find_map(|(i, c)| match c {
        Cell::Token(t) => Some((i, *t)),
        _ => None,
    }) else {
        return Ok(Some(Draft::Cells(cells)));
    };
    if !token.is_per_band() {
        return Err(FutgenError::Template(format!(
            "{name}: {token} cannot be used inside a positional input"
        )));
    }
    let Some(band_idx) = band_idx else {
        return Err(FutgenError::Template(format!(
            "{name}: {token} needs a radio_band column"
        )));
    };
    let raw_idx = if band_idx > pos { band_idx - 1 } else { band_idx };
    let band = match cells.get(raw_idx) {
        Some(Cell::Value(Value::String(s))) => RadioBand::parse(s),
        _ => None,
    };
    let Some(band) = band else {
        log::debug!("{name}: no usable radio band for {token}, dropping input");
        return Ok(None);
    };
    let Some(iface) = resolver
        .resolve(&token, Some(band))
        .and_then(|ifaces| ifaces.into_iter().next())
    else {
        log::debug!("{name}: {token} has no interface on {band}, dropping input");
        return Ok(None);
    };
    cells[pos] = Cell::Value(Value::String(iface.name));
    cells.insert(pos + 1, Cell::Value(Value::String(iface.if_type.as_str().into())));
    Ok(Some(Draft::Cells(cells)))
}
