//! Stats manager test cases.
//!
//! SM templates may carry a `FutGen|sm_radio_type` placeholder in
//! `args_mapping`. The placeholder is renamed to `sm_radio_type` and every
//! row gets the stats-manager label of its radio band (`24g` → `2.4G`) at
//! that position.

use serde_json::Value;

use super::default::{Batch, Prepared, Row, finish};
use super::{GenContext, ParamSet};
use crate::error::Result;
use crate::template::TestTemplate;
use crate::wifi::RadioBand;

/// Placeholder column in SM templates.
pub const SM_RADIO_TYPE_TOKEN: &str = "FutGen|sm_radio_type";

const SM_RADIO_TYPE_KEY: &str = "sm_radio_type";

pub fn gen_sm(ctx: &GenContext<'_>, template: &TestTemplate) -> Result<Vec<ParamSet>> {
    let mut prepared = Batch::from_template(template).prepare(ctx, template.expand_permutations)?;
    insert_radio_type(&mut prepared);
    finish(ctx, template, prepared)
}

fn insert_radio_type(prepared: &mut Prepared) {
    let Some(token_idx) = prepared
        .args_mapping
        .iter()
        .position(|k| k == SM_RADIO_TYPE_TOKEN)
    else {
        return;
    };
    prepared.args_mapping[token_idx] = SM_RADIO_TYPE_KEY.to_string();
    // Rows do not have the placeholder cell yet.
    let band_idx = prepared
        .args_mapping
        .iter()
        .position(|k| k == "radio_band")
        .map(|i| if i > token_idx { i - 1 } else { i });

    for row in prepared.rows.iter_mut().chain(prepared.additional.iter_mut()) {
        match row {
            Row::Positional(cells) => {
                let label = radio_type(band_idx.and_then(|i| cells.get(i)));
                if token_idx <= cells.len() {
                    cells.insert(token_idx, label);
                }
            }
            Row::Keyed(map) => {
                let label = map.get("radio_band").map(|b| radio_type(Some(b)));
                if let Some(label) = label {
                    map.insert(SM_RADIO_TYPE_KEY.to_string(), label);
                }
            }
        }
    }
}

/// Known bands use their label, anything else is upper-cased.
fn radio_type(band: Option<&Value>) -> Value {
    match band.and_then(Value::as_str) {
        Some(s) => Value::String(
            RadioBand::parse(s).map_or_else(|| s.to_uppercase(), |b| b.radio_type_label().to_string()),
        ),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::generator::GenType;
    use crate::generator::testutil::{dut, leaf, validator};

    fn gen_rows(template: Value) -> Vec<ParamSet> {
        let (v, gw, leaf) = (validator(), dut(), leaf());
        let ctx = GenContext::new(&gw, &leaf, &v, GenType::Optimized).unwrap();
        gen_sm(&ctx, &TestTemplate::parse("sm_survey_report", &template).unwrap()).unwrap()
    }

    #[test]
    fn inserts_radio_type_label_at_placeholder() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "FutGen|sm_radio_type", "radio_band", "report_type"],
            "inputs": [[6, "24g", "raw"], [44, "5gl", "raw"]]
        }));
        let labels: Vec<_> = out.iter().map(|p| p["sm_radio_type"].clone()).collect();
        assert_eq!(labels, vec![json!("2.4G"), json!("5GL")]);
        assert_eq!(out[0]["report_type"], json!("raw"));
        assert!(out.iter().all(|p| !p.contains_key(SM_RADIO_TYPE_TOKEN)));
    }

    #[test]
    fn band_before_placeholder() {
        let out = gen_rows(json!({
            "args_mapping": ["radio_band", "FutGen|sm_radio_type"],
            "inputs": [["5gu"]]
        }));
        assert_eq!(out[0]["sm_radio_type"], json!("5GU"));
    }

    #[test]
    fn without_placeholder_behaves_like_default() {
        let out = gen_rows(json!({
            "args_mapping": ["channel", "radio_band"],
            "inputs": [[6, "24g"]]
        }));
        assert_eq!(out.len(), 1);
        assert!(!out[0].contains_key("sm_radio_type"));
    }

    #[test]
    fn unknown_band_label_is_uppercased() {
        assert_eq!(radio_type(Some(&json!("60g"))), json!("60G"));
        assert_eq!(radio_type(None), Value::Null);
    }
}
