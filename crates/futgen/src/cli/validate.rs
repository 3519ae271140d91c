//! `validate` subcommand: check one channel against the rule table.

use std::path::Path;

use super::{CapabilityStore, Config, RegulatoryValidator, Result, ValidateOutput, kv, kv_width, to_pretty};

pub(super) struct Query {
    pub band: String,
    pub channel: u32,
    pub ht_mode: String,
    pub domain: Option<String>,
    pub dut: Option<String>,
}

/// Explicit domain, else the DUT's declared domain, else the default.
fn resolve_domain(config: &Config, query: &Query) -> Result<String> {
    if let Some(domain) = &query.domain {
        return Ok(domain.to_uppercase());
    }
    let domain = match &query.dut {
        Some(model) => {
            let caps = CapabilityStore::load(Path::new(&config.capabilities_dir), model)?;
            caps.regulatory_domain().to_uppercase()
        }
        None => futgen_lib::capabilities::DEFAULT_REGULATORY_DOMAIN.to_string(),
    };
    Ok(domain)
}

pub(super) fn cmd_validate(config: &Config, query: &Query, json: bool) -> Result<()> {
    let domain = resolve_domain(config, query)?;
    let validator = RegulatoryValidator::from_path(Path::new(&config.regulatory_file))?;
    let valid = validator.validate(query.channel, &query.ht_mode, &query.band, &domain)?;

    let out = ValidateOutput {
        band: query.band.clone(),
        channel: query.channel,
        ht_mode: query.ht_mode.clone(),
        domain,
        valid,
    };
    if json {
        println!("{}", to_pretty(&out)?);
        return Ok(());
    }

    let w = kv_width(&["Channel:", "Band:", "Bandwidth:", "Domain:", "Result:"], &[]);
    kv("Channel:", out.channel, w);
    kv("Band:", &out.band, w);
    kv("Bandwidth:", &out.ht_mode, w);
    kv("Domain:", &out.domain, w);
    kv("Result:", if valid { "allowed" } else { "not allowed" }, w);
    Ok(())
}
