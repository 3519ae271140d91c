//! Regulatory rule table and channel validation.
//!
//! The table is a JSON document keyed by regulatory domain, then band, then
//! bandwidth mode, holding the list of legal channels:
//!
//! ```json
//! { "US": { "24g": { "HT20": [1, 6, 11] } },
//!   "UNII_4": { "HT20": [169, 173, 177, 181] } }
//! ```
//!
//! The optional `UNII_4` entry lists the channels a 5 GHz radio must support
//! to be considered UNII-4 capable.
//!
//! Band lookup uses the exact band key when the domain table has it and
//! falls back to the band family otherwise, so a table that only knows `5g`
//! still validates `5gl` and `5gu` rows.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::wifi::{HtMode, RadioBand};

#[derive(Debug, Clone, PartialEq)]
pub enum RegulatoryError {
    /// Bandwidth mode or band outside the fixed enumeration.
    InvalidArgument(String),
    /// Rule table missing, unloadable, or lacking the requested domain.
    LookupFailure(String),
}

impl fmt::Display for RegulatoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegulatoryError::InvalidArgument(e) => write!(f, "Invalid regulatory argument: {e}"),
            RegulatoryError::LookupFailure(e) => write!(f, "Regulatory lookup failed: {e}"),
        }
    }
}

impl std::error::Error for RegulatoryError {}

pub type Result<T> = std::result::Result<T, RegulatoryError>;

/// Channels per bandwidth mode.
pub type ChannelTable = BTreeMap<String, Vec<u32>>;

/// Immutable `{domain: {band: {bandwidth_mode: [channels]}}}` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegulatoryRule {
    #[serde(rename = "UNII_4", default)]
    unii_4: Option<ChannelTable>,
    #[serde(flatten)]
    domains: BTreeMap<String, BTreeMap<String, ChannelTable>>,
}

impl RegulatoryRule {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| RegulatoryError::LookupFailure(format!("invalid regulatory table: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RegulatoryError::LookupFailure(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }
}

/// Validates (channel, bandwidth, band, domain) tuples against a shared rule table.
#[derive(Debug, Clone)]
pub struct RegulatoryValidator {
    rule: Arc<RegulatoryRule>,
}

impl RegulatoryValidator {
    pub fn new(rule: Arc<RegulatoryRule>) -> Self {
        RegulatoryValidator { rule }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(RegulatoryRule::load(path)?)))
    }

    /// Validate string arguments as they appear in templates.
    ///
    /// Returns `Ok(false)` for a well-formed but disallowed combination.
    pub fn validate(&self, channel: u32, ht_mode: &str, band: &str, domain: &str) -> Result<bool> {
        let ht = HtMode::parse(ht_mode)
            .ok_or_else(|| RegulatoryError::InvalidArgument(format!("bandwidth mode {ht_mode}")))?;
        let band = RadioBand::parse(band)
            .ok_or_else(|| RegulatoryError::InvalidArgument(format!("radio band {band}")))?;
        self.validate_typed(channel, ht, band, domain)
    }

    pub fn validate_typed(
        &self,
        channel: u32,
        ht_mode: HtMode,
        band: RadioBand,
        domain: &str,
    ) -> Result<bool> {
        let table = self.domain_table(domain)?;
        let allowed = table
            .get(band.as_str())
            .or_else(|| table.get(band.family().as_str()))
            .and_then(|modes| modes.get(ht_mode.as_str()));
        let valid = allowed.is_some_and(|channels| channels.contains(&channel));
        if !valid {
            log::debug!(
                "disallowed: channel {channel}, {ht_mode}, band {band}, domain {}",
                domain.to_uppercase()
            );
        }
        Ok(valid)
    }

    /// Fail unless the table holds the given domain.
    pub fn check_domain(&self, domain: &str) -> Result<()> {
        self.domain_table(domain).map(|_| ())
    }

    /// Channels a radio must support to be UNII-4 capable, if the table says.
    pub fn unii_4_channels(&self) -> Option<&[u32]> {
        self.rule
            .unii_4
            .as_ref()
            .and_then(|t| t.get(HtMode::Ht20.as_str()))
            .map(Vec::as_slice)
    }

    fn domain_table(&self, domain: &str) -> Result<&BTreeMap<String, ChannelTable>> {
        if self.rule.domains.is_empty() {
            return Err(RegulatoryError::LookupFailure(
                "regulatory table is empty".into(),
            ));
        }
        self.rule
            .domains
            .get(&domain.to_uppercase())
            .ok_or_else(|| {
                RegulatoryError::LookupFailure(format!("no rules for regulatory domain {domain}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "US": {
            "24g": {"HT20": [1, 6, 11], "HT40": [6]},
            "5g": {"HT20": [36, 44, 149, 165], "HT40": [36, 44, 149], "HT160": [36]},
            "6g": {"HT40": [5, 21, 149], "HT20": [5, 21, 149, 165]}
        },
        "EU": {
            "24g": {"HT20": [1, 6, 11, 13]},
            "5gl": {"HT20": [36]}
        },
        "UNII_4": {"HT20": [169, 173, 177, 181]}
    }"#;

    fn validator() -> RegulatoryValidator {
        RegulatoryValidator::new(Arc::new(RegulatoryRule::from_json(TABLE).unwrap()))
    }

    #[test]
    fn allowed_combination() {
        assert_eq!(validator().validate(6, "HT40", "24g", "US"), Ok(true));
    }

    #[test]
    fn disallowed_channel_is_false_not_error() {
        // 165 is legal at HT20 but missing from the 6g HT40 list.
        assert_eq!(validator().validate(165, "HT40", "6g", "US"), Ok(false));
    }

    #[test]
    fn missing_bandwidth_mode_in_table_is_false() {
        assert_eq!(validator().validate(6, "HT80", "24g", "US"), Ok(false));
    }

    #[test]
    fn invalid_bandwidth_mode_is_invalid_argument() {
        assert!(matches!(
            validator().validate(6, "HT42", "24g", "US"),
            Err(RegulatoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn invalid_band_is_invalid_argument() {
        assert!(matches!(
            validator().validate(6, "HT20", "60g", "US"),
            Err(RegulatoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_domain_is_lookup_failure() {
        assert!(matches!(
            validator().validate(6, "HT20", "24g", "JP"),
            Err(RegulatoryError::LookupFailure(_))
        ));
    }

    #[test]
    fn empty_table_is_lookup_failure() {
        let v = RegulatoryValidator::new(Arc::new(RegulatoryRule::default()));
        assert!(matches!(
            v.validate(6, "HT20", "24g", "US"),
            Err(RegulatoryError::LookupFailure(_))
        ));
        assert!(v.check_domain("US").is_err());
    }

    #[test]
    fn domain_lookup_is_case_insensitive() {
        assert_eq!(validator().validate(13, "HT20", "24g", "eu"), Ok(true));
    }

    // ── Band canonicalization ──

    #[test]
    fn sub_band_falls_back_to_5g_family() {
        let v = validator();
        assert_eq!(v.validate(44, "HT20", "5gl", "US"), Ok(true));
        assert_eq!(v.validate(149, "HT40", "5gu", "US"), Ok(true));
    }

    #[test]
    fn exact_sub_band_key_wins_over_family() {
        let v = validator();
        assert_eq!(v.validate(36, "HT20", "5gl", "EU"), Ok(true));
        // EU has no 5g table, and 5gu has no exact key either.
        assert_eq!(v.validate(36, "HT20", "5gu", "EU"), Ok(false));
    }

    // ── UNII-4 ──

    #[test]
    fn unii_4_channels_from_table() {
        assert_eq!(validator().unii_4_channels(), Some(&[169, 173, 177, 181][..]));
    }

    #[test]
    fn unii_4_entry_is_not_a_domain() {
        let v = validator();
        let domains: Vec<&str> = v.rule.domains().collect();
        assert_eq!(domains, vec!["EU", "US"]);
    }

    #[test]
    fn load_missing_file_is_lookup_failure() {
        let err = RegulatoryRule::load(Path::new("/nonexistent/regulatory.json")).unwrap_err();
        assert!(matches!(err, RegulatoryError::LookupFailure(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regulatory.json");
        std::fs::write(&path, TABLE).unwrap();
        let v = RegulatoryValidator::from_path(&path).unwrap();
        assert_eq!(v.validate(1, "HT20", "24g", "US"), Ok(true));
    }
}
